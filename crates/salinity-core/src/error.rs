// crates/salinity-core/src/error.rs

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which input of a two-sample comparison a failure refers to. Two-station
/// runs name their stations instead of the before/after slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Before,
    After,
    Downstream,
    Upstream,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Before => f.write_str("before"),
            Side::After => f.write_str("after"),
            Side::Downstream => f.write_str("downstream"),
            Side::Upstream => f.write_str("upstream"),
        }
    }
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("insufficient data on the {side} side: {found} usable values, need at least {required}")]
    InsufficientData {
        side: Side,
        found: usize,
        required: usize,
    },

    #[error("percent change is undefined: the before median is zero")]
    DivisionUndefined,

    #[error("source '{source_name}' has no {column} column")]
    MissingColumn { source_name: String, column: String },

    #[error("source '{source_name}' carries neither salinity nor a conductivity/temperature pair")]
    UnsupportedSource { source_name: String },

    #[error("input lengths differ: {0}")]
    LengthMismatch(String),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Parsing failed: {0}")]
    Parser(#[from] salinity_parser::ParserError),

    #[error("Statistics error: {0}")]
    Statistics(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
