#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime};
use salinity_core::types::{Reading, TimeSeries};
use salinity_parser::{parse_table, RawTable, SourceSchema};

pub fn fixture(path: &str) -> String {
    let full_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../salinity-parser/tests/data")
        .join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

pub fn logger_table(path: &str) -> RawTable {
    parse_table(&fixture(path), "logger", &SourceSchema::logger_export())
        .expect("logger fixture should parse")
}

pub fn spreadsheet_table(path: &str) -> RawTable {
    parse_table(&fixture(path), "spreadsheet", &SourceSchema::spreadsheet_export())
        .expect("spreadsheet fixture should parse")
}

/// 2025-06-01 at `hh:mm`.
pub fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn series(name: &str, points: &[(u32, f64)]) -> TimeSeries {
    TimeSeries::new(
        name,
        points
            .iter()
            .map(|(minute, value)| Reading::new(at(0, *minute), *value))
            .collect(),
    )
}
