use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The physical meaning of a column, independent of the header text a given
/// data collector happens to use for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Timestamp,
    Conductivity,
    Temperature,
    Pressure,
    Salinity,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 5] = [
        ColumnRole::Timestamp,
        ColumnRole::Conductivity,
        ColumnRole::Temperature,
        ColumnRole::Pressure,
        ColumnRole::Salinity,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            ColumnRole::Timestamp => "timestamp",
            ColumnRole::Conductivity => "conductivity_us_cm",
            ColumnRole::Temperature => "temperature_c",
            ColumnRole::Pressure => "pressure_dbar",
            ColumnRole::Salinity => "salinity_psu",
        }
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Column-name mapping and text conventions for one kind of delimited export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSchema {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,
    pub timestamp: String,
    #[serde(default)]
    pub conductivity: Option<String>,
    #[serde(default)]
    pub temperature: Option<String>,
    #[serde(default)]
    pub pressure: Option<String>,
    #[serde(default)]
    pub salinity: Option<String>,
}

fn default_delimiter() -> char {
    ','
}

fn default_timestamp_format() -> String {
    DEFAULT_TIMESTAMP_FORMAT.to_string()
}

impl SourceSchema {
    /// Semicolon-separated export written by the CTD loggers.
    pub fn logger_export() -> Self {
        Self {
            delimiter: ';',
            timestamp_format: default_timestamp_format(),
            timestamp: "Timestamp".to_string(),
            conductivity: Some("Electrical Conductivity".to_string()),
            temperature: Some("Temperature".to_string()),
            pressure: None,
            salinity: None,
        }
    }

    /// Comma-separated spreadsheet export that already carries practical salinity.
    pub fn spreadsheet_export() -> Self {
        Self {
            delimiter: ',',
            timestamp_format: default_timestamp_format(),
            timestamp: "DateTime".to_string(),
            conductivity: None,
            temperature: None,
            pressure: None,
            salinity: Some("Salinity (PSU)".to_string()),
        }
    }

    pub fn header_for(&self, role: ColumnRole) -> Option<&str> {
        match role {
            ColumnRole::Timestamp => Some(self.timestamp.as_str()),
            ColumnRole::Conductivity => self.conductivity.as_deref(),
            ColumnRole::Temperature => self.temperature.as_deref(),
            ColumnRole::Pressure => self.pressure.as_deref(),
            ColumnRole::Salinity => self.salinity.as_deref(),
        }
    }

    pub fn mapped_roles(&self) -> Vec<(ColumnRole, &str)> {
        ColumnRole::ALL
            .iter()
            .filter_map(|role| self.header_for(*role).map(|header| (*role, header)))
            .collect()
    }

    pub fn carries(&self, role: ColumnRole) -> bool {
        self.header_for(role).is_some()
    }

    pub fn delimiter_byte(&self) -> Result<u8, String> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(format!(
                "delimiter '{}' must be a single ASCII character",
                self.delimiter
            ))
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.delimiter_byte()?;
        if self.timestamp.trim().is_empty() {
            return Err("timestamp column name must not be empty".to_string());
        }
        if self.timestamp_format.trim().is_empty() {
            return Err("timestamp format must not be empty".to_string());
        }
        let has_salinity = self.carries(ColumnRole::Salinity);
        let has_pair =
            self.carries(ColumnRole::Conductivity) && self.carries(ColumnRole::Temperature);
        if !has_salinity && !has_pair {
            return Err(
                "schema must map either a salinity column or both conductivity and temperature"
                    .to_string(),
            );
        }
        Ok(())
    }
}

/// A delimited table as read from disk: one text column per mapped role,
/// renamed to its canonical name. Cells are untouched apart from trimming;
/// empty cells are null. Numeric coercion happens downstream.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub source: String,
    pub schema: SourceSchema,
    pub df: DataFrame,
}

impl RawTable {
    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn has(&self, role: ColumnRole) -> bool {
        self.df.column(role.canonical_name()).is_ok()
    }

    pub fn text_column(&self, role: ColumnRole) -> PolarsResult<&StringChunked> {
        self.df.column(role.canonical_name())?.str()
    }
}
