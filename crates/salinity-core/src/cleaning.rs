//! Turns raw text tables into typed series.
//!
//! Rows are dropped, never rejected: a row whose required value fails numeric
//! coercion counts as missing, a row with a usable value but an unparseable
//! timestamp counts as a malformed timestamp. Both counts are taken before
//! anything is dropped.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::StringChunked;
use salinity_parser::{ColumnRole, RawTable};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{AnalysisError, Result};
use crate::types::{PairedObservation, Reading, TimeSeries};

/// Numeric coercion of one cell. Empty cells, non-numeric tokens and
/// non-finite numbers (`NaN`, `inf`) all come back as missing.
pub fn coerce_f64(cell: Option<&str>) -> Option<f64> {
    cell.map(str::trim)
        .and_then(|text| text.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

/// Parses a timestamp with the configured pattern, also accepting trailing
/// fractional seconds and date-only values for date-only patterns.
pub fn parse_timestamp(cell: Option<&str>, format: &str) -> Option<NaiveDateTime> {
    let text = cell?.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
        return Some(dt);
    }
    if !format.contains("%.f") {
        let with_fraction = format!("{format}%.f");
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, &with_fraction) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Outcome of validating one row against a [`RequiredFields`] rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RowCheck {
    Valid {
        timestamp: NaiveDateTime,
        values: Vec<f64>,
    },
    MissingValue(ColumnRole),
    MalformedTimestamp,
}

/// Declarative "every one of these columns must be numeric" rule, applied the
/// same way by every stage that reads a raw table. The timestamp column is
/// always required in addition to the listed roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields {
    roles: Vec<ColumnRole>,
}

impl RequiredFields {
    pub fn new(roles: impl IntoIterator<Item = ColumnRole>) -> Self {
        Self {
            roles: roles
                .into_iter()
                .filter(|role| *role != ColumnRole::Timestamp)
                .collect(),
        }
    }

    pub fn roles(&self) -> &[ColumnRole] {
        &self.roles
    }

    /// Resolves the rule's columns in `table`.
    pub fn bind<'t>(&self, table: &'t RawTable) -> Result<BoundFields<'t>> {
        let timestamp = text_column(table, ColumnRole::Timestamp)?;
        let values = self
            .roles
            .iter()
            .map(|role| text_column(table, *role).map(|column| (*role, column)))
            .collect::<Result<Vec<_>>>()?;

        Ok(BoundFields {
            timestamp,
            timestamp_format: &table.schema.timestamp_format,
            values,
        })
    }
}

/// A [`RequiredFields`] rule resolved against one table.
pub struct BoundFields<'t> {
    timestamp: &'t StringChunked,
    timestamp_format: &'t str,
    values: Vec<(ColumnRole, &'t StringChunked)>,
}

impl BoundFields<'_> {
    pub fn check(&self, idx: usize) -> RowCheck {
        let mut values = Vec::with_capacity(self.values.len());
        for (role, column) in &self.values {
            match coerce_f64(column.get(idx)) {
                Some(value) => values.push(value),
                None => return RowCheck::MissingValue(*role),
            }
        }

        match parse_timestamp(self.timestamp.get(idx), self.timestamp_format) {
            Some(timestamp) => RowCheck::Valid { timestamp, values },
            None => RowCheck::MalformedTimestamp,
        }
    }
}

fn text_column(table: &RawTable, role: ColumnRole) -> Result<&StringChunked> {
    if !table.has(role) {
        return Err(AnalysisError::MissingColumn {
            source_name: table.source.clone(),
            column: role.canonical_name().to_string(),
        });
    }
    Ok(table.text_column(role)?)
}

/// A single-quantity series plus the bookkeeping of what cleaning dropped.
///
/// `series.len() + missing_count + malformed_timestamps == raw_rows`.
#[derive(Debug, Clone, Serialize)]
pub struct CleanedSeries {
    pub series: TimeSeries,
    pub raw_rows: usize,
    pub missing_count: usize,
    pub malformed_timestamps: usize,
}

impl CleanedSeries {
    pub fn dropped_rows(&self) -> usize {
        self.missing_count + self.malformed_timestamps
    }
}

/// Extracts one numeric column of `table` as a time series.
pub fn clean_series(
    table: &RawTable,
    role: ColumnRole,
    name: impl Into<String>,
) -> Result<CleanedSeries> {
    let fields = RequiredFields::new([role]).bind(table)?;
    let raw_rows = table.height();

    let mut readings = Vec::with_capacity(raw_rows);
    let mut missing_count = 0;
    let mut malformed_timestamps = 0;

    for idx in 0..raw_rows {
        match fields.check(idx) {
            RowCheck::Valid { timestamp, values } => {
                readings.push(Reading::new(timestamp, values[0]));
            }
            RowCheck::MissingValue(_) => missing_count += 1,
            RowCheck::MalformedTimestamp => malformed_timestamps += 1,
        }
    }

    let cleaned = CleanedSeries {
        series: TimeSeries::new(name, readings),
        raw_rows,
        missing_count,
        malformed_timestamps,
    };
    report_drops(&table.source, role, &cleaned);
    Ok(cleaned)
}

/// Conductivity/temperature rows ready for conversion.
#[derive(Debug, Clone)]
pub struct CleanedObservations {
    pub observations: Vec<PairedObservation>,
    pub raw_rows: usize,
    pub missing_count: usize,
    pub malformed_timestamps: usize,
}

/// Extracts paired conductivity/temperature observations. A pressure column,
/// when mapped, is read per row; blank or invalid pressure cells fall back to
/// `default_pressure_dbar` rather than dropping the row.
pub fn clean_observations(
    table: &RawTable,
    default_pressure_dbar: f64,
) -> Result<CleanedObservations> {
    let fields =
        RequiredFields::new([ColumnRole::Conductivity, ColumnRole::Temperature]).bind(table)?;
    let pressure = if table.has(ColumnRole::Pressure) {
        Some(table.text_column(ColumnRole::Pressure)?)
    } else {
        None
    };

    let raw_rows = table.height();
    let mut observations = Vec::with_capacity(raw_rows);
    let mut missing_count = 0;
    let mut malformed_timestamps = 0;

    for idx in 0..raw_rows {
        match fields.check(idx) {
            RowCheck::Valid { timestamp, values } => {
                let pressure_dbar = pressure
                    .and_then(|column| coerce_f64(column.get(idx)))
                    .unwrap_or(default_pressure_dbar);
                observations.push(PairedObservation {
                    timestamp,
                    conductivity_us_cm: values[0],
                    temperature_c: values[1],
                    pressure_dbar,
                });
            }
            RowCheck::MissingValue(_) => missing_count += 1,
            RowCheck::MalformedTimestamp => malformed_timestamps += 1,
        }
    }

    observations.sort_by_key(|obs| obs.timestamp);

    debug!(
        source = %table.source,
        raw_rows,
        kept = observations.len(),
        missing_count,
        malformed_timestamps,
        "cleaned paired observations"
    );
    if missing_count + malformed_timestamps > 0 {
        warn!(
            source = %table.source,
            missing_count,
            malformed_timestamps,
            "dropped observation rows"
        );
    }

    Ok(CleanedObservations {
        observations,
        raw_rows,
        missing_count,
        malformed_timestamps,
    })
}

fn report_drops(source: &str, role: ColumnRole, cleaned: &CleanedSeries) {
    debug!(
        source,
        column = %role,
        raw_rows = cleaned.raw_rows,
        kept = cleaned.series.len(),
        "cleaned series"
    );
    if cleaned.dropped_rows() > 0 {
        warn!(
            source,
            column = %role,
            missing_count = cleaned.missing_count,
            malformed_timestamps = cleaned.malformed_timestamps,
            "dropped rows"
        );
    }
}
