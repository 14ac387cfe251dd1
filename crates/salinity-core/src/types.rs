use chrono::NaiveDateTime;
use polars::prelude::*;
use serde::Serialize;

/// One timestamped value of a single physical quantity at one location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reading {
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// A named series of readings, always held in ascending timestamp order.
///
/// Construction performs a stable sort, so rows sharing a timestamp keep
/// their original relative order. Duplicate timestamps are kept as separate
/// readings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    name: String,
    readings: Vec<Reading>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, mut readings: Vec<Reading>) -> Self {
        readings.sort_by_key(|reading| reading.timestamp);
        Self {
            name: name.into(),
            readings,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.readings.iter().map(|r| r.value).collect()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.readings.iter().map(|r| r.timestamp)
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.readings.first().map(|r| r.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.readings.last().map(|r| r.timestamp)
    }

    /// Frame with a `timestamp` datetime column and one value column named
    /// after the series.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let timestamps: Vec<i64> = self.timestamps().map(to_micros).collect();
        let ts_series = Series::new("timestamp".into(), timestamps)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

        DataFrame::new(vec![
            ts_series.into(),
            Series::new(self.name.as_str().into(), self.values()).into(),
        ])
    }
}

/// Conductivity, temperature and pressure sampled at one instant: the input
/// to salinity conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairedObservation {
    pub timestamp: NaiveDateTime,
    pub conductivity_us_cm: f64,
    pub temperature_c: f64,
    pub pressure_dbar: f64,
}

/// An anchor reading joined with its nearest secondary reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlignedPair {
    pub timestamp: NaiveDateTime,
    pub anchor: f64,
    pub secondary: f64,
    pub secondary_timestamp: NaiveDateTime,
}

pub(crate) fn to_micros(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_micros()
}
