//! Nearest-timestamp join of two series sampled on different cadences.

use chrono::{Duration, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::types::{to_micros, AlignedPair, TimeSeries};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alignment {
    pub pairs: Vec<AlignedPair>,
    /// Anchor timestamps with no secondary reading inside the tolerance.
    pub unmatched_anchors: usize,
    /// Anchor readings skipped because an earlier reading had the same timestamp.
    pub duplicate_anchors: usize,
}

impl Alignment {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn anchor_values(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.anchor).collect()
    }

    pub fn secondary_values(&self) -> Vec<f64> {
        self.pairs.iter().map(|p| p.secondary).collect()
    }

    /// Frame with `timestamp`, `<anchor_name>` and `<secondary_name>` columns.
    pub fn to_dataframe(&self, anchor_name: &str, secondary_name: &str) -> PolarsResult<DataFrame> {
        let timestamps: Vec<i64> = self.pairs.iter().map(|p| to_micros(p.timestamp)).collect();
        let ts_series = Series::new("timestamp".into(), timestamps)
            .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

        DataFrame::new(vec![
            ts_series.into(),
            Series::new(anchor_name.into(), self.anchor_values()).into(),
            Series::new(secondary_name.into(), self.secondary_values()).into(),
        ])
    }
}

/// Joins every anchor reading to the secondary reading nearest in time.
///
/// A match is kept only when `|anchor - secondary| <= tolerance`. When two
/// secondary timestamps are equally close the earlier one wins; among
/// secondary readings sharing a timestamp the first is used. Both series are
/// already sorted, so the join is a single forward walk over each.
pub fn align(anchor: &TimeSeries, secondary: &TimeSeries, tolerance: Duration) -> Alignment {
    // First reading of every distinct secondary timestamp, ascending.
    let mut candidates: Vec<(NaiveDateTime, f64)> = Vec::with_capacity(secondary.len());
    for reading in secondary.readings() {
        if candidates.last().map(|(ts, _)| *ts) != Some(reading.timestamp) {
            candidates.push((reading.timestamp, reading.value));
        }
    }

    let mut pairs = Vec::with_capacity(anchor.len());
    let mut unmatched_anchors = 0;
    let mut duplicate_anchors = 0;
    let mut previous_anchor: Option<NaiveDateTime> = None;
    // Index of the first candidate at or after the current anchor.
    let mut next = 0;

    for reading in anchor.readings() {
        let ts = reading.timestamp;
        if previous_anchor == Some(ts) {
            duplicate_anchors += 1;
            continue;
        }
        previous_anchor = Some(ts);

        while next < candidates.len() && candidates[next].0 < ts {
            next += 1;
        }

        let before = next.checked_sub(1).map(|idx| candidates[idx]);
        let after = candidates.get(next).copied();

        let nearest = match (before, after) {
            (Some(b), Some(a)) => {
                if ts - b.0 <= a.0 - ts {
                    Some(b)
                } else {
                    Some(a)
                }
            }
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (None, None) => None,
        };

        match nearest {
            Some((matched_ts, value)) if (ts - matched_ts).abs() <= tolerance => {
                pairs.push(AlignedPair {
                    timestamp: ts,
                    anchor: reading.value,
                    secondary: value,
                    secondary_timestamp: matched_ts,
                });
            }
            _ => unmatched_anchors += 1,
        }
    }

    debug!(
        anchor = anchor.name(),
        secondary = secondary.name(),
        tolerance_seconds = tolerance.num_seconds(),
        matched = pairs.len(),
        unmatched_anchors,
        duplicate_anchors,
        "aligned series"
    );

    Alignment {
        pairs,
        unmatched_anchors,
        duplicate_anchors,
    }
}
