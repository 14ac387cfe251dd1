//! Missing-value and outlier accounting.
//!
//! An outlier is a value whose distance from the sample median exceeds
//! `outlier_multiplier` spreads. The default spread is the sample standard
//! deviation, which pairs a robust centre with a non-robust spread: one
//! extreme value inflates the spread enough to hide itself. The scaled MAD is
//! available as a robust alternative but is not the default, so that reported
//! counts stay comparable with earlier reports.

use serde::{Deserialize, Serialize};

use crate::cleaning::CleanedSeries;
use crate::stats::{median, median_absolute_deviation, sample_std_dev, MAD_NORMAL_SCALE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadEstimator {
    SampleStdDev,
    ScaledMad,
}

impl SpreadEstimator {
    pub fn spread(&self, values: &[f64]) -> Option<f64> {
        match self {
            SpreadEstimator::SampleStdDev => sample_std_dev(values),
            SpreadEstimator::ScaledMad => {
                median_absolute_deviation(values).map(|mad| mad * MAD_NORMAL_SCALE)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    pub outlier_multiplier: f64,
    pub spread: SpreadEstimator,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            outlier_multiplier: 3.0,
            spread: SpreadEstimator::SampleStdDev,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    /// Usable values the report was computed over.
    pub n: usize,
    pub missing_count: usize,
    pub outlier_count: usize,
}

/// Counts values farther than `multiplier * spread` from the median.
///
/// Returns zero when the spread is undefined (fewer than two values for the
/// standard deviation).
pub fn count_outliers(values: &[f64], config: &QualityConfig) -> usize {
    let (Some(center), Some(spread)) = (median(values), config.spread.spread(values)) else {
        return 0;
    };
    let limit = config.outlier_multiplier * spread;
    values
        .iter()
        .filter(|v| (*v - center).abs() > limit)
        .count()
}

pub fn quality_of_values(values: &[f64], missing_count: usize, config: &QualityConfig) -> QualityReport {
    QualityReport {
        n: values.len(),
        missing_count,
        outlier_count: count_outliers(values, config),
    }
}

/// Quality of a cleaned series; missing rows are those whose value failed
/// numeric coercion before cleaning dropped them.
pub fn quality(cleaned: &CleanedSeries, config: &QualityConfig) -> QualityReport {
    quality_of_values(&cleaned.series.values(), cleaned.missing_count, config)
}
