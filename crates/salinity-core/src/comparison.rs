//! Nonparametric before/after comparison.
//!
//! Medians, percent change, a two-sided Mann-Whitney U test and the
//! rank-biserial effect size `U / (n_before * n_after)`.
//!
//! The test is valid for any non-empty samples, but with fewer than roughly
//! eight to ten observations per side it has very little power; a small
//! sample that comes back inconclusive says little about the intervention.

use anofox_statistics::nonparametric::wilcoxon;
use anofox_statistics::parametric::ttest::Alternative;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalysisError, Result, Side};
use crate::quality::{quality_of_values, QualityConfig, QualityReport};
use crate::stats::{finite_values, median};

/// When both samples are larger than this, or there are ties, the normal
/// approximation replaces the exact null distribution.
const EXACT_MAX_SAMPLE: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComparisonConfig {
    /// Two-sided significance level for the verdict.
    pub significance_level: f64,
    /// Fewest usable values accepted on each side.
    pub min_sample_size: usize,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            significance_level: 0.05,
            min_sample_size: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    DecreaseSignificant,
    IncreaseSignificant,
    Inconclusive,
}

impl Verdict {
    pub fn classify(median_before: f64, median_after: f64, p_value: f64, alpha: f64) -> Self {
        if p_value < alpha && median_after < median_before {
            Verdict::DecreaseSignificant
        } else if p_value < alpha && median_after > median_before {
            Verdict::IncreaseSignificant
        } else {
            Verdict::Inconclusive
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::DecreaseSignificant => "decrease, significant",
            Verdict::IncreaseSignificant => "increase, significant",
            Verdict::Inconclusive => "inconclusive",
        }
    }
}

/// Percent change of the median, or `Undefined` when the before median is
/// zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", content = "percent", rename_all = "snake_case")]
pub enum PercentChange {
    Defined(f64),
    Undefined,
}

impl PercentChange {
    pub fn value(&self) -> Option<f64> {
        match self {
            PercentChange::Defined(v) => Some(*v),
            PercentChange::Undefined => None,
        }
    }
}

pub fn percent_change(before: f64, after: f64) -> Result<f64> {
    if before == 0.0 {
        return Err(AnalysisError::DivisionUndefined);
    }
    Ok(100.0 * (after - before) / before)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMethod {
    Exact,
    Asymptotic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MannWhitney {
    /// U statistic of the first sample.
    pub u_statistic: f64,
    pub p_value: f64,
    pub method: TestMethod,
}

/// Two-sided Mann-Whitney U test of `x` against `y`.
///
/// Uses the exact null distribution when at least one sample has eight or
/// fewer values and there are no ties; otherwise the normal approximation
/// with tie correction and continuity correction. If every value is
/// identical the statistic carries no information and the p-value is 1.
pub fn mann_whitney_u(x: &[f64], y: &[f64]) -> Result<MannWhitney> {
    let n1 = x.len();
    let n2 = y.len();
    if n1 == 0 {
        return Err(insufficient(Side::Before, 0, 1));
    }
    if n2 == 0 {
        return Err(insufficient(Side::After, 0, 1));
    }
    let max_u = (n1 * n2) as f64;

    let mut pooled: Vec<f64> = x.iter().chain(y.iter()).copied().collect();
    pooled.sort_by(|a, b| a.total_cmp(b));
    if pooled.first() == pooled.last() {
        return Ok(MannWhitney {
            u_statistic: max_u / 2.0,
            p_value: 1.0,
            method: TestMethod::Asymptotic,
        });
    }

    let has_ties = pooled.windows(2).any(|w| w[0] == w[1]);
    let method = if !has_ties && (n1 <= EXACT_MAX_SAMPLE || n2 <= EXACT_MAX_SAMPLE) {
        TestMethod::Exact
    } else {
        TestMethod::Asymptotic
    };

    let result = wilcoxon::mann_whitney_u(
        x,
        y,
        Alternative::TwoSided,
        true,
        method == TestMethod::Exact,
        None,
        None,
    )
    .map_err(|err| AnalysisError::Statistics(err.to_string()))?;

    if !(0.0..=max_u).contains(&result.statistic) || !result.p_value.is_finite() {
        return Err(AnalysisError::Statistics(format!(
            "Mann-Whitney returned U = {}, p = {} for samples of {n1} and {n2}",
            result.statistic, result.p_value
        )));
    }

    Ok(MannWhitney {
        u_statistic: result.statistic,
        p_value: result.p_value.clamp(0.0, 1.0),
        method,
    })
}

fn insufficient(side: Side, found: usize, required: usize) -> AnalysisError {
    AnalysisError::InsufficientData {
        side,
        found,
        required,
    }
}

/// One side of a comparison: its values plus missingness already observed
/// upstream (e.g. rows dropped during cleaning).
#[derive(Debug, Clone, Copy)]
pub struct Sample<'a> {
    pub values: &'a [f64],
    pub missing_count: usize,
}

impl<'a> Sample<'a> {
    pub fn new(values: &'a [f64], missing_count: usize) -> Self {
        Self {
            values,
            missing_count,
        }
    }
}

impl<'a> From<&'a [f64]> for Sample<'a> {
    fn from(values: &'a [f64]) -> Self {
        Self::new(values, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub median_before: f64,
    pub median_after: f64,
    pub percent_change: PercentChange,
    pub test_statistic: f64,
    pub p_value: f64,
    pub test_method: TestMethod,
    pub effect_size: f64,
    pub significance_level: f64,
    pub verdict: Verdict,
    pub before: QualityReport,
    pub after: QualityReport,
}

/// Compares two samples. Non-finite values count as missing and are left out
/// of every statistic.
pub fn compare(
    before: Sample<'_>,
    after: Sample<'_>,
    config: &ComparisonConfig,
    quality: &QualityConfig,
) -> Result<ComparisonResult> {
    let before_values = finite_values(before.values);
    let after_values = finite_values(after.values);

    let required = config.min_sample_size.max(1);
    if before_values.len() < required {
        return Err(insufficient(Side::Before, before_values.len(), required));
    }
    if after_values.len() < required {
        return Err(insufficient(Side::After, after_values.len(), required));
    }

    let median_before =
        median(&before_values).ok_or_else(|| insufficient(Side::Before, 0, required))?;
    let median_after =
        median(&after_values).ok_or_else(|| insufficient(Side::After, 0, required))?;

    let percent_change = match percent_change(median_before, median_after) {
        Ok(value) => PercentChange::Defined(value),
        Err(AnalysisError::DivisionUndefined) => PercentChange::Undefined,
        Err(err) => return Err(err),
    };

    let test = mann_whitney_u(&before_values, &after_values)?;
    let effect_size = test.u_statistic / (before_values.len() as f64 * after_values.len() as f64);
    let verdict = Verdict::classify(
        median_before,
        median_after,
        test.p_value,
        config.significance_level,
    );

    let before_missing = before.missing_count + (before.values.len() - before_values.len());
    let after_missing = after.missing_count + (after.values.len() - after_values.len());

    debug!(
        n_before = before_values.len(),
        n_after = after_values.len(),
        median_before,
        median_after,
        p_value = test.p_value,
        verdict = verdict.as_str(),
        "compared samples"
    );

    Ok(ComparisonResult {
        median_before,
        median_after,
        percent_change,
        test_statistic: test.u_statistic,
        p_value: test.p_value,
        test_method: test.method,
        effect_size,
        significance_level: config.significance_level,
        verdict,
        before: quality_of_values(&before_values, before_missing, quality),
        after: quality_of_values(&after_values, after_missing, quality),
    })
}

/// [`compare`] on plain slices.
pub fn compare_values(
    before: &[f64],
    after: &[f64],
    config: &ComparisonConfig,
    quality: &QualityConfig,
) -> Result<ComparisonResult> {
    compare(before.into(), after.into(), config, quality)
}
