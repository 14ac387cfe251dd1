//! End-to-end flows from raw tables to a comparison result.

use salinity_parser::{ColumnRole, RawTable};
use serde::Serialize;
use tracing::{info, warn};

use crate::alignment::{align, Alignment};
use crate::cleaning::{clean_observations, clean_series, CleanedSeries};
use crate::comparison::{compare, percent_change, ComparisonResult, PercentChange, Sample};
use crate::config::AnalysisConfig;
use crate::conversion::convert_observations;
use crate::error::{AnalysisError, Result, Side};
use crate::quality::{quality, QualityReport};
use crate::stats::mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    BeforeAfter,
    UpstreamDownstream,
}

impl PipelineKind {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineKind::BeforeAfter => "before_after",
            PipelineKind::UpstreamDownstream => "upstream_downstream",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PipelineKind::BeforeAfter => {
                "One station before vs after an intervention; conductivity converted where needed"
            }
            PipelineKind::UpstreamDownstream => {
                "Two stations aligned on nearest timestamp; downstream vs upstream"
            }
        }
    }
}

/// Practical salinity from whatever `table` carries.
///
/// A salinity column is used as-is. Otherwise conductivity/temperature rows
/// are cleaned and converted; rows that convert to missing count towards
/// `missing_count`, keeping the cleaning row-count invariant.
pub fn salinity_from_table(
    table: &RawTable,
    name: &str,
    config: &AnalysisConfig,
) -> Result<CleanedSeries> {
    if table.has(ColumnRole::Salinity) {
        return clean_series(table, ColumnRole::Salinity, name);
    }

    if table.has(ColumnRole::Conductivity) && table.has(ColumnRole::Temperature) {
        let cleaned = clean_observations(table, config.conversion.pressure_dbar)?;
        let conversion = convert_observations(name, &cleaned.observations);
        if conversion.unconverted > 0 {
            warn!(
                source = %table.source,
                unconverted = conversion.unconverted,
                "observations produced no salinity"
            );
        }
        return Ok(CleanedSeries {
            series: conversion.series,
            raw_rows: cleaned.raw_rows,
            missing_count: cleaned.missing_count + conversion.unconverted,
            malformed_timestamps: cleaned.malformed_timestamps,
        });
    }

    Err(AnalysisError::UnsupportedSource {
        source_name: table.source.clone(),
    })
}

fn require_values(cleaned: &CleanedSeries, side: Side, config: &AnalysisConfig) -> Result<()> {
    if cleaned.series.is_empty() {
        return Err(AnalysisError::InsufficientData {
            side,
            found: 0,
            required: config.comparison.min_sample_size.max(1),
        });
    }
    Ok(())
}

/// Renames the comparison slots to the stations that fill them.
fn station_side(err: AnalysisError) -> AnalysisError {
    match err {
        AnalysisError::InsufficientData {
            side,
            found,
            required,
        } => AnalysisError::InsufficientData {
            side: match side {
                Side::Before => Side::Downstream,
                Side::After => Side::Upstream,
                other => other,
            },
            found,
            required,
        },
        other => other,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BeforeAfterReport {
    pub before: CleanedSeries,
    pub after: CleanedSeries,
    pub comparison: ComparisonResult,
}

/// Single-station comparison of salinity before and after an intervention.
pub fn run_before_after(
    before: &RawTable,
    after: &RawTable,
    config: &AnalysisConfig,
) -> Result<BeforeAfterReport> {
    let before_series = salinity_from_table(before, "salinity_before", config)?;
    let after_series = salinity_from_table(after, "salinity_after", config)?;
    require_values(&before_series, Side::Before, config)?;
    require_values(&after_series, Side::After, config)?;

    let before_values = before_series.series.values();
    let after_values = after_series.series.values();
    let comparison = compare(
        Sample::new(&before_values, before_series.missing_count),
        Sample::new(&after_values, after_series.missing_count),
        &config.comparison,
        &config.quality,
    )?;

    info!(
        pipeline = PipelineKind::BeforeAfter.code(),
        n_before = before_values.len(),
        n_after = after_values.len(),
        p_value = comparison.p_value,
        verdict = comparison.verdict.as_str(),
        "pipeline finished"
    );

    Ok(BeforeAfterReport {
        before: before_series,
        after: after_series,
        comparison,
    })
}

/// Mean downstream minus upstream salinity over the aligned pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeanDifference {
    pub downstream_mean: f64,
    pub upstream_mean: f64,
    pub difference: f64,
    /// Difference relative to the upstream mean.
    pub percent_difference: PercentChange,
    /// Aligned pairs where downstream salinity exceeds upstream.
    pub pairs_downstream_higher: usize,
}

impl MeanDifference {
    pub fn from_alignment(alignment: &Alignment) -> Option<Self> {
        let downstream_mean = mean(&alignment.anchor_values())?;
        let upstream_mean = mean(&alignment.secondary_values())?;
        let difference = downstream_mean - upstream_mean;
        let percent_difference = match percent_change(upstream_mean, downstream_mean) {
            Ok(value) => PercentChange::Defined(value),
            Err(_) => PercentChange::Undefined,
        };
        let pairs_downstream_higher = alignment
            .pairs
            .iter()
            .filter(|pair| pair.anchor > pair.secondary)
            .count();

        Some(Self {
            downstream_mean,
            upstream_mean,
            difference,
            percent_difference,
            pairs_downstream_higher,
        })
    }

    pub fn downstream_higher(&self) -> bool {
        self.difference > 0.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpstreamDownstreamReport {
    pub downstream: CleanedSeries,
    pub upstream: CleanedSeries,
    pub downstream_quality: QualityReport,
    pub upstream_quality: QualityReport,
    pub alignment: Alignment,
    /// Downstream aligned values in the before slot, upstream in the after slot.
    pub comparison: ComparisonResult,
    pub mean_difference: MeanDifference,
}

/// Two-station comparison: downstream readings are the anchor, each joined
/// to the nearest upstream reading within the configured tolerance.
pub fn run_upstream_downstream(
    downstream: &RawTable,
    upstream: &RawTable,
    config: &AnalysisConfig,
) -> Result<UpstreamDownstreamReport> {
    let downstream_series = salinity_from_table(downstream, "salinity_downstream", config)?;
    let upstream_series = salinity_from_table(upstream, "salinity_upstream", config)?;
    require_values(&downstream_series, Side::Downstream, config)?;
    require_values(&upstream_series, Side::Upstream, config)?;

    let alignment = align(
        &downstream_series.series,
        &upstream_series.series,
        config.alignment.tolerance(),
    );
    if alignment.unmatched_anchors > 0 {
        warn!(
            unmatched_anchors = alignment.unmatched_anchors,
            tolerance_minutes = config.alignment.tolerance_minutes,
            "downstream readings without an upstream reading in tolerance"
        );
    }

    let downstream_values = alignment.anchor_values();
    let upstream_values = alignment.secondary_values();
    let comparison = compare(
        Sample::from(downstream_values.as_slice()),
        Sample::from(upstream_values.as_slice()),
        &config.comparison,
        &config.quality,
    )
    .map_err(station_side)?;
    let mean_difference =
        MeanDifference::from_alignment(&alignment).ok_or(AnalysisError::InsufficientData {
            side: Side::Downstream,
            found: 0,
            required: 1,
        })?;

    info!(
        pipeline = PipelineKind::UpstreamDownstream.code(),
        matched = alignment.len(),
        unmatched_anchors = alignment.unmatched_anchors,
        mean_difference = mean_difference.difference,
        p_value = comparison.p_value,
        verdict = comparison.verdict.as_str(),
        "pipeline finished"
    );

    Ok(UpstreamDownstreamReport {
        downstream_quality: quality(&downstream_series, &config.quality),
        upstream_quality: quality(&upstream_series, &config.quality),
        downstream: downstream_series,
        upstream: upstream_series,
        alignment,
        comparison,
        mean_difference,
    })
}
