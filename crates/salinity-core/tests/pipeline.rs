mod common;

use common::{at, logger_table, spreadsheet_table};
use salinity_core::comparison::{TestMethod, Verdict};
use salinity_core::config::AnalysisConfig;
use salinity_core::pipelines::{
    run_before_after, run_upstream_downstream, salinity_from_table, PipelineKind,
};
use salinity_core::{AnalysisError, Side};
use salinity_parser::{parse_table, SourceSchema};

#[test]
fn logger_tables_are_converted_to_salinity() {
    let config = AnalysisConfig::with_defaults();
    let table = logger_table("downstream_logger.csv");
    let cleaned = salinity_from_table(&table, "sp", &config).unwrap();

    assert_eq!(cleaned.raw_rows, 8);
    assert_eq!(cleaned.series.len(), 4);
    assert_eq!(
        cleaned.series.len() + cleaned.missing_count + cleaned.malformed_timestamps,
        cleaned.raw_rows
    );
    let values = cleaned.series.values();
    assert!(values.windows(2).all(|w| w[0] < w[1]));
    assert!(values.iter().all(|v| *v > 10.0 && *v < 20.0));
}

#[test]
fn before_after_detects_the_drop_after_installation() {
    let config = AnalysisConfig::with_defaults();
    let report = run_before_after(
        &spreadsheet_table("preinstallation.csv"),
        &logger_table("downstream_logger.csv"),
        &config,
    )
    .unwrap();

    assert_eq!(report.before.series.len(), 4);
    assert_eq!(report.after.series.len(), 4);

    let comparison = &report.comparison;
    assert!((comparison.median_before - 18.75).abs() < 1e-12);
    assert!(comparison.median_after < comparison.median_before);
    assert!(comparison.percent_change.value().unwrap() < 0.0);
    assert_eq!(comparison.test_method, TestMethod::Exact);
    assert!((comparison.p_value - 2.0 / 70.0).abs() < 1e-12);
    assert_eq!(comparison.verdict, Verdict::DecreaseSignificant);
    assert_eq!(comparison.before.missing_count, 2);
    assert_eq!(comparison.after.missing_count, 3);
}

#[test]
fn upstream_downstream_aligns_and_compares() {
    let config = AnalysisConfig::with_defaults();
    let report = run_upstream_downstream(
        &logger_table("downstream_logger.csv"),
        &logger_table("upstream_logger.csv"),
        &config,
    )
    .unwrap();

    assert_eq!(report.alignment.len(), 4);
    assert_eq!(report.alignment.unmatched_anchors, 0);
    let secondary: Vec<_> = report
        .alignment
        .pairs
        .iter()
        .map(|p| p.secondary_timestamp)
        .collect();
    assert_eq!(secondary, vec![at(0, 2), at(0, 2), at(0, 12), at(0, 26)]);

    let diff = &report.mean_difference;
    assert!(diff.downstream_higher());
    assert_eq!(diff.pairs_downstream_higher, 4);
    assert!(diff.percent_difference.value().unwrap() > 0.0);

    assert_eq!(report.comparison.effect_size, 1.0);
    assert_eq!(report.comparison.verdict, Verdict::DecreaseSignificant);
    assert_eq!(report.downstream_quality.missing_count, 3);
    assert_eq!(report.upstream_quality.missing_count, 0);
}

#[test]
fn narrow_tolerance_drops_unmatched_readings() {
    let mut config = AnalysisConfig::with_defaults();
    config.alignment.tolerance_minutes = 2;
    let report = run_upstream_downstream(
        &logger_table("downstream_logger.csv"),
        &logger_table("upstream_logger.csv"),
        &config,
    )
    .unwrap();

    assert_eq!(report.alignment.len(), 2);
    assert_eq!(report.alignment.unmatched_anchors, 2);
    assert_eq!(report.comparison.before.n, 2);
}

#[test]
fn source_without_salinity_inputs_is_unsupported() {
    let schema = SourceSchema {
        salinity: None,
        conductivity: Some("Electrical Conductivity".to_string()),
        temperature: None,
        ..SourceSchema::logger_export()
    };
    let table = parse_table(
        "Timestamp;Electrical Conductivity\n2025-06-01 00:00:00;100\n",
        "partial",
        &schema,
    )
    .unwrap();

    let err = salinity_from_table(&table, "sp", &AnalysisConfig::with_defaults()).unwrap_err();
    assert!(matches!(err, AnalysisError::UnsupportedSource { .. }));
}

#[test]
fn reports_serialize_to_json() {
    let config = AnalysisConfig::with_defaults();
    let report = run_before_after(
        &spreadsheet_table("preinstallation.csv"),
        &logger_table("downstream_logger.csv"),
        &config,
    )
    .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["comparison"]["verdict"], "decrease_significant");
    assert_eq!(json["comparison"]["percent_change"]["status"], "defined");
    assert_eq!(json["before"]["missing_count"], 2);
}

fn unusable_logger_table() -> salinity_parser::RawTable {
    parse_table(
        "Timestamp;Electrical Conductivity;Temperature\nnot-a-date;ERR;\n",
        "logger",
        &SourceSchema::logger_export(),
    )
    .unwrap()
}

#[test]
fn empty_after_side_is_named_in_the_error() {
    let err = run_before_after(
        &logger_table("downstream_logger.csv"),
        &unusable_logger_table(),
        &AnalysisConfig::with_defaults(),
    )
    .unwrap_err();

    match err {
        AnalysisError::InsufficientData {
            side,
            found,
            required,
        } => {
            assert_eq!(side, Side::After);
            assert_eq!(found, 0);
            assert_eq!(required, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn empty_upstream_station_is_named_in_the_error() {
    let err = run_upstream_downstream(
        &logger_table("downstream_logger.csv"),
        &unusable_logger_table(),
        &AnalysisConfig::with_defaults(),
    )
    .unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::InsufficientData {
            side: Side::Upstream,
            found: 0,
            ..
        }
    ));
    assert!(err.to_string().contains("upstream"), "{err}");
}

#[test]
fn no_aligned_pairs_blames_the_downstream_station() {
    let mut config = AnalysisConfig::with_defaults();
    config.alignment.tolerance_minutes = 0;
    let err = run_upstream_downstream(
        &logger_table("downstream_logger.csv"),
        &logger_table("upstream_logger.csv"),
        &config,
    )
    .unwrap_err();

    assert!(matches!(
        err,
        AnalysisError::InsufficientData {
            side: Side::Downstream,
            found: 0,
            ..
        }
    ));
}

#[test]
fn pipeline_kinds_describe_themselves() {
    assert_eq!(PipelineKind::BeforeAfter.code(), "before_after");
    assert_eq!(PipelineKind::UpstreamDownstream.code(), "upstream_downstream");
    assert!(PipelineKind::UpstreamDownstream
        .description()
        .contains("downstream"));
}
