use std::fs;
use std::path::PathBuf;

use crate::errors::ParserError;
use crate::model::{ColumnRole, SourceSchema};
use crate::{detect_and_parse, parse_table};

fn fixture(path: &str) -> String {
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let full_path = base.join("tests/data").join(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn default_layouts() -> Vec<(&'static str, SourceSchema)> {
    vec![
        ("logger", SourceSchema::logger_export()),
        ("spreadsheet", SourceSchema::spreadsheet_export()),
    ]
}

#[test]
fn parses_semicolon_logger_export() {
    let content = fixture("downstream_logger.csv");
    let table = parse_table(&content, "logger", &SourceSchema::logger_export())
        .expect("logger parse failed");

    assert_eq!(table.source, "logger");
    assert_eq!(table.height(), 8);
    assert!(table.has(ColumnRole::Timestamp));
    assert!(table.has(ColumnRole::Conductivity));
    assert!(table.has(ColumnRole::Temperature));
    assert!(!table.has(ColumnRole::Salinity));
    assert_eq!(table.df.width(), 3);

    let conductivity = table.text_column(ColumnRole::Conductivity).unwrap();
    assert_eq!(conductivity.get(0), Some("21500"));
    assert_eq!(conductivity.get(2), None);
    assert_eq!(conductivity.get(4), Some("ERR"));

    let temperature = table.text_column(ColumnRole::Temperature).unwrap();
    assert_eq!(temperature.get(7), Some("NaN"));
}

#[test]
fn parses_comma_spreadsheet_export() {
    let content = fixture("preinstallation.csv");
    let table = parse_table(&content, "spreadsheet", &SourceSchema::spreadsheet_export())
        .expect("spreadsheet parse failed");

    assert_eq!(table.height(), 6);
    let salinity = table.text_column(ColumnRole::Salinity).unwrap();
    assert_eq!(salinity.get(0), Some("18.2"));
    assert_eq!(salinity.get(2), None);
    assert_eq!(salinity.get(4), Some("n/a"));
}

#[test]
fn wrong_delimiter_is_a_format_mismatch() {
    let content = fixture("downstream_logger.csv");
    let err = parse_table(&content, "spreadsheet", &SourceSchema::spreadsheet_export())
        .expect_err("semicolon file must not parse as spreadsheet");
    assert!(matches!(err, ParserError::FormatMismatch { .. }));
}

#[test]
fn registry_detects_layout_from_headers() {
    let layouts = default_layouts();

    let logger = detect_and_parse(
        &fixture("upstream_logger.csv"),
        layouts.iter().map(|(name, schema)| (*name, schema)),
    )
    .expect("logger file should be detected");
    assert_eq!(logger.source, "logger");
    assert_eq!(logger.height(), 4);

    let spreadsheet = detect_and_parse(
        &fixture("preinstallation.csv"),
        layouts.iter().map(|(name, schema)| (*name, schema)),
    )
    .expect("spreadsheet file should be detected");
    assert_eq!(spreadsheet.source, "spreadsheet");
}

#[test]
fn registry_reports_every_attempt_when_nothing_matches() {
    let layouts = default_layouts();
    let content = "time,value\n2025-01-01 00:00:00,1.0\n";
    let err = detect_and_parse(content, layouts.iter().map(|(name, schema)| (*name, schema)))
        .expect_err("unknown layout should fail");

    match err {
        ParserError::NoMatchingParser { attempts } => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0].parser, "logger");
            assert_eq!(attempts[1].parser, "spreadsheet");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn header_matching_ignores_case_and_padding() {
    let content = " timestamp ; ELECTRICAL CONDUCTIVITY ;temperature\n2025-06-01 00:00:00;100;20\n";
    let table = parse_table(content, "logger", &SourceSchema::logger_export())
        .expect("case-insensitive headers should parse");
    assert_eq!(table.height(), 1);
}

#[test]
fn strips_byte_order_mark() {
    let content = fixture("bom_logger.csv");
    let table = parse_table(&content, "logger", &SourceSchema::logger_export())
        .expect("BOM-prefixed file should parse");
    assert_eq!(
        table.text_column(ColumnRole::Timestamp).unwrap().get(0),
        Some("2025-06-02 10:00:00")
    );
}

#[test]
fn header_only_file_is_empty_data() {
    let content = "Timestamp;Electrical Conductivity;Temperature\n";
    let err = parse_table(content, "logger", &SourceSchema::logger_export())
        .expect_err("header-only file should fail");
    assert!(matches!(err, ParserError::EmptyData { .. }));
}

#[test]
fn short_rows_become_null_cells() {
    let content = "Timestamp;Electrical Conductivity;Temperature\n2025-06-01 00:00:00;100\n";
    let table = parse_table(content, "logger", &SourceSchema::logger_export()).unwrap();
    assert_eq!(table.text_column(ColumnRole::Temperature).unwrap().get(0), None);
}

#[test]
fn non_ascii_delimiter_is_rejected() {
    let mut schema = SourceSchema::logger_export();
    schema.delimiter = '¦';
    assert!(schema.validate().is_err());
    let err = parse_table("a¦b\n", "odd", &schema).expect_err("non-ascii delimiter");
    assert!(matches!(err, ParserError::InvalidSchema { .. }));
}

#[test]
fn schema_requires_salinity_or_conductivity_pair() {
    let mut schema = SourceSchema::logger_export();
    schema.temperature = None;
    assert!(schema.validate().is_err());
    assert!(SourceSchema::spreadsheet_export().validate().is_ok());
}
