use chrono::NaiveDate;
use salinity_core::conversion::{convert_observations, salinity, salinity_series};
use salinity_core::types::PairedObservation;
use salinity_core::AnalysisError;

#[test]
fn zero_conductivity_is_fresh_water() {
    let sp = salinity(0.0, 18.0, 0.0).expect("zero conductivity converts");
    assert!(sp.abs() < 1e-12, "got {sp}");
}

#[test]
fn brackish_logger_reading_lands_in_expected_range() {
    let sp = salinity(21_500.0, 24.1, 0.0).unwrap();
    assert!(sp > 12.5 && sp < 14.0, "got {sp}");
}

#[test]
fn invalid_inputs_are_missing() {
    assert_eq!(salinity(-1.0, 20.0, 0.0), None);
    assert_eq!(salinity(f64::NAN, 20.0, 0.0), None);
    assert_eq!(salinity(20_000.0, f64::INFINITY, 0.0), None);
    assert_eq!(salinity(20_000.0, 20.0, -5.0), None);
}

#[test]
fn vector_form_requires_equal_lengths() {
    let err = salinity_series(&[1_000.0, 2_000.0], &[20.0], &[0.0, 0.0]).unwrap_err();
    assert!(matches!(err, AnalysisError::LengthMismatch(_)));

    let values = salinity_series(&[1_000.0, -1.0], &[20.0, 20.0], &[0.0, 0.0]).unwrap();
    assert!(values[0].is_some());
    assert_eq!(values[1], None);
}

#[test]
fn converting_observations_counts_unconverted_rows() {
    let day = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let observations = vec![
        PairedObservation {
            timestamp: day.and_hms_opt(0, 10, 0).unwrap(),
            conductivity_us_cm: 20_000.0,
            temperature_c: 22.0,
            pressure_dbar: 0.0,
        },
        PairedObservation {
            timestamp: day.and_hms_opt(0, 0, 0).unwrap(),
            conductivity_us_cm: 19_000.0,
            temperature_c: 22.0,
            pressure_dbar: 0.0,
        },
        PairedObservation {
            timestamp: day.and_hms_opt(0, 5, 0).unwrap(),
            conductivity_us_cm: 19_500.0,
            temperature_c: 22.0,
            pressure_dbar: -1.0,
        },
    ];

    let conversion = convert_observations("salinity", &observations);
    assert_eq!(conversion.unconverted, 1);
    assert_eq!(conversion.series.len(), 2);
    assert_eq!(conversion.series.name(), "salinity");

    let values = conversion.series.values();
    assert!(values[0] < values[1], "output must be time ordered");
}
