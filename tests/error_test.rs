//! Tests for error types

use scratch_assay::Error;

#[test]
fn test_invalid_magnification_error() {
    let error = Error::InvalidMagnification("40x".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid magnification '40x'"));
    assert!(error_str.contains("4x, 10x and 20x"));
}

#[test]
fn test_degenerate_fit_error() {
    let error = Error::DegenerateFit("1 point".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Degenerate fit"));
    assert!(error_str.contains("1 point"));
}

#[test]
fn test_undefined_closure_time_error() {
    let error = Error::UndefinedClosureTime { intercept: 42.5 };
    let error_str = format!("{error}");
    assert!(error_str.contains("slope is zero"));
    assert!(error_str.contains("42.5"));
}

#[test]
fn test_malformed_input_error() {
    let error = Error::malformed("Example/A1_data.csv", "missing column 'Time (min)'");
    let error_str = format!("{error}");
    assert!(error_str.contains("Malformed input in Example/A1_data.csv"));
    assert!(error_str.contains("Time (min)"));
}

#[test]
fn test_invalid_input_error() {
    let error = Error::InvalidInput("fit-end fraction must be within [0, 1]".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid input"));
    assert!(error_str.contains("[0, 1]"));
}

#[test]
fn test_well_error_wraps_source() {
    let error = Error::DegenerateFit("identical times".to_string()).for_well("B3");
    let error_str = format!("{error}");
    assert!(error_str.contains("Well B3"));
    assert!(error_str.contains("identical times"));

    let source = std::error::Error::source(&error).map(ToString::to_string);
    assert!(source.is_some_and(|s| s.contains("Degenerate fit")));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
}

#[test]
fn test_toml_error_conversion() {
    let toml_error = toml::from_str::<toml::Value>("magnification = ").unwrap_err();
    let error: Error = toml_error.into();
    assert!(matches!(error, Error::Config(_)));
}

#[test]
fn test_error_debug() {
    let error = Error::Plot("backend closed".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("Plot"));
}
