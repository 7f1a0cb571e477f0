//! Tests for report schema validation.
//!
//! Reports are produced by the real pipeline and then mutated to exercise the
//! structural, version and invariant checks.

use super::*;
use crate::analysis::CsvAnalyzer;
use crate::config::AnalysisConfig;
use serde_json::json;

/// Setup function to ensure validator is initialized for all tests
fn setup() {
    let _ = initialize_report_validator();
}

fn sample_report() -> AnalysisResult {
    let mut csv = String::from("revenue,expense,region,notes\n");
    for i in 0..40 {
        let notes = if i % 3 == 0 { "" } else { "ok" };
        csv.push_str(&format!(
            "{},{},r{},{}\n",
            100 + i * 5,
            80 + i * 4 + i % 2,
            i % 4,
            notes
        ));
    }
    csv.push_str("2000,90,r1,spike\n");

    CsvAnalyzer::new(AnalysisConfig::new().with_department("finance"))
        .unwrap()
        .analyze_bytes(csv.as_bytes(), "quarterly.csv")
        .unwrap()
}

fn sample_value() -> Value {
    serde_json::to_value(sample_report()).unwrap()
}

#[test]
fn test_validator_initialization_success() {
    assert!(initialize_report_validator().is_ok());
    // Second call is a no-op
    assert!(initialize_report_validator().is_ok());
}

#[test]
fn test_schema_definition_parses() {
    let schema = get_schema_definition().unwrap();
    assert_eq!(schema["title"], "InsightForge Analysis Report v1.0");
}

#[test]
fn test_pipeline_report_passes() {
    setup();

    let value = sample_value();
    assert!(!value["insights"].as_array().unwrap().is_empty());
    assert!(!value["recommendations"].as_array().unwrap().is_empty());

    validate_report_output(&value).unwrap();
}

#[test]
fn test_missing_format_version_fails() {
    setup();

    let mut value = sample_value();
    value.as_object_mut().unwrap().remove("format_version");

    let err = validate_report_output(&value).unwrap_err();
    assert!(matches!(err, ValidationError::ValidationFailed { .. }));
}

#[test]
fn test_unsupported_version_fails() {
    setup();

    let mut value = sample_value();
    value["format_version"] = json!("2.0");

    match validate_report_output(&value).unwrap_err() {
        ValidationError::UnsupportedVersion { version, supported } => {
            assert_eq!(version, "2.0");
            assert_eq!(supported, vec!["1.0"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_section_fails() {
    setup();

    let mut value = sample_value();
    value.as_object_mut().unwrap().remove("executive_summary");

    match validate_report_output(&value).unwrap_err() {
        ValidationError::ValidationFailed { error_count, errors } => {
            assert!(error_count >= 1);
            assert_eq!(error_count, errors.len());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_non_finite_statistic_fails() {
    setup();

    let mut value = sample_value();
    // NaN and infinity serialize as null
    value["statistics"]["revenue"]["mean"] = Value::Null;

    assert!(matches!(
        validate_report_output(&value),
        Err(ValidationError::ValidationFailed { .. })
    ));
}

#[test]
fn test_unknown_insight_type_fails() {
    setup();

    let mut value = sample_value();
    value["insights"][0]["type"] = json!("critical");

    assert!(validate_report_output(&value).is_err());
}

#[test]
fn test_insight_ordering_violation() {
    setup();

    let mut value = sample_value();
    value["insights"] = json!([
        {
            "type": "info", "category": "Data Distribution", "title": "Skewed Distribution",
            "description": "d", "impact": "medium", "confidence": 80.0
        },
        {
            "type": "success", "category": "Trend Analysis", "title": "Increasing Trend Detected",
            "description": "d", "impact": "high", "confidence": 95.0
        }
    ]);

    match validate_report_output(&value).unwrap_err() {
        ValidationError::InvariantViolation { reason } => assert!(reason.contains("insights[0]")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_recommendation_ordering_violation() {
    setup();

    let mut value = sample_value();
    let recommendations = value["recommendations"].as_array_mut().unwrap();
    assert!(recommendations.len() >= 2);
    recommendations.reverse();
    let last = recommendations.len() - 1;
    recommendations[last]["priority"] = json!("high");
    recommendations[0]["priority"] = json!("low");

    assert!(matches!(
        validate_report_output(&value),
        Err(ValidationError::InvariantViolation { .. })
    ));
}

#[test]
fn test_quartile_violation() {
    setup();

    let mut value = sample_value();
    value["statistics"]["revenue"]["q1"] = json!(1.0e9);

    match validate_report_output(&value).unwrap_err() {
        ValidationError::InvariantViolation { reason } => assert!(reason.contains("revenue")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_validate_and_parse_round_trip() {
    setup();

    let report = sample_report();
    let json_str = serde_json::to_string_pretty(&report).unwrap();

    let parsed = validate_and_parse_report(&json_str).unwrap();
    assert_eq!(parsed, report);
}

#[test]
fn test_invalid_json_fails() {
    setup();

    let err = validate_and_parse_report("{ not json").unwrap_err();
    assert!(matches!(err, ValidationError::JsonParsing { .. }));
}
