//! JSON Schema validation for InsightForge analysis reports.
//!
//! Reports are checked against an embedded JSON Schema before they are
//! written or accepted from disk. On top of the structural checks, the
//! ordering and statistics invariants that a schema cannot express are
//! verified explicitly.
//!
//! # Example
//! ```rust
//! use insightforge_core::{AnalysisConfig, CsvAnalyzer};
//! use insightforge_core::validation::{initialize_report_validator, validate_report_output};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! initialize_report_validator()?;
//!
//! let analyzer = CsvAnalyzer::new(AnalysisConfig::default())?;
//! let report = analyzer.analyze_bytes(b"units\n1\n2\n3\n", "units.csv")?;
//! validate_report_output(&serde_json::to_value(&report)?)?;
//! # Ok(())
//! # }
//! ```

use jsonschema::Validator;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::AnalysisResult;

/// Report validation errors with field-level detail
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// The document does not conform to the report schema
    #[error("Report validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },

    /// Unsupported format version detected
    #[error("Unsupported format version '{version}'. Supported versions: {supported:?}")]
    UnsupportedVersion {
        version: String,
        supported: Vec<String>,
    },

    /// A list ordering or statistics invariant does not hold
    #[error("Report invariant violated: {reason}")]
    InvariantViolation { reason: String },

    /// JSON parsing error
    #[error("JSON parsing failed: {source}")]
    JsonParsing {
        #[from]
        source: serde_json::Error,
    },
}

/// Supported format versions for backward compatibility
const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Embedded JSON Schema for v1.0 reports
const REPORT_SCHEMA_V1_0: &str = r##"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "InsightForge Analysis Report v1.0",
  "type": "object",
  "required": [
    "format_version", "metadata", "statistics", "patterns", "insights",
    "recommendations", "anomalies", "predictive_insights", "visualizations",
    "executive_summary", "agent_info"
  ],
  "properties": {
    "format_version": { "type": "string", "pattern": "^1\\.0$" },
    "metadata": {
      "type": "object",
      "required": [
        "filename", "total_rows", "total_columns", "numeric_columns_count",
        "categorical_columns_count", "columns_list", "department", "data_type",
        "analysis_timestamp", "estimated_memory_mb"
      ],
      "properties": {
        "filename": { "type": "string", "minLength": 1 },
        "total_rows": { "type": "integer", "minimum": 1 },
        "total_columns": { "type": "integer", "minimum": 1 },
        "numeric_columns_count": { "type": "integer", "minimum": 0 },
        "categorical_columns_count": { "type": "integer", "minimum": 0 },
        "columns_list": { "type": "array", "items": { "type": "string" } },
        "department": { "type": "string" },
        "data_type": { "type": "string" },
        "analysis_timestamp": { "type": "string", "format": "date-time" },
        "estimated_memory_mb": { "type": "number", "minimum": 0 }
      }
    },
    "statistics": {
      "type": "object",
      "additionalProperties": { "$ref": "#/$defs/column_statistics" }
    },
    "patterns": {
      "type": "object",
      "required": ["trends", "correlations", "data_quality_issues"],
      "properties": {
        "trends": { "type": "array", "items": { "$ref": "#/$defs/trend" } },
        "correlations": { "type": "array", "items": { "$ref": "#/$defs/correlation" } },
        "data_quality_issues": { "type": "array", "items": { "$ref": "#/$defs/quality_issue" } }
      }
    },
    "insights": { "type": "array", "items": { "$ref": "#/$defs/insight" } },
    "recommendations": { "type": "array", "items": { "$ref": "#/$defs/recommendation" } },
    "anomalies": { "type": "array", "items": { "$ref": "#/$defs/anomaly" } },
    "predictive_insights": { "type": "array", "items": { "$ref": "#/$defs/prediction" } },
    "visualizations": { "type": "array", "items": { "$ref": "#/$defs/histogram" } },
    "executive_summary": {
      "type": "object",
      "required": ["overview", "key_takeaways", "business_impact", "next_steps"],
      "properties": {
        "overview": { "type": "string" },
        "key_takeaways": { "type": "array", "items": { "type": "string" }, "maxItems": 3 },
        "business_impact": { "type": "string" },
        "next_steps": { "type": "array", "items": { "type": "string" }, "maxItems": 2 }
      }
    },
    "agent_info": {
      "type": "object",
      "required": ["name", "version", "analysis_timestamp"],
      "properties": {
        "name": { "type": "string", "minLength": 1 },
        "version": { "type": "string", "minLength": 1 },
        "analysis_timestamp": { "type": "string", "format": "date-time" }
      }
    }
  },
  "$defs": {
    "level": { "enum": ["high", "medium", "low"] },
    "severity": { "enum": ["high", "medium"] },
    "percentage": { "type": "number", "minimum": 0, "maximum": 100 },
    "column_statistics": {
      "type": "object",
      "required": [
        "count", "sum", "mean", "median", "std", "min", "max", "range", "variance",
        "skewness", "kurtosis", "q1", "q3", "iqr", "outlier_count", "outlier_percentage"
      ],
      "properties": {
        "count": { "type": "integer", "minimum": 1 },
        "sum": { "type": "number" },
        "mean": { "type": "number" },
        "median": { "type": "number" },
        "std": { "type": "number", "minimum": 0 },
        "min": { "type": "number" },
        "max": { "type": "number" },
        "range": { "type": "number", "minimum": 0 },
        "variance": { "type": "number", "minimum": 0 },
        "skewness": { "type": "number" },
        "kurtosis": { "type": "number" },
        "q1": { "type": "number" },
        "q3": { "type": "number" },
        "iqr": { "type": "number", "minimum": 0 },
        "outlier_count": { "type": "integer", "minimum": 0 },
        "outlier_percentage": { "$ref": "#/$defs/percentage" }
      }
    },
    "trend": {
      "type": "object",
      "required": ["column", "direction", "strength", "slope", "confidence_percent"],
      "properties": {
        "column": { "type": "string" },
        "direction": { "enum": ["increasing", "decreasing"] },
        "strength": { "type": "number", "minimum": 0, "maximum": 1 },
        "slope": { "type": "number" },
        "confidence_percent": { "$ref": "#/$defs/percentage" }
      }
    },
    "correlation": {
      "type": "object",
      "required": ["column_a", "column_b", "coefficient", "strength", "direction"],
      "properties": {
        "column_a": { "type": "string" },
        "column_b": { "type": "string" },
        "coefficient": { "type": "number", "minimum": -1, "maximum": 1 },
        "strength": { "enum": ["moderate", "strong"] },
        "direction": { "enum": ["positive", "negative"] }
      }
    },
    "quality_issue": {
      "type": "object",
      "required": ["column", "issue", "missing_count", "missing_percentage", "severity"],
      "properties": {
        "column": { "type": "string" },
        "issue": { "type": "string" },
        "missing_count": { "type": "integer", "minimum": 1 },
        "missing_percentage": { "$ref": "#/$defs/percentage" },
        "severity": { "$ref": "#/$defs/severity" }
      }
    },
    "anomaly": {
      "type": "object",
      "required": [
        "column", "anomaly_count", "anomaly_percentage", "severity", "description", "suggestion"
      ],
      "properties": {
        "column": { "type": "string" },
        "anomaly_count": { "type": "integer", "minimum": 1 },
        "anomaly_percentage": { "$ref": "#/$defs/percentage" },
        "severity": { "$ref": "#/$defs/severity" },
        "description": { "type": "string" },
        "suggestion": { "type": "string" }
      }
    },
    "insight": {
      "type": "object",
      "required": ["type", "category", "title", "description", "impact", "confidence"],
      "properties": {
        "type": { "enum": ["warning", "info", "success", "error"] },
        "category": { "type": "string" },
        "title": { "type": "string", "minLength": 1 },
        "description": { "type": "string" },
        "impact": { "$ref": "#/$defs/level" },
        "confidence": { "$ref": "#/$defs/percentage" }
      }
    },
    "recommendation": {
      "type": "object",
      "required": [
        "priority", "category", "title", "description", "action_steps",
        "expected_impact", "implementation_effort"
      ],
      "properties": {
        "priority": { "$ref": "#/$defs/level" },
        "category": { "type": "string" },
        "title": { "type": "string", "minLength": 1 },
        "description": { "type": "string" },
        "action_steps": { "type": "array", "items": { "type": "string" } },
        "expected_impact": { "type": "string" },
        "implementation_effort": { "type": "string" }
      }
    },
    "prediction": {
      "type": "object",
      "required": ["type", "metric", "prediction", "confidence", "basis", "timeframe"],
      "properties": {
        "type": { "enum": ["trend_projection", "range_prediction"] },
        "metric": { "type": "string" },
        "prediction": { "type": "string" },
        "confidence": { "$ref": "#/$defs/percentage" },
        "basis": { "type": "string" },
        "timeframe": { "type": "string" }
      }
    },
    "histogram": {
      "type": "object",
      "required": ["chart_type", "title", "column", "bins", "x_key", "y_key"],
      "properties": {
        "chart_type": { "const": "histogram" },
        "title": { "type": "string" },
        "column": { "type": "string" },
        "bins": {
          "type": "array",
          "minItems": 1,
          "maxItems": 10,
          "items": {
            "type": "object",
            "required": ["bin_start", "bin_end", "count", "frequency_percent"],
            "properties": {
              "bin_start": { "type": "number" },
              "bin_end": { "type": "number" },
              "count": { "type": "integer", "minimum": 0 },
              "frequency_percent": { "$ref": "#/$defs/percentage" }
            }
          }
        },
        "x_key": { "const": "bin_start" },
        "y_key": { "const": "count" }
      }
    }
  }
}"##;

/// Compiled JSON Schema instance (initialized once)
static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Compiles the embedded report schema and caches it for reuse.
///
/// Call once during startup; later calls are no-ops.
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_report_validator() -> Result<(), ValidationError> {
    if COMPILED_SCHEMA.get().is_some() {
        return Ok(());
    }

    let schema_json = get_schema_definition()?;
    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    let _ = COMPILED_SCHEMA.set(compiled);
    Ok(())
}

/// Validates a serialized report.
///
/// Checks, in order: format version, JSON Schema conformance (non-finite
/// numbers serialize as `null` and are rejected here), then the ordering and
/// statistics invariants.
///
/// # Errors
/// Returns the first class of failure found, with every schema error listed.
pub fn validate_report_output(json_value: &Value) -> Result<(), ValidationError> {
    let schema = COMPILED_SCHEMA
        .get()
        .ok_or_else(|| ValidationError::SchemaCompilation {
            message: "Report validator not initialized. Call initialize_report_validator() first."
                .to_string(),
        })?;

    validate_format_version(json_value)?;

    let errors: Vec<String> = schema
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !errors.is_empty() {
        return Err(ValidationError::ValidationFailed {
            error_count: errors.len(),
            errors,
        });
    }

    validate_ordering(json_value, "insights", "impact")?;
    validate_ordering(json_value, "recommendations", "priority")?;
    validate_statistics(json_value)?;

    Ok(())
}

/// Ensures the format_version field is present and supported.
fn validate_format_version(json_value: &Value) -> Result<(), ValidationError> {
    let version = json_value
        .get("format_version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ValidationError::ValidationFailed {
            error_count: 1,
            errors: vec!["Missing required field 'format_version'".to_string()],
        })?;

    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(ValidationError::UnsupportedVersion {
            version: version.to_string(),
            supported: SUPPORTED_VERSIONS.iter().map(|s| s.to_string()).collect(),
        });
    }

    Ok(())
}

fn level_rank(level: &str) -> u8 {
    match level {
        "high" => 3,
        "medium" => 2,
        "low" => 1,
        _ => 0,
    }
}

/// Checks that `list` is sorted descending by the level stored in `field`.
fn validate_ordering(json_value: &Value, list: &str, field: &str) -> Result<(), ValidationError> {
    let Some(items) = json_value.get(list).and_then(Value::as_array) else {
        return Ok(());
    };

    let ranks: Vec<u8> = items
        .iter()
        .map(|item| item.get(field).and_then(Value::as_str).map_or(0, level_rank))
        .collect();

    match ranks.windows(2).position(|pair| pair[0] < pair[1]) {
        Some(index) => Err(ValidationError::InvariantViolation {
            reason: format!(
                "{}[{}] has lower {} than {}[{}]",
                list,
                index,
                field,
                list,
                index + 1
            ),
        }),
        None => Ok(()),
    }
}

/// Checks quartile ordering for every column's statistics.
fn validate_statistics(json_value: &Value) -> Result<(), ValidationError> {
    let Some(statistics) = json_value.get("statistics").and_then(Value::as_object) else {
        return Ok(());
    };

    for (column, stats) in statistics {
        let field = |name: &str| stats.get(name).and_then(Value::as_f64).unwrap_or(f64::NAN);
        let (q1, median, q3) = (field("q1"), field("median"), field("q3"));
        if !(q1 <= median && median <= q3) {
            return Err(ValidationError::InvariantViolation {
                reason: format!(
                    "statistics for '{}' violate q1 <= median <= q3 ({} / {} / {})",
                    column, q1, median, q3
                ),
            });
        }
    }

    Ok(())
}

/// Parses, validates and deserializes a report in one step.
///
/// # Errors
/// Returns validation errors for malformed JSON, schema violations, or
/// broken invariants.
pub fn validate_and_parse_report(json_str: &str) -> Result<AnalysisResult, ValidationError> {
    let json_value: Value = serde_json::from_str(json_str)?;

    validate_report_output(&json_value)?;

    let report: AnalysisResult = serde_json::from_value(json_value)?;
    Ok(report)
}

/// Returns the embedded report schema as a parsed value.
pub fn get_schema_definition() -> Result<Value, ValidationError> {
    serde_json::from_str(REPORT_SCHEMA_V1_0).map_err(|e| ValidationError::SchemaCompilation {
        message: format!("Failed to parse embedded schema: {}", e),
    })
}

#[cfg(test)]
mod tests;
