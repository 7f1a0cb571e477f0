//! File output operations for analysis reports.
//!
//! Handles validating a report and writing it to disk with optional
//! compression.

use insightforge_core::{AnalysisResult, InsightError, Result, validate_report_output};
use std::path::{Path, PathBuf};

/// Default report path: `<stem>.insights.json[.zst]` in the input file's directory.
pub fn default_output_path(input: &Path, compress: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report".to_string());

    if compress {
        input.with_file_name(format!("{}.insights.json.zst", stem))
    } else {
        input.with_file_name(format!("{}.insights.json", stem))
    }
}

/// Validates the report and saves it, compressed if requested.
pub async fn save_report(report: &AnalysisResult, output_path: &Path, compress: bool) -> Result<()> {
    let json_data = serde_json::to_string_pretty(report)
        .map_err(|e| InsightError::serialization("JSON serialization", e))?;

    // Validate output against JSON Schema before saving
    let json_value: serde_json::Value = serde_json::from_str(&json_data)
        .map_err(|e| InsightError::serialization("JSON parsing for validation", e))?;

    validate_report_output(&json_value)
        .map_err(|e| InsightError::report_validation(report.metadata.filename.clone(), e))?;

    tracing::info!("Output validation passed");

    if compress {
        #[cfg(feature = "compression")]
        {
            save_compressed(&json_data, output_path).await
        }
        #[cfg(not(feature = "compression"))]
        {
            Err(InsightError::configuration(
                "Compression not available. Compile with --features compression",
            ))
        }
    } else {
        save_json(&json_data, output_path).await
    }
}

/// Saves JSON data to file.
pub async fn save_json(json_data: &str, output_path: &Path) -> Result<()> {
    tokio::fs::write(output_path, json_data)
        .await
        .map_err(|e| InsightError::Io {
            context: format!("Failed to write to {}", output_path.display()),
            source: e,
        })
}

/// Saves zstd-compressed JSON data.
#[cfg(feature = "compression")]
async fn save_compressed(json_data: &str, output_path: &Path) -> Result<()> {
    let compressed_data = zstd::encode_all(json_data.as_bytes(), 3).map_err(|e| {
        InsightError::configuration(format!("Compression failed: {}", e))
    })?;

    tokio::fs::write(output_path, compressed_data)
        .await
        .map_err(|e| InsightError::Io {
            context: format!(
                "Failed to write compressed file to {}",
                output_path.display()
            ),
            source: e,
        })
}
