//! Analysis configuration.
//!
//! This module provides the per-request configuration consumed by the
//! pipeline: department and data-type hints, header handling, and the
//! anomaly detector's ensemble settings.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Department used when the caller supplies none.
pub const DEFAULT_DEPARTMENT: &str = "general";

/// Anomaly detection configuration.
///
/// Controls the isolation forest ensemble run over each numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Enable anomaly detection
    pub enabled: bool,
    /// Assumed fraction of anomalous points (0.0, 0.5]
    pub contamination: f64,
    /// Number of isolation trees in the ensemble
    pub n_estimators: usize,
    /// Upper bound on the subsample size used to grow each tree
    pub max_samples: usize,
    /// Seed for the tree-building random number generator
    pub seed: u64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            contamination: 0.1,
            n_estimators: 100,
            max_samples: 256,
            seed: 42,
        }
    }
}

impl AnomalyConfig {
    /// Creates a new anomaly config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to enable/disable anomaly detection.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder method to set the contamination fraction.
    pub fn with_contamination(mut self, contamination: f64) -> Self {
        if !(contamination > 0.0 && contamination <= 0.5) {
            tracing::warn!(
                "contamination {} clamped to valid range (0.0, 0.5]",
                contamination
            );
        }
        self.contamination = if contamination.is_nan() {
            AnomalyConfig::default().contamination
        } else {
            contamination.clamp(f64::EPSILON, 0.5)
        };
        self
    }

    /// Builder method to set the ensemble size.
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators.max(1);
        self
    }

    /// Builder method to set the per-tree subsample bound.
    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples.max(2);
        self
    }

    /// Builder method to set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Per-request analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Free-text department name; matched case-insensitively by heuristics
    pub department: String,
    /// Free-text data type hint, informational only
    pub data_type: String,
    /// Whether the first row holds column names
    pub has_headers: bool,
    /// Anomaly detection settings
    pub anomaly_detection: AnomalyConfig,
}

/// Validation errors for analysis configuration.
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("contamination must be in (0.0, 0.5], got {0}")]
    InvalidContamination(f64),
    #[error("n_estimators must be at least 1")]
    NoEstimators,
    #[error("max_samples must be at least 2, got {0}")]
    InvalidMaxSamples(usize),
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            department: DEFAULT_DEPARTMENT.to_string(),
            data_type: "general".to_string(),
            has_headers: true,
            anomaly_detection: AnomalyConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Creates a new analysis config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the department.
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = department.into();
        self
    }

    /// Builder method to set the data type hint.
    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }

    /// Builder method to declare whether the first row is a header.
    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    /// Builder method to set anomaly detection config.
    pub fn with_anomaly_detection(mut self, config: AnomalyConfig) -> Self {
        self.anomaly_detection = config;
        self
    }

    /// Department as used for heuristic lookup: trimmed and lower-cased.
    pub fn department_key(&self) -> String {
        self.department.trim().to_lowercase()
    }

    /// Department as shown in human-readable text.
    ///
    /// Falls back to "business" when the caller left it blank.
    pub fn department_label(&self) -> &str {
        let trimmed = self.department.trim();
        if trimmed.is_empty() {
            "business"
        } else {
            trimmed
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let anomaly = &self.anomaly_detection;
        if !(anomaly.contamination > 0.0 && anomaly.contamination <= 0.5) {
            return Err(ConfigValidationError::InvalidContamination(
                anomaly.contamination,
            ));
        }
        if anomaly.n_estimators == 0 {
            return Err(ConfigValidationError::NoEstimators);
        }
        if anomaly.max_samples < 2 {
            return Err(ConfigValidationError::InvalidMaxSamples(
                anomaly.max_samples,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anomaly_config_default() {
        let config = AnomalyConfig::default();
        assert!(config.enabled);
        assert_eq!(config.contamination, 0.1);
        assert_eq!(config.n_estimators, 100);
        assert_eq!(config.max_samples, 256);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_anomaly_config_builder() {
        let config = AnomalyConfig::new()
            .with_enabled(false)
            .with_contamination(0.2)
            .with_n_estimators(50)
            .with_max_samples(64)
            .with_seed(7);

        assert!(!config.enabled);
        assert_eq!(config.contamination, 0.2);
        assert_eq!(config.n_estimators, 50);
        assert_eq!(config.max_samples, 64);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn test_contamination_clamping() {
        assert_eq!(AnomalyConfig::new().with_contamination(0.9).contamination, 0.5);
        assert!(AnomalyConfig::new().with_contamination(-1.0).contamination > 0.0);
        assert_eq!(
            AnomalyConfig::new().with_contamination(f64::NAN).contamination,
            0.1
        );
    }

    #[test]
    fn test_analysis_config_default() {
        let config = AnalysisConfig::default();
        assert_eq!(config.department, "general");
        assert_eq!(config.data_type, "general");
        assert!(config.has_headers);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_department_key_and_label() {
        let config = AnalysisConfig::new().with_department("  Finance ");
        assert_eq!(config.department_key(), "finance");
        assert_eq!(config.department_label(), "Finance");

        let config = AnalysisConfig::new().with_department("");
        assert_eq!(config.department_label(), "business");
    }

    #[test]
    fn test_validate_invalid_contamination() {
        let config = AnalysisConfig {
            anomaly_detection: AnomalyConfig {
                contamination: 0.75,
                ..AnomalyConfig::default()
            },
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidContamination(_))
        ));
    }

    #[test]
    fn test_validate_invalid_ensemble() {
        let config = AnalysisConfig {
            anomaly_detection: AnomalyConfig {
                n_estimators: 0,
                ..AnomalyConfig::default()
            },
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::NoEstimators)
        ));

        let config = AnalysisConfig {
            anomaly_detection: AnomalyConfig {
                max_samples: 1,
                ..AnomalyConfig::default()
            },
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::InvalidMaxSamples(1))
        ));
    }

    #[test]
    fn test_config_deserializes_partial_json() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"department": "sales", "has_headers": false}"#).unwrap();

        assert_eq!(config.department, "sales");
        assert_eq!(config.data_type, "general");
        assert!(!config.has_headers);
        assert_eq!(config.anomaly_detection, AnomalyConfig::default());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = AnalysisConfig::new()
            .with_department("finance")
            .with_anomaly_detection(AnomalyConfig::new().with_seed(9));

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: AnalysisConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(config, deserialized);
    }
}
