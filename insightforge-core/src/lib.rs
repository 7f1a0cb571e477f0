//! Core library for InsightForge tabular analysis.
//!
//! This crate turns an uploaded CSV or spreadsheet into a structured analysis
//! report: descriptive statistics, trends, correlations, anomalies, insights,
//! recommendations and chart data. The pipeline is deterministic and
//! offline; the optional narrative layer talks to an injected
//! text-completion client.
//!
//! # Architecture
//! - `loader` parses bytes into a typed [`Table`]
//! - `analysis` runs the pure pipeline stages behind [`CsvAnalyzer`]
//! - `validation` checks serialized reports against an embedded JSON Schema
//! - `narrative` wraps the text-completion boundary

pub mod analysis;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod models;
pub mod narrative;
pub mod table;
pub mod validation;

// Re-export commonly used types
pub use analysis::{CsvAnalyzer, DepartmentHeuristic, HeuristicRegistry};
pub use config::{AnalysisConfig, AnomalyConfig, ConfigValidationError};
pub use error::{InsightError, Result};
pub use loader::{SUPPORTED_EXTENSIONS, load};
pub use models::{
    AnalysisMetadata, AnalysisResult, AnomalyRecord, ColumnStatistics, CorrelationRecord,
    DataQualityIssue, ExecutiveSummary, HistogramSpec, Insight, InsightType, Level,
    PatternReport, PredictiveInsight, Recommendation, StatisticsMap, TrendRecord,
};
pub use narrative::{Narrative, NarrativeSource, TextCompletion, narrate_summary};
pub use table::{Column, ColumnData, Table};

pub use validation::{
    ValidationError, initialize_report_validator, validate_and_parse_report,
    validate_report_output,
};
