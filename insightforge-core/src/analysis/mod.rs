//! Statistical analysis pipeline.
//!
//! This module turns a loaded [`Table`](crate::table::Table) into an
//! [`AnalysisResult`](crate::models::AnalysisResult):
//! - **Statistics**: per-column descriptive statistics and IQR outliers
//! - **Patterns**: linear trends, pairwise correlations, missing values
//! - **Anomalies**: seeded isolation forest per column
//! - **Insights and recommendations**: rule-based findings with department heuristics
//! - **Predictions and visualizations**: range/trend projections and histograms
//!
//! # Example
//! ```rust,ignore
//! use insightforge_core::analysis::CsvAnalyzer;
//!
//! let analyzer = CsvAnalyzer::new(AnalysisConfig::default())?;
//! let report = analyzer.analyze_bytes(&bytes, "sales.csv")?;
//! println!("{} insights", report.insights.len());
//! ```

mod analyzer;
mod anomaly;
mod departments;
mod insights;
mod math;
mod patterns;
mod predictive;
mod recommendations;
mod statistics;
mod visualization;

// Re-export public API
pub use analyzer::CsvAnalyzer;
pub use anomaly::{IsolationForest, detect_anomalies};
pub use departments::{
    DepartmentHeuristic, FinanceHeuristic, HeuristicRegistry, KeywordMatcher, SalesHeuristic,
};
pub use insights::{sort_by_impact, synthesize_insights};
pub use patterns::{CorrelationMatrix, detect_patterns, fit_trend};
pub use predictive::generate_predictive_insights;
pub use recommendations::{generate_executive_summary, generate_recommendations};
pub use statistics::{column_statistics, compute_statistics};
pub use visualization::{histogram, prepare_visualizations};
