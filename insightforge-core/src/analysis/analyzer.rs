//! Analysis pipeline facade.
//!
//! `CsvAnalyzer` runs the loader and then the analysis stages in order:
//! statistics and patterns, then anomalies and insights, then
//! recommendations, predictions and visualizations. Each stage is a pure
//! function; intermediate results are handed forward by value.

use chrono::Utc;

use crate::Result;
use crate::config::AnalysisConfig;
use crate::loader::load;
use crate::models::{
    AgentInfo, AnalysisMetadata, AnalysisResult, AnomalyRecord, Insight, PatternReport,
    REPORT_FORMAT_VERSION, StatisticsMap,
};
use crate::table::Table;
use crate::InsightError;

use super::anomaly::detect_anomalies;
use super::departments::HeuristicRegistry;
use super::insights::synthesize_insights;
use super::patterns::detect_patterns;
use super::predictive::generate_predictive_insights;
use super::recommendations::{generate_executive_summary, generate_recommendations};
use super::statistics::compute_statistics;
use super::visualization::prepare_visualizations;

/// Output of the first stage: the table with its statistics and patterns.
#[derive(Debug)]
struct Profile {
    table: Table,
    statistics: StatisticsMap,
    patterns: PatternReport,
}

/// Output of the second stage.
#[derive(Debug)]
struct Findings {
    profile: Profile,
    anomalies: Vec<AnomalyRecord>,
    insights: Vec<Insight>,
}

/// Turns uploaded tabular files into analysis reports.
///
/// # Example
///
/// ```rust
/// use insightforge_core::{AnalysisConfig, CsvAnalyzer};
///
/// let config = AnalysisConfig::new().with_department("finance");
/// let analyzer = CsvAnalyzer::new(config)?;
///
/// let report = analyzer.analyze_bytes(b"revenue,expense\n100,80\n120,85\n", "q3.csv")?;
/// assert_eq!(report.metadata.total_rows, 2);
/// # Ok::<(), insightforge_core::InsightError>(())
/// ```
#[derive(Debug)]
pub struct CsvAnalyzer {
    config: AnalysisConfig,
    registry: HeuristicRegistry,
}

impl CsvAnalyzer {
    /// Creates an analyzer with the built-in department heuristics.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration is invalid.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Self::with_registry(config, HeuristicRegistry::with_defaults()?)
    }

    /// Creates an analyzer with a caller-supplied heuristic registry.
    pub fn with_registry(config: AnalysisConfig, registry: HeuristicRegistry) -> Result<Self> {
        config
            .validate()
            .map_err(|e| InsightError::configuration(e.to_string()))?;
        Ok(Self { config, registry })
    }

    /// Returns the analyzer configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Returns the department heuristics in use.
    pub fn registry(&self) -> &HeuristicRegistry {
        &self.registry
    }

    /// Loads raw file content and analyzes it.
    ///
    /// # Errors
    ///
    /// Only loader failures are returned: unsupported extension, unparseable
    /// content or an empty table.
    pub fn analyze_bytes(&self, raw_bytes: &[u8], filename: &str) -> Result<AnalysisResult> {
        let table = load(raw_bytes, filename, self.config.has_headers)?;
        tracing::info!(
            "Loaded '{}': {} rows, {} columns ({} numeric)",
            filename,
            table.row_count(),
            table.column_count(),
            table.numeric_column_count()
        );
        Ok(self.analyze_table(table, filename))
    }

    /// Analyzes an already loaded table. Never fails.
    pub fn analyze_table(&self, table: Table, filename: &str) -> AnalysisResult {
        let started = std::time::Instant::now();

        let profile = self.profile(table);
        let findings = self.find(profile);
        let result = self.report(findings, filename);

        tracing::info!(
            "Analysis of '{}' completed in {:.2?}: {} insights, {} recommendations, {} anomalies",
            filename,
            started.elapsed(),
            result.insights.len(),
            result.recommendations.len(),
            result.anomalies.len()
        );
        result
    }

    fn profile(&self, table: Table) -> Profile {
        let (statistics, patterns) =
            rayon::join(|| compute_statistics(&table), || detect_patterns(&table));
        tracing::debug!(
            "Profiled {} columns: {} trends, {} correlations, {} quality issues",
            statistics.len(),
            patterns.trends.len(),
            patterns.correlations.len(),
            patterns.data_quality_issues.len()
        );
        Profile {
            table,
            statistics,
            patterns,
        }
    }

    fn find(&self, profile: Profile) -> Findings {
        let (anomalies, insights) = rayon::join(
            || detect_anomalies(&profile.table, &self.config.anomaly_detection),
            || {
                synthesize_insights(
                    &profile.table,
                    &profile.statistics,
                    &profile.patterns,
                    &self.config,
                    &self.registry,
                )
            },
        );
        Findings {
            profile,
            anomalies,
            insights,
        }
    }

    fn report(&self, findings: Findings, filename: &str) -> AnalysisResult {
        let Findings {
            profile,
            anomalies,
            insights,
        } = findings;
        let Profile {
            table,
            statistics,
            patterns,
        } = profile;

        let recommendations =
            generate_recommendations(&insights, &patterns, &self.config, &self.registry);
        let predictive_insights = generate_predictive_insights(&table, &statistics, &patterns);
        let visualizations = prepare_visualizations(&table);

        let timestamp = Utc::now();
        let metadata = AnalysisMetadata {
            filename: filename.to_string(),
            total_rows: table.row_count() as u64,
            total_columns: table.column_count() as u64,
            numeric_columns_count: table.numeric_column_count() as u64,
            categorical_columns_count: table.categorical_column_count() as u64,
            columns_list: table.column_names(),
            department: self.config.department_label().to_string(),
            data_type: self.config.data_type.clone(),
            analysis_timestamp: timestamp,
            estimated_memory_mb: table.estimated_memory_mb(),
        };
        let executive_summary = generate_executive_summary(&metadata, &insights, &recommendations);

        AnalysisResult {
            format_version: REPORT_FORMAT_VERSION.to_string(),
            metadata,
            statistics,
            patterns,
            insights,
            recommendations,
            anomalies,
            predictive_insights,
            visualizations,
            executive_summary,
            agent_info: AgentInfo::current(timestamp),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnomalyConfig;

    fn analyzer(department: &str) -> CsvAnalyzer {
        CsvAnalyzer::new(AnalysisConfig::new().with_department(department)).unwrap()
    }

    #[test]
    fn test_analyzer_creation() {
        let analyzer = analyzer("finance");
        assert_eq!(analyzer.config().department, "finance");
        assert!(analyzer.registry().find("finance").is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = AnalysisConfig::new();
        config.anomaly_detection.n_estimators = 0;

        let err = CsvAnalyzer::new(config).unwrap_err();
        assert!(matches!(err, InsightError::Configuration { .. }));
    }

    #[test]
    fn test_analyze_bytes_metadata() {
        let csv = b"revenue,expense,region\n100,80,north\n120,85,south\n110,81,east\n";

        let result = analyzer("finance").analyze_bytes(csv, "q3.csv").unwrap();

        assert_eq!(result.format_version, REPORT_FORMAT_VERSION);
        assert_eq!(result.metadata.filename, "q3.csv");
        assert_eq!(result.metadata.total_rows, 3);
        assert_eq!(result.metadata.total_columns, 3);
        assert_eq!(result.metadata.numeric_columns_count, 2);
        assert_eq!(result.metadata.categorical_columns_count, 1);
        assert_eq!(result.metadata.columns_list, vec!["revenue", "expense", "region"]);
        assert_eq!(result.metadata.department, "finance");
        assert_eq!(
            result.agent_info.analysis_timestamp,
            result.metadata.analysis_timestamp
        );
        assert_eq!(result.visualizations.len(), 2);
    }

    #[test]
    fn test_loader_errors_propagate() {
        let err = analyzer("general")
            .analyze_bytes(b"a,b\n1,2\n", "data.txt")
            .unwrap_err();
        assert!(matches!(err, InsightError::UnsupportedFileType { .. }));

        let err = analyzer("general").analyze_bytes(b"", "empty.csv").unwrap_err();
        assert!(matches!(err, InsightError::EmptyTable { .. }));
    }

    #[test]
    fn test_blank_department_label() {
        let csv = b"x\n1\n2\n";
        let result = analyzer("  ").analyze_bytes(csv, "x.csv").unwrap();
        assert_eq!(result.metadata.department, "business");
    }

    #[test]
    fn test_anomaly_detection_can_be_disabled() {
        let mut csv = String::from("value\n");
        for i in 0..40 {
            csv.push_str(&format!("{}\n", 10 + i % 3));
        }
        csv.push_str("900\n");

        let config = AnalysisConfig::new()
            .with_anomaly_detection(AnomalyConfig::new().with_enabled(false));
        let analyzer = CsvAnalyzer::new(config).unwrap();
        let result = analyzer.analyze_bytes(csv.as_bytes(), "v.csv").unwrap();

        assert!(result.anomalies.is_empty());
    }
}
