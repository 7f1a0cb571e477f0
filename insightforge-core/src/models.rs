//! Analysis result models.
//!
//! Every record here is derived in one pass from an immutable [`Table`] and
//! is never mutated after the pipeline hands it back. All models serialize to
//! the JSON layout consumed by report clients.
//!
//! [`Table`]: crate::table::Table

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Output format version written into every report.
pub const REPORT_FORMAT_VERSION: &str = "1.0";

/// Three-level ranking shared by insight impact and recommendation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    High,
    Medium,
    Low,
}

impl Level {
    /// Numeric rank used for ordering: high=3, medium=2, low=1.
    pub fn rank(self) -> u8 {
        match self {
            Level::High => 3,
            Level::Medium => 2,
            Level::Low => 1,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::High => write!(f, "high"),
            Level::Medium => write!(f, "medium"),
            Level::Low => write!(f, "low"),
        }
    }
}

/// Severity of a data quality issue or anomaly finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    /// Count of non-missing values
    pub count: u64,
    pub sum: f64,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    /// Sample variance (n - 1 denominator)
    pub variance: f64,
    /// Adjusted Fisher-Pearson skewness; 0.0 when undefined
    pub skewness: f64,
    /// Excess kurtosis (Fisher); 0.0 when undefined
    pub kurtosis: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub outlier_count: u64,
    /// 100 * outlier_count / count
    pub outlier_percentage: f64,
}

/// Column name to statistics, for numeric columns with at least one value.
pub type StatisticsMap = BTreeMap<String, ColumnStatistics>;

/// Direction of a fitted linear trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
        }
    }
}

/// A significant linear trend of a column against row order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub column: String,
    pub direction: TrendDirection,
    /// |r| of value against row index, in [0, 1]
    pub strength: f64,
    pub slope: f64,
    /// min(100, |r| * 100)
    pub confidence_percent: f64,
}

/// Strength bucket of a correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationStrength {
    Moderate,
    Strong,
}

/// Sign of a correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationDirection {
    Positive,
    Negative,
}

/// A strong pairwise correlation between two distinct numeric columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    pub column_a: String,
    pub column_b: String,
    pub coefficient: f64,
    pub strength: CorrelationStrength,
    pub direction: CorrelationDirection,
}

/// Missing-value finding for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQualityIssue {
    pub column: String,
    pub issue: String,
    pub missing_count: u64,
    pub missing_percentage: f64,
    pub severity: Severity,
}

/// Output of the pattern detector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub trends: Vec<TrendRecord>,
    pub correlations: Vec<CorrelationRecord>,
    pub data_quality_issues: Vec<DataQualityIssue>,
}

/// Unsupervised anomaly finding for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub column: String,
    pub anomaly_count: u64,
    pub anomaly_percentage: f64,
    pub severity: Severity,
    pub description: String,
    pub suggestion: String,
}

/// Tone of an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Warning,
    Info,
    Success,
    Error,
}

/// A human-readable finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub category: String,
    pub title: String,
    pub description: String,
    pub impact: Level,
    /// Confidence in [0, 100]
    pub confidence: f64,
}

impl Insight {
    /// Creates a new insight; confidence is clamped to [0, 100].
    pub fn new(
        insight_type: InsightType,
        category: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        impact: Level,
        confidence: f64,
    ) -> Self {
        Self {
            insight_type,
            category: category.into(),
            title: title.into(),
            description: description.into(),
            impact,
            confidence: confidence.clamp(0.0, 100.0),
        }
    }
}

/// A prioritized action item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub priority: Level,
    pub category: String,
    pub title: String,
    pub description: String,
    pub action_steps: Vec<String>,
    pub expected_impact: String,
    pub implementation_effort: String,
}

impl Recommendation {
    /// Creates a recommendation with no action steps.
    pub fn new(
        priority: Level,
        category: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            priority,
            category: category.into(),
            title: title.into(),
            description: description.into(),
            action_steps: Vec::new(),
            expected_impact: String::new(),
            implementation_effort: String::new(),
        }
    }

    /// Sets the ordered action steps.
    pub fn with_action_steps(mut self, steps: &[&str]) -> Self {
        self.action_steps = steps.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Sets the expected impact statement.
    pub fn with_expected_impact(mut self, expected_impact: impl Into<String>) -> Self {
        self.expected_impact = expected_impact.into();
        self
    }

    /// Sets the implementation effort label.
    pub fn with_implementation_effort(mut self, effort: impl Into<String>) -> Self {
        self.implementation_effort = effort.into();
        self
    }
}

/// Kind of forward-looking statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionKind {
    TrendProjection,
    RangePrediction,
}

/// A simple forward-looking statement derived from trends and distributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveInsight {
    #[serde(rename = "type")]
    pub kind: PredictionKind,
    pub metric: String,
    pub prediction: String,
    pub confidence: f64,
    pub basis: String,
    pub timeframe: String,
}

/// One equal-width histogram bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub bin_start: f64,
    pub bin_end: f64,
    pub count: u64,
    pub frequency_percent: f64,
}

/// Histogram data for client-side rendering of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSpec {
    pub chart_type: String,
    pub title: String,
    pub column: String,
    pub bins: Vec<HistogramBin>,
    pub x_key: String,
    pub y_key: String,
}

/// Executive summary of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub overview: String,
    pub key_takeaways: Vec<String>,
    pub business_impact: String,
    pub next_steps: Vec<String>,
}

/// Descriptive metadata about the analyzed dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub filename: String,
    pub total_rows: u64,
    pub total_columns: u64,
    pub numeric_columns_count: u64,
    pub categorical_columns_count: u64,
    pub columns_list: Vec<String>,
    pub department: String,
    pub data_type: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub estimated_memory_mb: f64,
}

/// Identifies the analysis engine that produced a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub version: String,
    pub analysis_timestamp: DateTime<Utc>,
}

/// Name reported in [`AgentInfo`].
pub const AGENT_NAME: &str = "InsightForge CSV Analysis Agent";

impl AgentInfo {
    /// Agent info for this build, stamped with the given time.
    pub fn current(analysis_timestamp: DateTime<Utc>) -> Self {
        Self {
            name: AGENT_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            analysis_timestamp,
        }
    }
}

/// Root aggregate returned for one upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub format_version: String,
    pub metadata: AnalysisMetadata,
    pub statistics: StatisticsMap,
    pub patterns: PatternReport,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<Recommendation>,
    pub anomalies: Vec<AnomalyRecord>,
    pub predictive_insights: Vec<PredictiveInsight>,
    pub visualizations: Vec<HistogramSpec>,
    pub executive_summary: ExecutiveSummary,
    pub agent_info: AgentInfo,
}
