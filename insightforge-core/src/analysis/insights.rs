//! Insight synthesizer.
//!
//! Independent rules inspect the statistics and pattern report and append
//! insights when they fire. The final list is ordered by impact, keeping
//! detection order among equals.

use crate::config::AnalysisConfig;
use crate::models::{
    Insight, InsightType, Level, PatternReport, StatisticsMap, TrendDirection,
};
use crate::table::Table;

use super::departments::HeuristicRegistry;

/// Share of analyzable cells below which completeness is reported.
pub const COMPLETENESS_THRESHOLD: f64 = 0.8;
/// Outlier percentage above which a column is reported.
pub const OUTLIER_PERCENTAGE_THRESHOLD: f64 = 10.0;
/// |skewness| above which a column is reported.
pub const SKEWNESS_THRESHOLD: f64 = 1.0;
/// Trend confidence above which a trend becomes an insight.
pub const TREND_CONFIDENCE_THRESHOLD: f64 = 70.0;

pub const DATA_QUALITY_CATEGORY: &str = "Data Quality";
pub const DATA_DISTRIBUTION_CATEGORY: &str = "Data Distribution";
pub const TREND_ANALYSIS_CATEGORY: &str = "Trend Analysis";

/// Runs every rule and returns the insights sorted by impact.
pub fn synthesize_insights(
    table: &Table,
    statistics: &StatisticsMap,
    patterns: &PatternReport,
    config: &AnalysisConfig,
    registry: &HeuristicRegistry,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    insights.extend(completeness_insight(table, statistics));
    insights.extend(distribution_insights(table, statistics));
    insights.extend(trend_insights(patterns));

    match registry.find(&config.department_key()) {
        Some(heuristic) => insights.extend(heuristic.insights(table, statistics)),
        None => tracing::debug!(
            "No heuristics registered for department '{}'",
            config.department_key()
        ),
    }

    sort_by_impact(&mut insights);
    insights
}

/// Stable sort, highest impact first.
pub fn sort_by_impact(insights: &mut [Insight]) {
    insights.sort_by_key(|insight| std::cmp::Reverse(insight.impact.rank()));
}

/// Reports low completeness: analyzable numeric cells over all cells.
pub fn completeness_insight(table: &Table, statistics: &StatisticsMap) -> Option<Insight> {
    let total_cells = table.row_count() * table.column_count();
    if total_cells == 0 {
        return None;
    }

    let analyzable: u64 = statistics.values().map(|s| s.count).sum();
    let completeness = analyzable as f64 / total_cells as f64;
    if completeness >= COMPLETENESS_THRESHOLD {
        return None;
    }

    Some(Insight::new(
        InsightType::Warning,
        DATA_QUALITY_CATEGORY,
        "Low Data Completeness",
        format!(
            "Only {:.1}% of cells contain analyzable data",
            completeness * 100.0
        ),
        Level::High,
        85.0,
    ))
}

/// Outlier and skew rules, per column in table order.
pub fn distribution_insights(table: &Table, statistics: &StatisticsMap) -> Vec<Insight> {
    let mut insights = Vec::new();

    for column in table.numeric_columns() {
        let Some(stats) = statistics.get(&column.name) else {
            continue;
        };

        if stats.outlier_percentage > OUTLIER_PERCENTAGE_THRESHOLD {
            insights.push(Insight::new(
                InsightType::Warning,
                DATA_DISTRIBUTION_CATEGORY,
                "High Outlier Presence",
                format!(
                    "{} has {:.1}% outliers",
                    column.name, stats.outlier_percentage
                ),
                Level::Medium,
                90.0,
            ));
        }

        if stats.std > 0.0 && stats.skewness.abs() > SKEWNESS_THRESHOLD {
            let side = if stats.skewness > 0.0 { "right" } else { "left" };
            insights.push(Insight::new(
                InsightType::Info,
                DATA_DISTRIBUTION_CATEGORY,
                "Skewed Distribution",
                format!(
                    "{} shows {} skewness ({:.2})",
                    column.name, side, stats.skewness
                ),
                Level::Medium,
                80.0,
            ));
        }
    }

    insights
}

/// One insight per sufficiently confident trend.
pub fn trend_insights(patterns: &PatternReport) -> Vec<Insight> {
    patterns
        .trends
        .iter()
        .filter(|trend| trend.confidence_percent > TREND_CONFIDENCE_THRESHOLD)
        .map(|trend| {
            let (insight_type, label) = match trend.direction {
                TrendDirection::Increasing => (InsightType::Success, "Increasing"),
                TrendDirection::Decreasing => (InsightType::Warning, "Decreasing"),
            };
            Insight::new(
                insight_type,
                TREND_ANALYSIS_CATEGORY,
                format!("{} Trend Detected", label),
                format!(
                    "{} shows {} trend (confidence: {:.1}%)",
                    trend.column, trend.direction, trend.confidence_percent
                ),
                Level::High,
                trend.confidence_percent,
            )
        })
        .collect()
}
