//! Recommendation and executive summary generation.

use crate::config::AnalysisConfig;
use crate::models::{
    AnalysisMetadata, ExecutiveSummary, Insight, Level, PatternReport, Recommendation,
};

use super::departments::HeuristicRegistry;
use super::insights::DATA_QUALITY_CATEGORY;

const MAX_KEY_TAKEAWAYS: usize = 3;
const MAX_NEXT_STEPS: usize = 2;

/// Builds recommendations from the insights, patterns and department.
///
/// The result is sorted by priority, highest first, keeping trigger order
/// among equals.
pub fn generate_recommendations(
    insights: &[Insight],
    patterns: &PatternReport,
    config: &AnalysisConfig,
    registry: &HeuristicRegistry,
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();

    if insights.iter().any(|i| i.category == DATA_QUALITY_CATEGORY) {
        recommendations.push(
            Recommendation::new(
                Level::High,
                "Data Management",
                "Improve Data Quality",
                "Address data completeness and consistency issues",
            )
            .with_action_steps(&[
                "Implement data validation rules",
                "Set up automated data cleaning processes",
                "Establish data quality monitoring",
            ])
            .with_expected_impact("High improvement in analysis reliability")
            .with_implementation_effort("Medium"),
        );
    }

    if let Some(heuristic) = registry.find(&config.department_key()) {
        recommendations.extend(heuristic.recommendations());
    }

    if !patterns.correlations.is_empty() {
        recommendations.push(
            Recommendation::new(
                Level::Medium,
                "Analytics Enhancement",
                "Leverage Correlation Insights",
                "Use identified correlations for predictive modeling",
            )
            .with_action_steps(&[
                "Develop regression models for key relationships",
                "Create business rules based on correlation patterns",
                "Implement automated alerting for correlation changes",
            ])
            .with_expected_impact("Improved decision-making accuracy")
            .with_implementation_effort("Medium"),
        );
    }

    recommendations.sort_by_key(|r| std::cmp::Reverse(r.priority.rank()));
    recommendations
}

/// Condenses the findings into an executive summary.
pub fn generate_executive_summary(
    metadata: &AnalysisMetadata,
    insights: &[Insight],
    recommendations: &[Recommendation],
) -> ExecutiveSummary {
    let high_priority: Vec<&Recommendation> = recommendations
        .iter()
        .filter(|r| r.priority == Level::High)
        .collect();

    ExecutiveSummary {
        overview: format!(
            "This analysis of {} reveals {} key insights across {} records. \
             The data shows significant opportunities for {} optimization.",
            metadata.filename,
            insights.len(),
            metadata.total_rows,
            metadata.department
        ),
        key_takeaways: insights
            .iter()
            .filter(|i| i.impact == Level::High)
            .take(MAX_KEY_TAKEAWAYS)
            .map(|i| i.description.clone())
            .collect(),
        business_impact: format!(
            "Implementing the {} high-priority recommendations could drive substantial value \
             through data-informed decision making in the {} department.",
            high_priority.len(),
            metadata.department
        ),
        next_steps: high_priority
            .iter()
            .take(MAX_NEXT_STEPS)
            .map(|r| r.title.clone())
            .collect(),
    }
}
