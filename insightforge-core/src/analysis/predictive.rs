//! Forward-looking statements derived from trends and value distributions.

use crate::models::{PatternReport, PredictionKind, PredictiveInsight, StatisticsMap};
use crate::table::Table;

use super::insights::TREND_CONFIDENCE_THRESHOLD;

/// A column needs strictly more values than this for a range prediction.
pub const MIN_RANGE_PREDICTION_VALUES: u64 = 30;

const RANGE_PREDICTION_CONFIDENCE: f64 = 75.0;

/// Trend projections first, then one range prediction per eligible column in
/// table order.
pub fn generate_predictive_insights(
    table: &Table,
    statistics: &StatisticsMap,
    patterns: &PatternReport,
) -> Vec<PredictiveInsight> {
    let projections = patterns
        .trends
        .iter()
        .filter(|trend| trend.confidence_percent > TREND_CONFIDENCE_THRESHOLD)
        .map(|trend| PredictiveInsight {
            kind: PredictionKind::TrendProjection,
            metric: trend.column.clone(),
            prediction: format!(
                "Expected to continue {} trend in next period",
                trend.direction
            ),
            confidence: trend.confidence_percent,
            basis: "Historical trend analysis with linear regression".to_string(),
            timeframe: "Short-term (next reporting period)".to_string(),
        });

    let ranges = table.numeric_columns().filter_map(|column| {
        let stats = statistics.get(&column.name)?;
        if stats.count <= MIN_RANGE_PREDICTION_VALUES {
            return None;
        }
        Some(PredictiveInsight {
            kind: PredictionKind::RangePrediction,
            metric: column.name.clone(),
            prediction: format!(
                "Expected range: {:.2} to {:.2}",
                stats.mean - stats.std,
                stats.mean + stats.std
            ),
            confidence: RANGE_PREDICTION_CONFIDENCE,
            basis: "Statistical distribution analysis".to_string(),
            timeframe: "Immediate future based on current distribution".to_string(),
        })
    });

    projections.chain(ranges).collect()
}
