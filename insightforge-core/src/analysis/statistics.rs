//! Descriptive statistics engine.
//!
//! Computes per-column summary statistics over the non-missing values of
//! every numeric column. Columns without any value are omitted.

use rayon::prelude::*;

use crate::models::{ColumnStatistics, StatisticsMap};
use crate::table::Table;

use super::math::{percentile_sorted, sorted_copy};

/// IQR multiplier for the outlier fences.
pub const IQR_FENCE_MULTIPLIER: f64 = 1.5;

/// Computes statistics for every numeric column with at least one value.
///
/// Columns are processed in parallel; the map is keyed by column name.
pub fn compute_statistics(table: &Table) -> StatisticsMap {
    let columns: Vec<_> = table.numeric_columns().collect();

    columns
        .par_iter()
        .filter_map(|column| {
            let values = column.numeric_values()?;
            match column_statistics(&values) {
                Some(stats) => Some((column.name.clone(), stats)),
                None => {
                    tracing::debug!("Column '{}' has no values; statistics skipped", column.name);
                    None
                }
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Computes statistics for a set of values, or `None` if it is empty.
pub fn column_statistics(values: &[f64]) -> Option<ColumnStatistics> {
    if values.is_empty() {
        return None;
    }
    let n = values.len();
    let sorted = sorted_copy(values);
    let min = sorted[0];
    let max = sorted[n - 1];
    let moments = Moments::of(values, min, max);

    let q1 = percentile_sorted(&sorted, 0.25);
    let median = percentile_sorted(&sorted, 0.5);
    let q3 = percentile_sorted(&sorted, 0.75);
    let iqr = saturate(q3 - q1);

    let lower_fence = q1 - IQR_FENCE_MULTIPLIER * iqr;
    let upper_fence = q3 + IQR_FENCE_MULTIPLIER * iqr;
    let outlier_count = values
        .iter()
        .filter(|&&v| v < lower_fence || v > upper_fence)
        .count() as u64;

    Some(ColumnStatistics {
        count: n as u64,
        sum: moments.sum,
        mean: moments.mean,
        median,
        std: moments.std,
        min,
        max,
        range: saturate(max - min),
        variance: moments.variance,
        skewness: moments.skewness,
        kurtosis: moments.kurtosis,
        q1,
        q3,
        iqr,
        outlier_count,
        outlier_percentage: 100.0 * outlier_count as f64 / n as f64,
    })
}

/// Clamps an overflowed result to the largest finite value of its sign.
fn saturate(value: f64) -> f64 {
    value.clamp(f64::MIN, f64::MAX)
}

/// Moment-based statistics of a non-empty value set.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Moments {
    sum: f64,
    mean: f64,
    variance: f64,
    std: f64,
    skewness: f64,
    kurtosis: f64,
}

impl Moments {
    /// Computes the moments given the extremes of `values`.
    ///
    /// Powers of deviations are taken on values divided by the largest
    /// magnitude, so they stay finite for any finite input. Spread that is
    /// indistinguishable from the rounding error of the mean counts as none.
    fn of(values: &[f64], min: f64, max: f64) -> Self {
        let n = values.len() as f64;
        let direct_sum: f64 = values.iter().sum();

        if min == max {
            return Self {
                sum: saturate(direct_sum),
                mean: min,
                variance: 0.0,
                std: 0.0,
                skewness: 0.0,
                kurtosis: 0.0,
            };
        }

        let scale = min.abs().max(max.abs());
        let scaled: Vec<f64> = values.iter().map(|v| v / scale).collect();
        let scaled_mean = scaled.iter().sum::<f64>() / n;
        let deviations: Vec<f64> = scaled.iter().map(|v| v - scaled_mean).collect();
        let m2: f64 = deviations.iter().map(|d| d * d).sum();

        let (sum, mean) = if direct_sum.is_finite() {
            (direct_sum, direct_sum / n)
        } else {
            (saturate(scaled_mean * n * scale), scaled_mean * scale)
        };

        let noise_floor = n * (f64::EPSILON * scaled_mean.abs()).powi(2);
        if m2 <= noise_floor || values.len() < 2 {
            return Self {
                sum,
                mean,
                variance: 0.0,
                std: 0.0,
                skewness: 0.0,
                kurtosis: 0.0,
            };
        }

        let scaled_variance = m2 / (n - 1.0);
        Self {
            sum,
            mean,
            variance: saturate(scaled_variance * scale * scale),
            std: saturate(scaled_variance.sqrt() * scale),
            skewness: skewness(&deviations, m2),
            kurtosis: kurtosis(&deviations, m2),
        }
    }
}

/// Adjusted Fisher-Pearson sample skewness (G1) from deviations about the
/// mean and their sum of squares `m2 > 0`.
///
/// Requires at least three values; otherwise 0.0.
fn skewness(deviations: &[f64], m2: f64) -> f64 {
    let n = deviations.len() as f64;
    if deviations.len() < 3 {
        return 0.0;
    }
    let m3: f64 = deviations.iter().map(|d| d * d * d).sum();
    let result = (n * (n - 1.0).sqrt() / (n - 2.0)) * (m3 / m2.powf(1.5));
    if result.is_finite() { result } else { 0.0 }
}

/// Bias-corrected sample excess kurtosis (G2).
///
/// Requires at least four values; otherwise 0.0.
fn kurtosis(deviations: &[f64], m2: f64) -> f64 {
    let n = deviations.len() as f64;
    if deviations.len() < 4 {
        return 0.0;
    }
    let m4: f64 = deviations.iter().map(|d| d.powi(4)).sum();
    let adjustment = 3.0 * (n - 1.0).powi(2) / ((n - 2.0) * (n - 3.0));
    let numerator = n * (n + 1.0) * (n - 1.0) * m4;
    let denominator = (n - 2.0) * (n - 3.0) * m2 * m2;
    let result = numerator / denominator - adjustment;
    if result.is_finite() { result } else { 0.0 }
}
