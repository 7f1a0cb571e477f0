//! Histogram preparation for client-side rendering.

use rayon::prelude::*;

use crate::models::{HistogramBin, HistogramSpec};
use crate::table::{Column, Table};

/// Upper bound on the number of bins per histogram.
pub const MAX_BINS: usize = 10;

/// One histogram per numeric column with at least one value, in table order.
pub fn prepare_visualizations(table: &Table) -> Vec<HistogramSpec> {
    let columns: Vec<&Column> = table.numeric_columns().collect();

    columns
        .par_iter()
        .filter_map(|column| {
            let values = column.numeric_values()?;
            if values.is_empty() {
                return None;
            }
            Some(HistogramSpec {
                chart_type: "histogram".to_string(),
                title: format!("Distribution of {}", column.name),
                column: column.name.clone(),
                bins: histogram(&values, MAX_BINS.min(values.len())),
                x_key: "bin_start".to_string(),
                y_key: "count".to_string(),
            })
        })
        .collect()
}

/// Buckets values into `bins` equal-width bins spanning [min, max].
///
/// A constant series is centered in [value - 0.5, value + 0.5]. Every bin is
/// half-open except the last, which also includes its upper edge.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let edges = bin_edges(lo, hi, bins);
    // Halving keeps the span finite for values near the f64 limits
    let half_span = hi / 2.0 - lo / 2.0;

    let mut counts = vec![0u64; bins];
    for &value in values {
        let mut index = if half_span > 0.0 {
            let position = (value / 2.0 - lo / 2.0) / half_span * bins as f64;
            (position as usize).min(bins - 1)
        } else {
            0
        };
        // Correct for rounding at the edges
        if index > 0 && value < edges[index] {
            index -= 1;
        } else if index + 1 < bins && value >= edges[index + 1] && edges[index + 1] > edges[index] {
            index += 1;
        }
        counts[index] += 1;
    }

    let total = values.len() as f64;
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            bin_start: edges[i],
            bin_end: edges[i + 1],
            count,
            frequency_percent: 100.0 * count as f64 / total,
        })
        .collect()
}

/// Equal-width edges from `lo` to `hi`, the last edge exactly `hi`.
fn bin_edges(lo: f64, hi: f64, bins: usize) -> Vec<f64> {
    let step = (hi - lo) / bins as f64;
    (0..=bins)
        .map(|i| {
            if i == bins {
                hi
            } else if step.is_finite() {
                lo + i as f64 * step
            } else {
                let t = i as f64 / bins as f64;
                lo * (1.0 - t) + hi * t
            }
        })
        .collect()
}
