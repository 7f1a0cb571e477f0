//! Pattern detector: linear trends, pairwise correlations and missing-value audit.
//!
//! All three detectors are deterministic functions of the table contents.
//! Degenerate inputs (constant columns, too few pairs) simply produce no
//! record.

use rayon::prelude::*;

use crate::models::{
    CorrelationDirection, CorrelationRecord, CorrelationStrength, DataQualityIssue,
    PatternReport, Severity, TrendDirection, TrendRecord,
};
use crate::table::{Column, Table};

use super::math::{linear_fit, pearson};

/// A column needs strictly more values than this to be fitted for a trend.
pub const MIN_TREND_VALUES: usize = 10;
/// |r| of value against row index above which a trend is reported.
pub const TREND_THRESHOLD: f64 = 0.5;
/// |coefficient| above which a correlation is reported.
pub const CORRELATION_THRESHOLD: f64 = 0.7;
/// |coefficient| above which a reported correlation counts as strong.
pub const STRONG_CORRELATION_THRESHOLD: f64 = 0.8;
/// Missing percentage above which a data quality issue is high severity.
pub const HIGH_MISSING_PERCENTAGE: f64 = 10.0;

/// Runs all pattern detectors over the table.
pub fn detect_patterns(table: &Table) -> PatternReport {
    PatternReport {
        trends: detect_trends(table),
        correlations: detect_correlations(table),
        data_quality_issues: audit_missing_values(table),
    }
}

/// Fits a trend for every eligible numeric column, in table order.
pub fn detect_trends(table: &Table) -> Vec<TrendRecord> {
    let columns: Vec<&Column> = table.numeric_columns().collect();

    columns
        .par_iter()
        .filter_map(|column| {
            let values = column.numeric_values()?;
            fit_trend(&column.name, &values)
        })
        .collect()
}

/// Fits the values (missing ones already removed) against their index.
///
/// Returns `None` when there are too few values, the series is constant, or
/// the fit is not significant.
pub fn fit_trend(column: &str, values: &[f64]) -> Option<TrendRecord> {
    if values.len() <= MIN_TREND_VALUES {
        return None;
    }

    let Some(fit) = linear_fit(values) else {
        tracing::debug!("Column '{}' has zero variance; no trend fitted", column);
        return None;
    };

    let strength = fit.r.abs();
    if strength <= TREND_THRESHOLD {
        return None;
    }

    let direction = if fit.slope > 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    Some(TrendRecord {
        column: column.to_string(),
        direction,
        strength,
        slope: fit.slope,
        confidence_percent: (strength * 100.0).min(100.0),
    })
}

/// Symmetric Pearson correlation matrix over the numeric columns.
///
/// Each pair uses the rows where both columns have a value. Undefined
/// coefficients (constant series, fewer than two shared rows) are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    columns: Vec<String>,
    coefficients: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// Computes the matrix for every numeric column of the table.
    pub fn from_table(table: &Table) -> Self {
        let columns: Vec<&Column> = table.numeric_columns().collect();
        let n = columns.len();

        let upper: Vec<Vec<Option<f64>>> = (0..n)
            .into_par_iter()
            .map(|i| {
                (i + 1..n)
                    .map(|j| pairwise_coefficient(columns[i], columns[j]))
                    .collect()
            })
            .collect();

        let mut coefficients = vec![vec![None; n]; n];
        for i in 0..n {
            coefficients[i][i] = pairwise_coefficient(columns[i], columns[i]).map(|_| 1.0);
            for (offset, value) in upper[i].iter().enumerate() {
                let j = i + 1 + offset;
                coefficients[i][j] = *value;
                coefficients[j][i] = *value;
            }
        }

        Self {
            columns: columns.iter().map(|c| c.name.clone()).collect(),
            coefficients,
        }
    }

    /// Column names in matrix order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Coefficient for a pair of columns, if both exist and it is defined.
    pub fn coefficient(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.coefficients[i][j]
    }

    /// Iterates unordered pairs (i < j) with a defined coefficient.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        let n = self.columns.len();
        (0..n).flat_map(move |i| {
            (i + 1..n).filter_map(move |j| {
                self.coefficients[i][j]
                    .map(|r| (self.columns[i].as_str(), self.columns[j].as_str(), r))
            })
        })
    }
}

fn pairwise_coefficient(a: &Column, b: &Column) -> Option<f64> {
    let (xs, ys) = (a.as_numeric()?, b.as_numeric()?);
    let (x, y): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();
    pearson(&x, &y)
}

/// Reports strongly correlated pairs of distinct numeric columns.
pub fn detect_correlations(table: &Table) -> Vec<CorrelationRecord> {
    if table.numeric_column_count() < 2 {
        return Vec::new();
    }

    CorrelationMatrix::from_table(table)
        .pairs()
        .filter(|(_, _, r)| r.abs() > CORRELATION_THRESHOLD)
        .map(|(a, b, r)| CorrelationRecord {
            column_a: a.to_string(),
            column_b: b.to_string(),
            coefficient: r,
            strength: if r.abs() > STRONG_CORRELATION_THRESHOLD {
                CorrelationStrength::Strong
            } else {
                CorrelationStrength::Moderate
            },
            direction: if r > 0.0 {
                CorrelationDirection::Positive
            } else {
                CorrelationDirection::Negative
            },
        })
        .collect()
}

/// Reports every column, numeric or categorical, that has missing cells.
pub fn audit_missing_values(table: &Table) -> Vec<DataQualityIssue> {
    let rows = table.row_count();
    if rows == 0 {
        return Vec::new();
    }

    table
        .columns()
        .iter()
        .filter_map(|column| {
            let missing_count = column.missing_count();
            if missing_count == 0 {
                return None;
            }
            let missing_percentage = 100.0 * missing_count as f64 / rows as f64;
            Some(DataQualityIssue {
                column: column.name.clone(),
                issue: "missing_values".to_string(),
                missing_count,
                missing_percentage,
                severity: if missing_percentage > HIGH_MISSING_PERCENTAGE {
                    Severity::High
                } else {
                    Severity::Medium
                },
            })
        })
        .collect()
}
