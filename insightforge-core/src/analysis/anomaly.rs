//! Anomaly detection with a seeded isolation forest.
//!
//! Every numeric column with enough values gets its own forest, seeded from
//! the configured seed, so results are reproducible and independent of the
//! order in which columns are processed.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::AnomalyConfig;
use crate::models::{AnomalyRecord, Severity};
use crate::table::{Column, Table};

use super::math::{percentile_sorted, sorted_copy};

/// A column needs strictly more values than this to be scored.
pub const MIN_ANOMALY_VALUES: usize = 10;
/// Flagged fraction above which a finding is high severity.
pub const HIGH_ANOMALY_FRACTION: f64 = 0.1;

const EULER_GAMMA: f64 = 0.577_215_664_9;

/// Average path length of an unsuccessful search in a binary search tree of
/// `n` points; normalizes isolation depths.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf { size: usize },
    Split { threshold: f64, left: usize, right: usize },
}

/// One randomly grown isolation tree over a subsample.
#[derive(Debug, Clone)]
struct IsolationTree {
    nodes: Vec<Node>,
}

impl IsolationTree {
    fn grow(sample: Vec<f64>, height_limit: usize, rng: &mut StdRng) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.split(sample, 0, height_limit, rng);
        tree
    }

    fn split(
        &mut self,
        values: Vec<f64>,
        depth: usize,
        height_limit: usize,
        rng: &mut StdRng,
    ) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf { size: values.len() });

        if depth >= height_limit || values.len() <= 1 {
            return id;
        }

        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if max <= min || !(max - min).is_finite() {
            return id;
        }

        let threshold = rng.random_range(min..max);
        let (left_values, right_values): (Vec<f64>, Vec<f64>) =
            values.into_iter().partition(|&v| v <= threshold);

        let left = self.split(left_values, depth + 1, height_limit, rng);
        let right = self.split(right_values, depth + 1, height_limit, rng);
        self.nodes[id] = Node::Split { threshold, left, right };
        id
    }

    /// Depth at which `value` is isolated, adjusted for unsplit leaves.
    fn path_length(&self, value: f64) -> f64 {
        let mut node = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[node] {
                Node::Leaf { size } => return depth + average_path_length(*size),
                Node::Split { threshold, left, right } => {
                    node = if value <= *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

/// Isolation forest over one-dimensional data.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationForest {
    pub n_estimators: usize,
    pub max_samples: usize,
    /// Expected fraction of anomalous points
    pub contamination: f64,
    pub seed: u64,
}

impl Default for IsolationForest {
    fn default() -> Self {
        Self::from_config(&AnomalyConfig::default())
    }
}

impl IsolationForest {
    /// Builds a forest with the configured ensemble parameters.
    pub fn from_config(config: &AnomalyConfig) -> Self {
        Self {
            n_estimators: config.n_estimators.max(1),
            max_samples: config.max_samples.max(2),
            contamination: config.contamination,
            seed: config.seed,
        }
    }

    /// Anomaly score in (0, 1] for every value; higher means more isolated.
    ///
    /// Returns all zeros when there are fewer than two values.
    pub fn score_samples(&self, values: &[f64]) -> Vec<f64> {
        let n = values.len();
        if n < 2 {
            return vec![0.0; n];
        }

        let sample_size = self.max_samples.min(n);
        let height_limit = (sample_size as f64).log2().ceil() as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let trees: Vec<IsolationTree> = (0..self.n_estimators)
            .map(|_| {
                let sample = index::sample(&mut rng, n, sample_size)
                    .iter()
                    .map(|i| values[i])
                    .collect();
                IsolationTree::grow(sample, height_limit, &mut rng)
            })
            .collect();

        let normalizer = average_path_length(sample_size);
        values
            .iter()
            .map(|&value| {
                let mean_depth = trees.iter().map(|t| t.path_length(value)).sum::<f64>()
                    / trees.len() as f64;
                2f64.powf(-mean_depth / normalizer)
            })
            .collect()
    }

    /// Flags the points whose score exceeds the contamination percentile.
    pub fn fit_predict(&self, values: &[f64]) -> Vec<bool> {
        if values.len() < 2 {
            return vec![false; values.len()];
        }
        let scores = self.score_samples(values);
        let offset = percentile_sorted(&sorted_copy(&scores), 1.0 - self.contamination);
        scores.iter().map(|&s| s > offset).collect()
    }
}

/// Scores every eligible numeric column and reports the ones with flagged points.
///
/// Returns nothing when detection is disabled.
pub fn detect_anomalies(table: &Table, config: &AnomalyConfig) -> Vec<AnomalyRecord> {
    if !config.enabled {
        tracing::debug!("Anomaly detection disabled");
        return Vec::new();
    }

    let forest = IsolationForest::from_config(config);
    let columns: Vec<&Column> = table.numeric_columns().collect();

    columns
        .par_iter()
        .filter_map(|column| {
            let values = column.numeric_values()?;
            column_anomalies(&forest, &column.name, &values)
        })
        .collect()
}

fn column_anomalies(
    forest: &IsolationForest,
    column: &str,
    values: &[f64],
) -> Option<AnomalyRecord> {
    if values.len() <= MIN_ANOMALY_VALUES {
        tracing::debug!(
            "Column '{}' has {} values; too few for anomaly detection",
            column,
            values.len()
        );
        return None;
    }

    let anomaly_count = forest.fit_predict(values).into_iter().filter(|&f| f).count();
    if anomaly_count == 0 {
        return None;
    }

    let fraction = anomaly_count as f64 / values.len() as f64;
    Some(AnomalyRecord {
        column: column.to_string(),
        anomaly_count: anomaly_count as u64,
        anomaly_percentage: fraction * 100.0,
        severity: if fraction > HIGH_ANOMALY_FRACTION {
            Severity::High
        } else {
            Severity::Medium
        },
        description: format!(
            "Detected {} potential anomalies using machine learning",
            anomaly_count
        ),
        suggestion: "Review these data points for potential errors or special cases".to_string(),
    })
}
