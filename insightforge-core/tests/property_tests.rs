//! Property tests for the pipeline invariants.

use insightforge_core::analysis::{
    CorrelationMatrix, column_statistics, compute_statistics, histogram, sort_by_impact,
};
use insightforge_core::{
    AnalysisConfig, Column, CsvAnalyzer, Insight, InsightType, Level, Table,
};
use proptest::prelude::*;

fn finite_values(max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-1.0e6..1.0e6f64, 1..max_len)
}

fn level() -> impl Strategy<Value = Level> {
    prop_oneof![Just(Level::High), Just(Level::Medium), Just(Level::Low)]
}

proptest! {
    #[test]
    fn property_quartiles_are_ordered(values in finite_values(200)) {
        let stats = column_statistics(&values).unwrap();

        prop_assert!(stats.q1 <= stats.median);
        prop_assert!(stats.median <= stats.q3);
        prop_assert!(stats.min <= stats.q1);
        prop_assert!(stats.q3 <= stats.max);
        prop_assert!(stats.std >= 0.0);
    }

    #[test]
    fn property_outlier_percentage_in_range(values in finite_values(200)) {
        let stats = column_statistics(&values).unwrap();

        prop_assert!(stats.outlier_percentage >= 0.0);
        prop_assert!(stats.outlier_percentage <= 100.0);
        let expected = 100.0 * stats.outlier_count as f64 / stats.count as f64;
        prop_assert!((stats.outlier_percentage - expected).abs() < 1e-9);
    }

    #[test]
    fn property_histogram_preserves_count(values in finite_values(120)) {
        let bins = histogram(&values, values.len().min(10));

        let total: u64 = bins.iter().map(|b| b.count).sum();
        prop_assert_eq!(total, values.len() as u64);
        for pair in bins.windows(2) {
            prop_assert_eq!(pair[0].bin_end, pair[1].bin_start);
        }
    }

    #[test]
    fn property_correlation_matrix_is_symmetric(
        rows in prop::collection::vec(
            (
                prop::option::of(-1.0e3..1.0e3f64),
                prop::option::of(-1.0e3..1.0e3f64),
                prop::option::of(-1.0e3..1.0e3f64),
            ),
            2..60,
        )
    ) {
        let table = Table::new(vec![
            Column::numeric("a", rows.iter().map(|r| r.0).collect()),
            Column::numeric("b", rows.iter().map(|r| r.1).collect()),
            Column::numeric("c", rows.iter().map(|r| r.2).collect()),
        ])
        .unwrap();

        let matrix = CorrelationMatrix::from_table(&table);
        for x in matrix.columns() {
            for y in matrix.columns() {
                let forward = matrix.coefficient(x, y);
                prop_assert_eq!(forward, matrix.coefficient(y, x));
                if let Some(r) = forward {
                    prop_assert!((-1.0..=1.0).contains(&r));
                }
            }
        }
    }

    #[test]
    fn property_statistics_ignore_missing_cells(
        cells in prop::collection::vec(prop::option::of(-1.0e4..1.0e4f64), 1..80)
    ) {
        let present: Vec<f64> = cells.iter().filter_map(|c| *c).collect();
        let table = Table::new(vec![Column::numeric("v", cells)]).unwrap();

        let stats = compute_statistics(&table);
        match column_statistics(&present) {
            Some(expected) => prop_assert_eq!(stats.get("v"), Some(&expected)),
            None => prop_assert!(stats.is_empty()),
        }
    }

    #[test]
    fn property_sort_by_impact_is_stable(levels in prop::collection::vec(level(), 0..30)) {
        let mut insights: Vec<Insight> = levels
            .iter()
            .enumerate()
            .map(|(i, level)| {
                Insight::new(InsightType::Info, "c", i.to_string(), "", *level, 50.0)
            })
            .collect();

        sort_by_impact(&mut insights);

        for pair in insights.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(a.impact.rank() >= b.impact.rank());
            if a.impact == b.impact {
                let (ia, ib): (usize, usize) = (a.title.parse().unwrap(), b.title.parse().unwrap());
                prop_assert!(ia < ib);
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn property_report_lists_are_sorted(
        columns in prop::collection::vec(finite_values(40), 1..4),
        department in prop_oneof![Just("finance"), Just("sales"), Just("general")],
    ) {
        let rows = columns.iter().map(Vec::len).max().unwrap_or(0);
        let names = ["revenue", "cost", "deal_value"];

        let mut csv = names[..columns.len()].join(",");
        csv.push('\n');
        for row in 0..rows {
            let cells: Vec<String> = columns
                .iter()
                .map(|c| c.get(row).map(f64::to_string).unwrap_or_default())
                .collect();
            csv.push_str(&cells.join(","));
            csv.push('\n');
        }

        let analyzer = CsvAnalyzer::new(AnalysisConfig::new().with_department(department)).unwrap();
        let report = analyzer.analyze_bytes(csv.as_bytes(), "generated.csv").unwrap();

        for pair in report.insights.windows(2) {
            prop_assert!(pair[0].impact.rank() >= pair[1].impact.rank());
        }
        for pair in report.recommendations.windows(2) {
            prop_assert!(pair[0].priority.rank() >= pair[1].priority.rank());
        }
        for trend in &report.patterns.trends {
            prop_assert!(trend.confidence_percent <= 100.0);
        }
        for record in &report.patterns.correlations {
            prop_assert!(record.column_a != record.column_b);
        }
    }
}
