//! End-to-end pipeline scenarios.
//!
//! Each test feeds raw file bytes through `CsvAnalyzer` and checks the
//! assembled report, the way an upload handler would consume it.

use insightforge_core::models::{CorrelationDirection, CorrelationStrength, TrendDirection};
use insightforge_core::{
    AnalysisConfig, AnalysisResult, CsvAnalyzer, InsightError, InsightType, Level,
    initialize_report_validator, validate_report_output,
};

fn analyze(csv: &str, department: &str) -> AnalysisResult {
    CsvAnalyzer::new(AnalysisConfig::new().with_department(department))
        .unwrap()
        .analyze_bytes(csv.as_bytes(), "upload.csv")
        .unwrap()
}

fn single_column(name: &str, values: &[f64]) -> String {
    let mut csv = format!("{}\n", name);
    for value in values {
        csv.push_str(&format!("{}\n", value));
    }
    csv
}

#[test]
fn test_scenario_outlier_column() {
    let report = analyze(&single_column("x", &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]), "general");

    let stats = &report.statistics["x"];
    assert_eq!(stats.outlier_count, 1);
    assert!((stats.outlier_percentage - 16.666_666_666_666_668).abs() < 1e-9);

    assert!(
        report
            .insights
            .iter()
            .any(|i| i.category == "Data Distribution" && i.impact == Level::Medium)
    );
}

#[test]
fn test_scenario_strong_positive_correlation() {
    let mut csv = String::from("a,b\n");
    for i in 0..30 {
        let a = f64::from(i);
        let noise = if i % 2 == 0 { 0.3 } else { -0.3 };
        csv.push_str(&format!("{},{}\n", a, 2.0 * a + noise));
    }

    let report = analyze(&csv, "general");

    assert_eq!(report.patterns.correlations.len(), 1);
    let record = &report.patterns.correlations[0];
    assert_eq!(record.column_a, "a");
    assert_eq!(record.column_b, "b");
    assert!(record.coefficient > 0.9);
    assert_eq!(record.direction, CorrelationDirection::Positive);
    assert_eq!(record.strength, CorrelationStrength::Strong);

    assert!(
        report
            .recommendations
            .iter()
            .any(|r| r.title == "Leverage Correlation Insights")
    );
}

#[test]
fn test_scenario_finance_profit_margin() {
    let csv = "revenue,expense\n100,80\n110,82\n120,84\n";

    let report = analyze(csv, "finance");

    let insight = report
        .insights
        .iter()
        .find(|i| i.category == "Financial Health")
        .unwrap();
    assert_eq!(insight.insight_type, InsightType::Success);
    assert_eq!(insight.title, "Profitability Analysis");

    let expected = (110.0 - 82.0) / 110.0 * 100.0;
    assert!(insight.description.contains(&format!("{:.1}%", expected)));
    assert!(
        report
            .recommendations
            .iter()
            .any(|r| r.title == "Implement Advanced Financial Modeling")
    );
}

#[test]
fn test_scenario_empty_file() {
    let analyzer = CsvAnalyzer::new(AnalysisConfig::default()).unwrap();

    let err = analyzer.analyze_bytes(b"", "empty.csv").unwrap_err();
    assert!(matches!(err, InsightError::EmptyTable { .. }));

    let err = analyzer.analyze_bytes(b"", "empty.xlsx").unwrap_err();
    assert!(matches!(err, InsightError::EmptyTable { .. }));

    let err = analyzer.analyze_bytes(b"a,b\n,\n", "blank_rows.csv").unwrap_err();
    assert!(matches!(err, InsightError::EmptyTable { .. }));
}

#[test]
fn test_scenario_constant_column() {
    let report = analyze(&single_column("flat", &[5.0; 11]), "general");

    let stats = &report.statistics["flat"];
    assert_eq!(stats.std, 0.0);
    assert_eq!(stats.skewness, 0.0);
    assert!(!report.insights.iter().any(|i| i.title == "Skewed Distribution"));
    assert!(report.patterns.trends.is_empty());
    assert!(report.anomalies.is_empty());
}

#[test]
fn test_scenario_unsupported_extension() {
    let analyzer = CsvAnalyzer::new(AnalysisConfig::default()).unwrap();

    match analyzer.analyze_bytes(b"a\n1\n", "report.pdf").unwrap_err() {
        InsightError::UnsupportedFileType { filename, supported } => {
            assert_eq!(filename, "report.pdf");
            assert_eq!(supported, vec![".csv", ".xlsx", ".xls"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_integration_round_trip_shape() {
    let mut csv = String::from("id,amount,region,score\n");
    for i in 0..25 {
        csv.push_str(&format!("{},{}.5,zone{},{}\n", i, i * 3, i % 4, 100 - i));
    }

    let report = analyze(&csv, "general");

    assert_eq!(report.metadata.total_rows, 25);
    assert_eq!(report.metadata.total_columns, 4);
    assert_eq!(report.metadata.numeric_columns_count, 3);
    assert_eq!(report.metadata.categorical_columns_count, 1);
    assert_eq!(
        report.metadata.columns_list,
        vec!["id", "amount", "region", "score"]
    );
    assert_eq!(report.statistics.len(), 3);
}

#[test]
fn test_integration_boundary_ten_values() {
    let mut values: Vec<f64> = (1..=9).map(f64::from).collect();
    values.push(1000.0);

    let report = analyze(&single_column("short", &values), "general");

    assert!(report.patterns.trends.is_empty());
    assert!(report.anomalies.is_empty());
}

#[test]
fn test_integration_eleven_values_get_a_trend() {
    let values: Vec<f64> = (1..=11).map(f64::from).collect();

    let report = analyze(&single_column("units", &values), "general");

    assert_eq!(report.patterns.trends.len(), 1);
    assert_eq!(report.patterns.trends[0].direction, TrendDirection::Increasing);
    assert!(
        report
            .predictive_insights
            .iter()
            .any(|p| p.metric == "units")
    );
}

#[test]
fn test_integration_idempotent() {
    let mut csv = String::from("revenue,cost,region\n");
    for i in 0..60 {
        let spike = if i == 42 { 5000 } else { 0 };
        csv.push_str(&format!(
            "{},{},r{}\n",
            200 + i * 7 + (i * 13) % 11 + spike,
            150 + (i * 17) % 23,
            i % 3
        ));
    }

    let first = analyze(&csv, "finance");
    let second = analyze(&csv, "finance");

    assert_eq!(first.statistics, second.statistics);
    assert_eq!(first.patterns, second.patterns);
    assert_eq!(first.anomalies, second.anomalies);
    assert_eq!(first.insights, second.insights);
    assert_eq!(first.recommendations, second.recommendations);
    assert_eq!(first.visualizations, second.visualizations);
    assert!(!first.anomalies.is_empty());
}

#[test]
fn test_integration_report_passes_validation() {
    initialize_report_validator().unwrap();

    let mut csv = String::from("deal_amount,stage,notes\n");
    for i in 0..35 {
        let notes = if i % 4 == 0 { "" } else { "follow-up" };
        csv.push_str(&format!("{},{},{}\n", 1000 + i * 150, i % 5, notes));
    }

    let report = analyze(&csv, "sales");
    let value = serde_json::to_value(&report).unwrap();

    validate_report_output(&value).unwrap();
    assert!(
        report
            .insights
            .iter()
            .any(|i| i.title == "Deal Size Analysis")
    );
}

#[test]
fn test_integration_headerless_input() {
    let config = AnalysisConfig::new().with_headers(false);
    let analyzer = CsvAnalyzer::new(config).unwrap();

    let report = analyzer
        .analyze_bytes(b"1,a\n2,b\n3,c\n", "raw.csv")
        .unwrap();

    assert_eq!(report.metadata.total_rows, 3);
    assert_eq!(report.metadata.columns_list, vec!["column_1", "column_2"]);
}

#[test]
fn test_scenario_constant_column_with_inexact_mean() {
    let report = analyze(&single_column("flat", &[1e10 + 0.3; 11]), "general");

    let stats = &report.statistics["flat"];
    assert_eq!(stats.std, 0.0);
    assert_eq!(stats.skewness, 0.0);
    assert!(!report.insights.iter().any(|i| i.title == "Skewed Distribution"));
    assert!(report.patterns.trends.is_empty());
    assert!(report.anomalies.is_empty());
}

#[test]
fn test_integration_huge_values_produce_valid_report() {
    initialize_report_validator().unwrap();

    let values: Vec<f64> = (1..=12).map(|i| f64::from(i) * 1e160).collect();
    let report = analyze(&single_column("exposure", &values), "finance");

    let stats = &report.statistics["exposure"];
    assert!(stats.std.is_finite());
    assert!(stats.variance.is_finite());
    assert!(report.visualizations[0].bins.iter().all(|b| b.bin_end.is_finite()));

    let value = serde_json::to_value(&report).unwrap();
    validate_report_output(&value).unwrap();
}
