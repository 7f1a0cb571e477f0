//! Department-specific heuristics.
//!
//! A heuristic inspects the column names of the table and the computed
//! statistics and contributes domain insights plus a fixed recommendation.
//! Heuristics are looked up by department key in a [`HeuristicRegistry`];
//! callers can register their own alongside the built-in finance and sales
//! rules.

use regex::Regex;

use crate::models::{Insight, InsightType, Level, Recommendation, StatisticsMap};
use crate::table::Table;
use crate::{InsightError, Result};

/// Domain rule set attached to one department.
pub trait DepartmentHeuristic: Send + Sync {
    /// Lower-case department key this heuristic applies to.
    fn department(&self) -> &str;

    /// Domain insights for the table; empty when the rule does not fire.
    fn insights(&self, table: &Table, statistics: &StatisticsMap) -> Vec<Insight>;

    /// Recommendations contributed whenever this department is selected.
    fn recommendations(&self) -> Vec<Recommendation>;
}

/// Case-insensitive substring matcher over column names.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    pattern: Regex,
}

impl KeywordMatcher {
    /// Builds a matcher for any of the given keywords.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the keyword list is empty or the
    /// pattern cannot be compiled.
    pub fn new(keywords: &[&str]) -> Result<Self> {
        if keywords.is_empty() {
            return Err(InsightError::configuration("keyword list must not be empty"));
        }
        let alternatives: Vec<String> = keywords.iter().map(|k| regex::escape(k)).collect();
        let pattern = Regex::new(&format!("(?i)(?:{})", alternatives.join("|")))
            .map_err(|e| InsightError::configuration(format!("invalid keyword pattern: {}", e)))?;
        Ok(Self { pattern })
    }

    /// Returns true if the name contains any keyword.
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    /// First column of the table, in table order, whose name matches.
    pub fn first_match<'a>(&self, table: &'a Table) -> Option<&'a str> {
        table
            .columns()
            .iter()
            .map(|c| c.name.as_str())
            .find(|name| self.matches(name))
    }
}

/// Profit margin heuristic over revenue-like and expense-like columns.
#[derive(Debug, Clone)]
pub struct FinanceHeuristic {
    revenue: KeywordMatcher,
    expense: KeywordMatcher,
}

impl FinanceHeuristic {
    pub const DEPARTMENT: &'static str = "finance";

    pub fn new() -> Result<Self> {
        Ok(Self {
            revenue: KeywordMatcher::new(&["revenue", "sales", "income"])?,
            expense: KeywordMatcher::new(&["expense", "cost", "spend"])?,
        })
    }
}

impl DepartmentHeuristic for FinanceHeuristic {
    fn department(&self) -> &str {
        Self::DEPARTMENT
    }

    fn insights(&self, table: &Table, statistics: &StatisticsMap) -> Vec<Insight> {
        let (Some(revenue), Some(expense)) =
            (self.revenue.first_match(table), self.expense.first_match(table))
        else {
            return Vec::new();
        };
        let (Some(revenue_stats), Some(expense_stats)) =
            (statistics.get(revenue), statistics.get(expense))
        else {
            tracing::debug!(
                "Finance columns '{}' / '{}' lack numeric statistics",
                revenue,
                expense
            );
            return Vec::new();
        };

        let average_revenue = revenue_stats.mean;
        if average_revenue <= 0.0 {
            return Vec::new();
        }
        let margin = (average_revenue - expense_stats.mean) / average_revenue * 100.0;

        let insight_type = if margin > 20.0 {
            InsightType::Success
        } else if margin > 10.0 {
            InsightType::Warning
        } else {
            InsightType::Error
        };

        vec![Insight::new(
            insight_type,
            "Financial Health",
            "Profitability Analysis",
            format!("Estimated profit margin: {:.1}%", margin),
            Level::High,
            85.0,
        )]
    }

    fn recommendations(&self) -> Vec<Recommendation> {
        vec![
            Recommendation::new(
                Level::High,
                "Financial Optimization",
                "Implement Advanced Financial Modeling",
                "Use predictive analytics for better financial planning",
            )
            .with_action_steps(&[
                "Develop time-series forecasting models",
                "Implement cost-benefit analysis framework",
                "Set up automated financial reporting",
            ])
            .with_expected_impact("20-30% improvement in financial planning accuracy")
            .with_implementation_effort("High"),
        ]
    }
}

/// Deal size heuristic over an amount-like column.
#[derive(Debug, Clone)]
pub struct SalesHeuristic {
    amount: KeywordMatcher,
}

impl SalesHeuristic {
    pub const DEPARTMENT: &'static str = "sales";

    pub fn new() -> Result<Self> {
        Ok(Self {
            amount: KeywordMatcher::new(&["amount", "value", "deal", "sale"])?,
        })
    }
}

impl DepartmentHeuristic for SalesHeuristic {
    fn department(&self) -> &str {
        Self::DEPARTMENT
    }

    fn insights(&self, table: &Table, statistics: &StatisticsMap) -> Vec<Insight> {
        let Some(stats) = self
            .amount
            .first_match(table)
            .and_then(|column| statistics.get(column))
        else {
            return Vec::new();
        };

        let insight_type = if stats.mean > stats.median {
            InsightType::Success
        } else {
            InsightType::Info
        };

        vec![Insight::new(
            insight_type,
            "Sales Performance",
            "Deal Size Analysis",
            format!(
                "Average deal size: ${} | Total: ${}",
                format_currency(stats.mean),
                format_currency(stats.sum)
            ),
            Level::High,
            90.0,
        )]
    }

    fn recommendations(&self) -> Vec<Recommendation> {
        vec![
            Recommendation::new(
                Level::High,
                "Sales Optimization",
                "Optimize Sales Pipeline Management",
                "Leverage data insights to improve sales efficiency",
            )
            .with_action_steps(&[
                "Implement lead scoring system",
                "Develop sales performance dashboards",
                "Create targeted sales training programs",
            ])
            .with_expected_impact("15-25% increase in conversion rates")
            .with_implementation_effort("Medium"),
        ]
    }
}

/// Formats an amount with thousands separators and two decimals.
fn format_currency(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && formatted.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, fraction)
}

/// Department heuristics keyed by lower-case department name.
pub struct HeuristicRegistry {
    heuristics: Vec<Box<dyn DepartmentHeuristic>>,
}

impl std::fmt::Debug for HeuristicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeuristicRegistry")
            .field("departments", &self.departments())
            .finish()
    }
}

impl HeuristicRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            heuristics: Vec::new(),
        }
    }

    /// Registry with the built-in finance and sales heuristics.
    pub fn with_defaults() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(FinanceHeuristic::new()?));
        registry.register(Box::new(SalesHeuristic::new()?));
        Ok(registry)
    }

    /// Adds a heuristic, replacing any registered for the same department.
    pub fn register(&mut self, heuristic: Box<dyn DepartmentHeuristic>) {
        let key = heuristic.department().trim().to_lowercase();
        self.heuristics
            .retain(|h| h.department().trim().to_lowercase() != key);
        self.heuristics.push(heuristic);
    }

    /// Looks up the heuristic for a department (case-insensitive).
    pub fn find(&self, department: &str) -> Option<&dyn DepartmentHeuristic> {
        let key = department.trim().to_lowercase();
        self.heuristics
            .iter()
            .find(|h| h.department().trim().to_lowercase() == key)
            .map(|h| h.as_ref())
    }

    /// Registered department keys in registration order.
    pub fn departments(&self) -> Vec<&str> {
        self.heuristics.iter().map(|h| h.department()).collect()
    }
}

impl Default for HeuristicRegistry {
    fn default() -> Self {
        Self::new()
    }
}
