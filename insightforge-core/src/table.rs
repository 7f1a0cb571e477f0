//! In-memory typed table produced by the loader.
//!
//! Columns are either numeric or categorical. Missing cells are kept as
//! `None` so that every column has the same row count; statistics operate on
//! the non-missing values only.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::{InsightError, Result};

/// Values held by a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum ColumnData {
    /// Floating-point values; `None` marks a missing cell
    Numeric(Vec<Option<f64>>),
    /// Free-text values; `None` marks a missing cell
    Categorical(Vec<Option<String>>),
}

/// A named column of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    /// Creates a numeric column.
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    /// Creates a categorical column.
    pub fn categorical(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Categorical(values),
        }
    }

    /// Number of cells, missing ones included.
    pub fn len(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Categorical(values) => values.len(),
        }
    }

    /// Returns true if the column has no cells at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true for numeric columns.
    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    /// Returns the raw numeric cells, or `None` for categorical columns.
    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match &self.data {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Categorical(_) => None,
        }
    }

    /// Non-missing numeric values in row order, or `None` for categorical columns.
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        self.as_numeric()
            .map(|values| values.iter().filter_map(|v| *v).collect())
    }

    /// Returns true if the cell at `row` is missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match &self.data {
            ColumnData::Numeric(values) => matches!(values.get(row), Some(None)),
            ColumnData::Categorical(values) => matches!(values.get(row), Some(None)),
        }
    }

    /// Count of missing cells.
    pub fn missing_count(&self) -> u64 {
        let missing = match &self.data {
            ColumnData::Numeric(values) => values.iter().filter(|v| v.is_none()).count(),
            ColumnData::Categorical(values) => values.iter().filter(|v| v.is_none()).count(),
        };
        missing as u64
    }

    /// Count of present cells.
    pub fn non_missing_count(&self) -> u64 {
        (self.len() as u64).saturating_sub(self.missing_count())
    }

    fn estimated_bytes(&self) -> usize {
        match &self.data {
            ColumnData::Numeric(values) => values.len() * std::mem::size_of::<Option<f64>>(),
            ColumnData::Categorical(values) => values
                .iter()
                .map(|v| {
                    std::mem::size_of::<Option<String>>() + v.as_ref().map_or(0, String::len)
                })
                .sum(),
        }
    }
}

/// Ordered collection of equally sized, uniquely named columns.
///
/// Deserialization goes through [`Table::new`]; a serialized `row_count` is
/// recomputed rather than trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableColumns")]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

#[derive(Deserialize)]
struct TableColumns {
    columns: Vec<Column>,
}

impl TryFrom<TableColumns> for Table {
    type Error = InsightError;

    fn try_from(raw: TableColumns) -> Result<Self> {
        Table::new(raw.columns)
    }
}

impl Table {
    /// Creates a table, enforcing equal column lengths and unique names.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map_or(0, Column::len);

        let mut seen = HashSet::with_capacity(columns.len());
        for column in &columns {
            if column.len() != row_count {
                return Err(InsightError::malformed(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.len(),
                    row_count
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(InsightError::malformed(format!(
                    "duplicate column name '{}'",
                    column.name
                )));
            }
        }

        Ok(Self { columns, row_count })
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns true when the table has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.row_count == 0 || self.columns.is_empty()
    }

    /// All columns in table order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Numeric columns in table order.
    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// Count of numeric columns.
    pub fn numeric_column_count(&self) -> usize {
        self.numeric_columns().count()
    }

    /// Count of categorical columns.
    pub fn categorical_column_count(&self) -> usize {
        self.column_count() - self.numeric_column_count()
    }

    /// Rough in-memory footprint of the cell data in megabytes.
    pub fn estimated_memory_mb(&self) -> f64 {
        let bytes: usize = self.columns.iter().map(Column::estimated_bytes).sum();
        bytes as f64 / (1024.0 * 1024.0)
    }
}
