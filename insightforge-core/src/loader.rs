//! Tabular loader.
//!
//! Turns uploaded bytes into a typed [`Table`]. Delimited text is read with
//! the `csv` crate, spreadsheets with `calamine` (first worksheet only).
//!
//! Cleaning rules applied after parsing:
//! - rows that are missing in every column are dropped
//! - columns whose header is blank or auto-generated (`Unnamed: N`) are dropped
//! - duplicate header names are de-duplicated with `.1`, `.2`, ... suffixes
//!
//! A column is numeric when every present cell parses as a finite number;
//! otherwise it is categorical and keeps the original cell text.

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use regex::Regex;
use std::collections::HashSet;
use std::io::Cursor;

use crate::table::{Column, Table};
use crate::{InsightError, Result};

/// File extensions accepted by [`load`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".csv", ".xlsx", ".xls"];

/// Cell tokens treated as missing values (compared after trimming).
const MISSING_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "<NA>",
];

/// How the uploaded bytes are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Comma-delimited UTF-8 text
    DelimitedText,
    /// Excel workbook (`.xlsx` / `.xls`)
    Spreadsheet,
}

/// Determines the decoder from the filename's extension.
pub fn detect_file_kind(filename: &str) -> Result<FileKind> {
    let lower = filename.trim().to_lowercase();
    if lower.ends_with(".csv") {
        Ok(FileKind::DelimitedText)
    } else if lower.ends_with(".xlsx") || lower.ends_with(".xls") {
        Ok(FileKind::Spreadsheet)
    } else {
        Err(InsightError::unsupported_file_type(
            filename,
            SUPPORTED_EXTENSIONS,
        ))
    }
}

/// A parsed cell before column types are inferred.
#[derive(Debug, Clone, PartialEq)]
enum RawCell {
    Missing,
    Number { value: f64, text: String },
    Text(String),
}

impl RawCell {
    fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || MISSING_TOKENS.contains(&trimmed) {
            return RawCell::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => RawCell::Number {
                value,
                text: raw.to_string(),
            },
            _ => RawCell::Text(raw.to_string()),
        }
    }

    fn from_spreadsheet(cell: &Data) -> Self {
        match cell {
            Data::Empty | Data::Error(_) => RawCell::Missing,
            Data::Int(i) => RawCell::Number {
                value: *i as f64,
                text: i.to_string(),
            },
            Data::Float(f) if f.is_finite() => RawCell::Number {
                value: *f,
                text: format_number(*f),
            },
            Data::String(s) => RawCell::from_text(s),
            Data::Bool(b) => RawCell::Text(b.to_string()),
            other => RawCell::Text(other.to_string()),
        }
    }

    fn is_missing(&self) -> bool {
        matches!(self, RawCell::Missing)
    }

    fn header_text(&self) -> String {
        match self {
            RawCell::Missing => String::new(),
            RawCell::Number { text, .. } | RawCell::Text(text) => text.clone(),
        }
    }
}

/// Formats whole-number floats without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Normalizes header cells and recognizes auto-generated names.
struct HeaderNormalizer {
    whitespace: Regex,
    unnamed: Regex,
}

impl HeaderNormalizer {
    fn new() -> Result<Self> {
        let whitespace = Regex::new(r"\s+").map_err(|e| {
            InsightError::configuration(format!("Invalid header whitespace pattern: {}", e))
        })?;
        let unnamed = Regex::new(r"^Unnamed").map_err(|e| {
            InsightError::configuration(format!("Invalid unnamed header pattern: {}", e))
        })?;
        Ok(Self {
            whitespace,
            unnamed,
        })
    }

    /// Trims and collapses internal whitespace runs to a single space.
    fn normalize(&self, raw: &str) -> String {
        self.whitespace.replace_all(raw.trim(), " ").into_owned()
    }

    fn is_unnamed(&self, name: &str) -> bool {
        name.is_empty() || self.unnamed.is_match(name)
    }

    /// Produces the final header list; `None` marks a column to drop.
    fn resolve(&self, raw_names: &[String]) -> Vec<Option<String>> {
        let mut seen: HashSet<String> = HashSet::new();
        raw_names
            .iter()
            .map(|raw| {
                let name = self.normalize(raw);
                if self.is_unnamed(&name) {
                    return None;
                }
                let mut candidate = name.clone();
                let mut suffix = 0;
                while seen.contains(&candidate) {
                    suffix += 1;
                    candidate = format!("{}.{}", name, suffix);
                }
                seen.insert(candidate.clone());
                Some(candidate)
            })
            .collect()
    }
}

/// Parses raw upload bytes into a cleaned, typed table.
///
/// # Errors
/// - [`InsightError::UnsupportedFileType`] for extensions other than `.csv`, `.xlsx`, `.xls`
/// - [`InsightError::Parse`] when the content cannot be decoded or is malformed
/// - [`InsightError::EmptyTable`] when no rows or no named columns remain
pub fn load(raw_bytes: &[u8], filename: &str, has_headers: bool) -> Result<Table> {
    let kind = detect_file_kind(filename)?;
    if raw_bytes.is_empty() {
        return Err(InsightError::empty_table(format!("{} has no content", filename)));
    }

    let rows = match kind {
        FileKind::DelimitedText => read_delimited(raw_bytes, filename)?,
        FileKind::Spreadsheet => read_spreadsheet(raw_bytes, filename)?,
    };

    let table = build_table(rows, has_headers)?;
    tracing::info!(
        "Loaded {} rows x {} columns from {}",
        table.row_count(),
        table.column_count(),
        filename
    );
    Ok(table)
}

fn read_delimited(raw_bytes: &[u8], filename: &str) -> Result<Vec<Vec<RawCell>>> {
    let bytes = raw_bytes
        .strip_prefix(b"\xEF\xBB\xBF".as_slice())
        .unwrap_or(raw_bytes);
    let text = std::str::from_utf8(bytes).map_err(|e| {
        InsightError::parse_failed(format!("{} is not valid UTF-8 text", filename), e)
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            InsightError::parse_failed(
                format!("{}: malformed record at line {}", filename, index + 1),
                e,
            )
        })?;
        rows.push(record.iter().map(RawCell::from_text).collect());
    }
    Ok(rows)
}

fn read_spreadsheet(raw_bytes: &[u8], filename: &str) -> Result<Vec<Vec<RawCell>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(raw_bytes.to_vec()))
        .map_err(|e| InsightError::parse_failed(format!("{} is not a readable workbook", filename), e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InsightError::empty_table(format!("{} has no worksheets", filename)))?
        .map_err(|e| {
            InsightError::parse_failed(format!("{}: first worksheet is unreadable", filename), e)
        })?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(RawCell::from_spreadsheet).collect())
        .collect())
}

fn build_table(mut rows: Vec<Vec<RawCell>>, has_headers: bool) -> Result<Table> {
    if rows.is_empty() {
        return Err(InsightError::empty_table("file has no content"));
    }

    let header_row = if has_headers {
        Some(rows.remove(0))
    } else {
        None
    };

    let width = match &header_row {
        Some(header) => header.len(),
        None => rows.iter().map(Vec::len).max().unwrap_or(0),
    };

    for (index, row) in rows.iter_mut().enumerate() {
        if row.len() > width {
            if row[width..].iter().all(RawCell::is_missing) {
                row.truncate(width);
            } else {
                let line = if has_headers { index + 2 } else { index + 1 };
                return Err(InsightError::malformed(format!(
                    "row {} has {} fields, expected {}",
                    line,
                    row.len(),
                    width
                )));
            }
        }
        row.resize(width, RawCell::Missing);
    }

    rows.retain(|row| !row.iter().all(RawCell::is_missing));

    let raw_names: Vec<String> = match &header_row {
        Some(header) => header.iter().map(RawCell::header_text).collect(),
        None => (1..=width).map(|i| format!("column_{}", i)).collect(),
    };
    let names = HeaderNormalizer::new()?.resolve(&raw_names);

    let mut columns = Vec::new();
    for (index, name) in names.into_iter().enumerate() {
        let Some(name) = name else {
            tracing::debug!("Dropping unnamed column at position {}", index);
            continue;
        };
        let cells: Vec<&RawCell> = rows.iter().map(|row| &row[index]).collect();
        columns.push(infer_column(name, &cells));
    }

    if columns.is_empty() {
        return Err(InsightError::empty_table("no named columns remain"));
    }
    if rows.is_empty() {
        return Err(InsightError::empty_table("no rows remain after cleaning"));
    }

    Table::new(columns)
}

fn infer_column(name: String, cells: &[&RawCell]) -> Column {
    let all_numeric = cells
        .iter()
        .all(|cell| matches!(cell, RawCell::Missing | RawCell::Number { .. }));

    if all_numeric {
        let values = cells
            .iter()
            .map(|cell| match cell {
                RawCell::Number { value, .. } => Some(*value),
                _ => None,
            })
            .collect();
        Column::numeric(name, values)
    } else {
        let values = cells
            .iter()
            .map(|cell| match cell {
                RawCell::Missing => None,
                RawCell::Number { text, .. } | RawCell::Text(text) => Some(text.clone()),
            })
            .collect();
        Column::categorical(name, values)
    }
}
