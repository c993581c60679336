use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;

/// A raw table cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Numeric reading of the cell; text that parses as a finite number counts
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_number(s),
            Value::Missing => None,
        }
    }

    /// String label used by categorical encoders
    pub fn as_label(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Missing => String::new(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Text(s) => write!(f, "{}", s),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// One student row: canonical column name to raw value, in column order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureRecord {
    fields: Vec<(String, Value)>,
}

impl FeatureRecord {
    pub fn new(fields: Vec<(String, Value)>) -> Self {
        Self { fields }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Numeric reading of a field, `None` when absent or non-numeric
    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_f64)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A heterogeneous table as uploaded: ordered headers plus typed rows.
///
/// A column read from CSV is numeric when every non-empty cell parses as a
/// finite number; otherwise every cell of that column is kept as text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl DataTable {
    /// Build a table, checking every row has one value per column
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(AppError::Validation(format!(
                "row {} has {} values, expected {}",
                index,
                row.len(),
                columns.len()
            )));
        }

        Ok(Self { columns, rows })
    }

    /// Convenience constructor for borrowed column names
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<Value>>) -> Result<Self> {
        Self::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    /// Read a CSV table with a header row
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            raw_rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        let numeric: Vec<bool> = (0..columns.len())
            .map(|col| {
                raw_rows
                    .iter()
                    .map(|row| row[col].as_str())
                    .filter(|cell| !cell.trim().is_empty())
                    .all(|cell| parse_number(cell).is_some())
            })
            .collect();

        let rows = raw_rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(numeric.iter())
                    .map(|(cell, &is_numeric)| {
                        if cell.trim().is_empty() {
                            Value::Missing
                        } else if is_numeric {
                            parse_number(&cell).map(Value::Number).unwrap_or(Value::Missing)
                        } else {
                            Value::Text(cell)
                        }
                    })
                    .collect()
            })
            .collect();

        Self::new(columns, rows)
    }

    /// Read a CSV table from disk
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::from_csv_reader(std::io::BufReader::new(file))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    /// Values of one column, top to bottom
    pub fn column_values(&self, column: &str) -> Option<impl Iterator<Item = &Value>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(move |row| &row[index]))
    }

    /// A column is categorical when it holds at least one text cell
    pub fn is_categorical(&self, column: &str) -> bool {
        self.column_values(column)
            .map(|mut values| values.any(|v| matches!(v, Value::Text(_))))
            .unwrap_or(false)
    }

    /// Owned copy of one row as a record
    pub fn record(&self, row: usize) -> Option<FeatureRecord> {
        self.rows.get(row).map(|values| {
            FeatureRecord::new(
                self.columns
                    .iter()
                    .cloned()
                    .zip(values.iter().cloned())
                    .collect(),
            )
        })
    }

    pub fn records(&self) -> impl Iterator<Item = FeatureRecord> + '_ {
        (0..self.rows.len()).filter_map(move |row| self.record(row))
    }

    /// Rename a header in place; returns false when the column is absent
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column_index(from) {
            Some(index) => {
                self.columns[index] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Remove a column; returns false when the column is absent
    pub fn drop_column(&mut self, column: &str) -> bool {
        match self.column_index(column) {
            Some(index) => {
                self.columns.remove(index);
                for row in &mut self.rows {
                    row.remove(index);
                }
                true
            }
            None => false,
        }
    }

    /// Replace every value of a column
    pub fn map_column<F>(&mut self, column: &str, mut f: F) -> bool
    where
        F: FnMut(&Value) -> Value,
    {
        match self.column_index(column) {
            Some(index) => {
                for row in &mut self.rows {
                    row[index] = f(&row[index]);
                }
                true
            }
            None => false,
        }
    }

    /// Copy of the table restricted to `columns`, in that order.
    ///
    /// Columns absent from this table are synthesized with `fill`; columns not
    /// listed are dropped. Applying the same reindex twice is a no-op.
    pub fn reindex(&self, columns: &[String], fill: &Value) -> DataTable {
        let sources: Vec<Option<usize>> =
            columns.iter().map(|c| self.column_index(c)).collect();

        let rows = self
            .rows
            .iter()
            .map(|row| {
                sources
                    .iter()
                    .map(|source| match source {
                        Some(index) => row[*index].clone(),
                        None => fill.clone(),
                    })
                    .collect()
            })
            .collect();

        DataTable {
            columns: columns.to_vec(),
            rows,
        }
    }
}
