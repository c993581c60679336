use crate::models::{DataTable, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Reserved label absorbing every category unseen during training
pub const UNKNOWN_LABEL: &str = "<unknown>";

/// Label ↔ integer bijection for one categorical column.
///
/// Codes follow the lexicographic order of the fitted labels. The unknown
/// bucket takes the next free code (`classes.len()`) unless `<unknown>` was
/// itself a fitted label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Fit over the distinct labels of a column
    pub fn fit<I>(labels: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let classes: Vec<String> = labels
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = classes
            .iter()
            .enumerate()
            .map(|(code, label)| (label.clone(), code))
            .collect();

        Self { classes, index }
    }

    /// Fitted labels in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Code of a fitted label
    pub fn code(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Code of the unknown bucket
    pub fn unknown_code(&self) -> usize {
        self.code(UNKNOWN_LABEL).unwrap_or(self.classes.len())
    }

    /// Code of the first fitted label that parses to `number`
    fn numeric_code(&self, number: f64) -> Option<usize> {
        self.classes
            .iter()
            .position(|label| label.trim().parse::<f64>().ok() == Some(number))
    }

    /// Encode a label, folding unseen labels into the unknown bucket.
    /// The flag is true when the label was folded.
    pub fn encode(&self, label: &str) -> (usize, bool) {
        match self.code(label) {
            Some(code) => (code, false),
            None => (self.unknown_code(), true),
        }
    }

    /// Encode a raw cell. A numeric cell whose label was not fitted verbatim
    /// matches a fitted label spelling the same number (`12` and `12.0`).
    pub fn encode_value(&self, value: &Value) -> (usize, bool) {
        let label = value.as_label();
        if let Some(code) = self.code(&label) {
            return (code, false);
        }
        match value.as_f64().and_then(|n| self.numeric_code(n)) {
            Some(code) => (code, false),
            None => (self.unknown_code(), true),
        }
    }

    /// Label for a code, including the unknown bucket
    pub fn decode(&self, code: usize) -> Option<&str> {
        match self.classes.get(code) {
            Some(label) => Some(label.as_str()),
            None if code == self.unknown_code() => Some(UNKNOWN_LABEL),
            None => None,
        }
    }
}

/// Novel categories folded into the unknown bucket during one transform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncodingReport {
    /// Folded cell count per column
    pub folded: BTreeMap<String, usize>,
}

impl EncodingReport {
    pub fn total(&self) -> usize {
        self.folded.values().sum()
    }

    pub fn is_clean(&self) -> bool {
        self.folded.is_empty()
    }
}

/// One label encoder per categorical column seen at training time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EncoderSet {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl EncoderSet {
    /// Fit an encoder for every categorical column not in `exclude`,
    /// visiting columns in lexicographic order
    pub fn fit(table: &DataTable, exclude: &[&str]) -> Self {
        let mut columns: Vec<&String> = table
            .columns()
            .iter()
            .filter(|c| !exclude.contains(&c.as_str()) && table.is_categorical(c))
            .collect();
        columns.sort();

        let mut encoders = BTreeMap::new();
        for column in columns {
            if let Some(values) = table.column_values(column) {
                let encoder = LabelEncoder::fit(values.map(Value::as_label));
                debug!(
                    column = %column,
                    classes = encoder.classes().len(),
                    "Fitted label encoder"
                );
                encoders.insert(column.clone(), encoder);
            }
        }

        Self { encoders }
    }

    /// Fit on `table` and return it with categorical columns replaced by codes
    pub fn fit_transform(table: &DataTable, exclude: &[&str]) -> (Self, DataTable) {
        let encoders = Self::fit(table, exclude);
        let (encoded, _) = encoders.transform(table);
        (encoders, encoded)
    }

    /// Replace every encoded column of a copy of `table` by integer codes.
    ///
    /// Never fails: unseen labels are folded into the unknown bucket and
    /// reported. Columns without an encoder are left untouched.
    pub fn transform(&self, table: &DataTable) -> (DataTable, EncodingReport) {
        let mut encoded = table.clone();
        let mut report = EncodingReport::default();

        for (column, encoder) in &self.encoders {
            let mut folded = 0usize;
            encoded.map_column(column, |value| {
                let (code, unknown) = encoder.encode_value(value);
                if unknown {
                    folded += 1;
                }
                Value::Number(code as f64)
            });

            if folded > 0 {
                warn!(
                    column = %column,
                    count = folded,
                    "Unseen categories folded into the unknown bucket"
                );
                report.folded.insert(column.clone(), folded);
            }
        }

        (encoded, report)
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    /// Encoded column names in lexicographic order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }
}
