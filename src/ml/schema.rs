use crate::error::{AppError, Result};
use crate::models::DataTable;
use tracing::{debug, warn};

/// Known header variants and the canonical name they map to
pub const HEADER_SYNONYMS: [(&str, &str); 2] = [
    ("Daytime/evening attendance\t", "Daytime/evening attendance"),
    ("Student Mail", "Parent Mail"),
];

/// Renames inconsistent headers to canonical names and checks required columns
#[derive(Debug, Clone)]
pub struct SchemaNormalizer {
    synonyms: Vec<(String, String)>,
}

impl SchemaNormalizer {
    pub fn new() -> Self {
        Self {
            synonyms: HEADER_SYNONYMS
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// Add a synonym on top of the built-in table
    pub fn with_synonym(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.synonyms.push((from.into(), to.into()));
        self
    }

    /// Canonicalize headers of a copy of `table`.
    ///
    /// The synonym table is applied first, then surrounding whitespace is
    /// trimmed from every header. When a rename collides with a column that
    /// already has the canonical name, the canonical column is kept and the
    /// variant is dropped.
    pub fn normalize(&self, table: &DataTable) -> DataTable {
        let mut normalized = table.clone();

        for (from, to) in &self.synonyms {
            self.rename(&mut normalized, from, to);
        }

        let untrimmed: Vec<String> = normalized
            .columns()
            .iter()
            .filter(|c| c.trim() != c.as_str())
            .cloned()
            .collect();
        for column in untrimmed {
            let trimmed = column.trim().to_string();
            self.rename(&mut normalized, &column, &trimmed);
        }

        normalized
    }

    /// Fail with a schema error naming every required column still absent
    pub fn require(&self, table: &DataTable, required: &[&str]) -> Result<()> {
        let missing: Vec<String> = required
            .iter()
            .filter(|column| !table.has_column(column))
            .map(|column| column.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Schema { missing })
        }
    }

    /// Normalize then check required columns
    pub fn normalize_and_require(&self, table: &DataTable, required: &[&str]) -> Result<DataTable> {
        let normalized = self.normalize(table);
        self.require(&normalized, required)?;
        Ok(normalized)
    }

    fn rename(&self, table: &mut DataTable, from: &str, to: &str) {
        if from == to || !table.has_column(from) {
            return;
        }

        if table.has_column(to) {
            warn!(
                column = %from.escape_debug(),
                canonical = to,
                "Duplicate column after normalization, keeping the canonical one"
            );
            table.drop_column(from);
        } else {
            debug!(column = %from.escape_debug(), canonical = to, "Renamed column");
            table.rename_column(from, to);
        }
    }
}

impl Default for SchemaNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
