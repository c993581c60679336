use crate::error::{AppError, Result};
use crate::followup::directory::StudentDirectory;
use crate::ml::SchemaNormalizer;
use crate::models::DataTable;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Identifier column of attendance tables
pub const STUDENT_ID_COLUMN: &str = "Student_ID";

/// Attendance of one student for one week, per subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: String,
    pub week: String,
    pub subjects: BTreeMap<String, f64>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of one attendance import
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    /// Rows stored for known students
    pub updated: usize,
    /// IDs with no matching student, in table order
    pub not_found: Vec<String>,
}

/// Weekly attendance keyed by (student, week)
#[derive(Clone)]
pub struct AttendanceBook {
    records: Arc<DashMap<(String, String), AttendanceRecord>>,
    directory: StudentDirectory,
    normalizer: SchemaNormalizer,
}

impl AttendanceBook {
    pub fn new(directory: StudentDirectory) -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            directory,
            normalizer: SchemaNormalizer::new().with_synonym("Student ID", STUDENT_ID_COLUMN),
        }
    }

    /// Upsert one week of attendance from a table with a `Student_ID` column
    /// and one numeric column per subject.
    ///
    /// Rows of unknown students are reported without reading their cells.
    /// Rows of known students are validated together before anything is
    /// stored. Blank cells leave that subject out of the student's record.
    pub fn import(&self, week: &str, table: &DataTable) -> Result<ImportReport> {
        let week = week.trim();
        if week.is_empty() {
            return Err(AppError::Validation("week not selected".to_string()));
        }

        let table = self
            .normalizer
            .normalize_and_require(table, &[STUDENT_ID_COLUMN])?;
        let id_index = table
            .column_index(STUDENT_ID_COLUMN)
            .ok_or_else(|| AppError::Schema {
                missing: vec![STUDENT_ID_COLUMN.to_string()],
            })?;

        let subjects: Vec<(usize, &String)> = table
            .columns()
            .iter()
            .enumerate()
            .filter(|(index, _)| *index != id_index)
            .collect();

        let mut report = ImportReport::default();
        let mut parsed: Vec<(String, BTreeMap<String, f64>)> = Vec::with_capacity(table.len());
        for row in table.rows() {
            let student_id = row[id_index].as_label().trim().to_string();
            if !self.directory.contains(&student_id) {
                report.not_found.push(student_id);
                continue;
            }

            let mut values = BTreeMap::new();
            for (index, subject) in &subjects {
                let cell = &row[*index];
                if cell.is_missing() {
                    continue;
                }
                let value = cell.as_f64().ok_or_else(|| {
                    AppError::Validation(format!(
                        "attendance for student {} in '{}' is not a number: '{}'",
                        student_id, subject, cell
                    ))
                })?;
                values.insert(subject.to_string(), value);
            }
            parsed.push((student_id, values));
        }

        for (student_id, subjects) in parsed {
            self.records.insert(
                (student_id.clone(), week.to_string()),
                AttendanceRecord {
                    student_id,
                    week: week.to_string(),
                    subjects,
                    updated_at: Utc::now(),
                },
            );
            report.updated += 1;
        }

        info!(week, updated = report.updated, "Attendance imported");
        if !report.not_found.is_empty() {
            warn!(week, not_found = ?report.not_found, "Attendance rows for unknown students");
        }

        Ok(report)
    }

    pub fn get(&self, student_id: &str, week: &str) -> Option<AttendanceRecord> {
        self.records
            .get(&(student_id.to_string(), week.to_string()))
            .map(|entry| entry.clone())
    }

    /// All weeks recorded for a student, ordered by week label
    pub fn weeks_for(&self, student_id: &str) -> Vec<AttendanceRecord> {
        let mut records: Vec<AttendanceRecord> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == student_id)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.week.cmp(&b.week));
        records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
