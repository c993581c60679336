use crate::models::AnnotatedRecord;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Identity and contact details of a scored student
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentContact {
    pub student_id: String,
    pub student_name: String,
    pub parent_mail: Option<String>,
}

impl StudentContact {
    pub fn new(student_id: impl Into<String>, student_name: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            student_name: student_name.into(),
            parent_mail: None,
        }
    }

    pub fn with_parent_mail(mut self, parent_mail: impl Into<String>) -> Self {
        self.parent_mail = Some(parent_mail.into());
        self
    }

    /// Contact for a scored row; `None` when the row has no student ID
    pub fn from_record(record: &AnnotatedRecord) -> Option<Self> {
        let student_id = record.student_id()?;
        let student_name = record.student_name().unwrap_or_else(|| student_id.clone());
        Some(Self {
            student_id,
            student_name,
            parent_mail: record.parent_mail(),
        })
    }
}

/// In-memory index of known students by ID
#[derive(Clone, Default)]
pub struct StudentDirectory {
    students: Arc<DashMap<String, StudentContact>>,
}

impl StudentDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a student
    pub fn register(&self, contact: StudentContact) {
        tracing::debug!(student_id = %contact.student_id, "Student registered");
        self.students.insert(contact.student_id.clone(), contact);
    }

    /// Register every scored row carrying a student ID; returns how many
    pub fn register_records(&self, records: &[AnnotatedRecord]) -> usize {
        records
            .iter()
            .filter_map(StudentContact::from_record)
            .map(|contact| self.register(contact))
            .count()
    }

    pub fn get(&self, student_id: &str) -> Option<StudentContact> {
        self.students.get(student_id).map(|entry| entry.clone())
    }

    pub fn contains(&self, student_id: &str) -> bool {
        self.students.contains_key(student_id)
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}
