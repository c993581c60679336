use crate::error::{AppError, Result};
use crate::followup::directory::{StudentContact, StudentDirectory};
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A counselling session booked for one student on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounsellingSession {
    pub id: Uuid,
    pub student_id: String,
    pub day: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// What happened to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleChange {
    Assigned,
    Ended,
    Rescheduled { from: NaiveDate },
}

/// Notification-ready description of a schedule change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    pub change: ScheduleChange,
    pub student: StudentContact,
    pub day: NaiveDate,
    pub subject: String,
    pub body: String,
}

impl ScheduleEvent {
    fn new(change: ScheduleChange, student: StudentContact, day: NaiveDate) -> Self {
        let name = &student.student_name;
        let (subject, body) = match &change {
            ScheduleChange::Assigned => (
                format!("Counselling Session for {}", name),
                format!(
                    "Dear Parent,\n\nA counselling session for {} has been scheduled for {}.\n\nSincerely,\nThe School Administration",
                    name, day
                ),
            ),
            ScheduleChange::Ended => (
                format!("Counselling Session Ended for {}", name),
                format!(
                    "Dear Parent,\n\nThe counselling session for {} on {} has ended.\n\nSincerely,\nThe School Administration",
                    name, day
                ),
            ),
            ScheduleChange::Rescheduled { .. } => (
                format!("RESCHEDULED: Counselling for {}", name),
                format!(
                    "Dear Parent,\n\nPlease note that the counselling session for {} has been rescheduled to {}.\n\nSincerely,\nThe School Administration",
                    name, day
                ),
            ),
        };

        Self {
            change,
            student,
            day,
            subject,
            body,
        }
    }

    /// Whether the notification collaborator has an address to send to
    pub fn is_deliverable(&self) -> bool {
        self.student.parent_mail.is_some()
    }
}

/// In-memory counselling schedule, at most one session per student and day
#[derive(Clone)]
pub struct CounsellingSchedule {
    sessions: Arc<DashMap<(String, NaiveDate), CounsellingSession>>,
    directory: StudentDirectory,
}

impl CounsellingSchedule {
    pub fn new(directory: StudentDirectory) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            directory,
        }
    }

    fn contact(&self, student_id: &str) -> Result<StudentContact> {
        self.directory
            .get(student_id)
            .ok_or_else(|| AppError::NotFound(format!("Student {} not found", student_id)))
    }

    /// Book a session
    pub fn assign(&self, student_id: &str, day: NaiveDate) -> Result<ScheduleEvent> {
        let contact = self.contact(student_id)?;

        match self.sessions.entry((student_id.to_string(), day)) {
            Entry::Occupied(_) => Err(AppError::Conflict(format!(
                "Student {} already assigned for {}",
                student_id, day
            ))),
            Entry::Vacant(entry) => {
                entry.insert(CounsellingSession {
                    id: Uuid::new_v4(),
                    student_id: student_id.to_string(),
                    day,
                    created_at: Utc::now(),
                });
                info!(student_id, %day, "Counselling session assigned");
                Ok(ScheduleEvent::new(ScheduleChange::Assigned, contact, day))
            }
        }
    }

    /// Remove a session
    pub fn end(&self, student_id: &str, day: NaiveDate) -> Result<ScheduleEvent> {
        let contact = self.contact(student_id)?;

        self.sessions
            .remove(&(student_id.to_string(), day))
            .ok_or_else(|| {
                AppError::NotFound(format!("Session for {} on {} not found", student_id, day))
            })?;

        info!(student_id, %day, "Counselling session ended");
        Ok(ScheduleEvent::new(ScheduleChange::Ended, contact, day))
    }

    /// Move a session to another day
    pub fn reschedule(&self, student_id: &str, old_day: NaiveDate, new_day: NaiveDate) -> Result<ScheduleEvent> {
        let contact = self.contact(student_id)?;
        let old_key = (student_id.to_string(), old_day);
        let new_key = (student_id.to_string(), new_day);

        if !self.sessions.contains_key(&old_key) {
            return Err(AppError::NotFound(format!(
                "Original session for {} on {} not found",
                student_id, old_day
            )));
        }
        if old_day == new_day || self.sessions.contains_key(&new_key) {
            return Err(AppError::Conflict(format!(
                "Student {} already has a session on {}",
                student_id, new_day
            )));
        }

        let (_, mut session) = self.sessions.remove(&old_key).ok_or_else(|| {
            AppError::NotFound(format!(
                "Original session for {} on {} not found",
                student_id, old_day
            ))
        })?;

        // The entry guard must be released before the old session is restored
        let displaced = match self.sessions.entry(new_key) {
            Entry::Occupied(_) => Some(session),
            Entry::Vacant(entry) => {
                session.day = new_day;
                entry.insert(session);
                None
            }
        };

        if let Some(session) = displaced {
            self.sessions.insert(old_key, session);
            return Err(AppError::Conflict(format!(
                "Student {} already has a session on {}",
                student_id, new_day
            )));
        }

        info!(student_id, %old_day, %new_day, "Counselling session rescheduled");
        Ok(ScheduleEvent::new(
            ScheduleChange::Rescheduled { from: old_day },
            contact,
            new_day,
        ))
    }

    /// Sessions booked on a day, ordered by student ID
    pub fn sessions_on(&self, day: NaiveDate) -> Vec<CounsellingSession> {
        let mut sessions: Vec<CounsellingSession> = self
            .sessions
            .iter()
            .filter(|entry| entry.key().1 == day)
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
