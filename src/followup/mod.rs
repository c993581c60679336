//! Follow-up of at-risk students: counselling sessions and weekly attendance
//!
//! Both stores are in memory and keyed by student ID; persistence and email
//! delivery belong to the caller. Schedule changes come back as
//! [`ScheduleEvent`]s ready to hand to a notification sender.

mod attendance;
mod counselling;
mod directory;

pub use attendance::{AttendanceBook, AttendanceRecord, ImportReport, STUDENT_ID_COLUMN};
pub use counselling::{CounsellingSchedule, CounsellingSession, ScheduleChange, ScheduleEvent};
pub use directory::{StudentContact, StudentDirectory};
