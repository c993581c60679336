//! Dashboard data for one scored upload

use crate::analytics::aggregation::{
    course_breakdown, high_risk_performance, ranked_overview, CourseRisk, RiskSummary,
    SemesterPerformance, StudentOverview,
};
use crate::models::{AnnotatedRecord, Cohort};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything the dashboard shows for a batch of predictions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    /// Cohort the batch was scored against
    pub cohort: Cohort,

    /// Counts per risk tier
    pub summary: RiskSummary,

    /// Students by descending dropout probability
    pub students: Vec<StudentOverview>,

    /// Risk counts per course
    pub courses: Vec<CourseRisk>,

    /// Approved units of high-risk students
    pub high_risk_performance: SemesterPerformance,

    /// When the data was generated
    pub generated_at: DateTime<Utc>,
}

impl DashboardData {
    pub fn from_records(cohort: Cohort, records: &[AnnotatedRecord]) -> Self {
        Self {
            cohort,
            summary: RiskSummary::from_records(records),
            students: ranked_overview(records),
            courses: course_breakdown(records),
            high_risk_performance: high_risk_performance(records),
            generated_at: Utc::now(),
        }
    }

    /// The `limit` highest-risk students
    pub fn top_students(&self, limit: usize) -> &[StudentOverview] {
        &self.students[..limit.min(self.students.len())]
    }
}
