//! Dashboard analytics over scored students
//!
//! # Features
//!
//! - **Risk Summary**: total, high, medium and low counts
//! - **Ranked Overview**: students by descending dropout probability
//! - **Course Breakdown**: risk counts per course
//! - **Semester Performance**: approved units of high-risk students
//!
//! # Example
//!
//! ```no_run
//! use dropout_early_warning::analytics::DashboardData;
//! use dropout_early_warning::models::Cohort;
//!
//! let dashboard = DashboardData::from_records(Cohort::OneSemester, &[]);
//! println!("{} students at high risk", dashboard.summary.high);
//! ```

mod aggregation;
mod dashboard;

pub use aggregation::{
    course_breakdown, high_risk_performance, ranked_overview, CourseRisk, RiskSummary,
    SemesterPerformance, StudentOverview,
};
pub use dashboard::DashboardData;
