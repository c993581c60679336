//! Aggregations over scored records

use crate::models::{AnnotatedRecord, RiskTier};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Student counts per risk tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskSummary {
    pub fn from_records(records: &[AnnotatedRecord]) -> Self {
        records.iter().fold(Self::default(), |mut summary, record| {
            summary.total += 1;
            match record.result.risk_tier {
                RiskTier::High => summary.high += 1,
                RiskTier::Medium => summary.medium += 1,
                RiskTier::Low => summary.low += 1,
            }
            summary
        })
    }

    /// Share of high-risk students, 0.0 for an empty set
    pub fn high_ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.high as f64 / self.total as f64
        }
    }
}

/// One row of the ranked student overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentOverview {
    pub student_id: Option<String>,
    pub student_name: Option<String>,
    pub course: String,
    pub risk_tier: RiskTier,
    pub probability: f64,
}

/// Students sorted by dropout probability, highest first; ties keep input order
pub fn ranked_overview(records: &[AnnotatedRecord]) -> Vec<StudentOverview> {
    let mut overview: Vec<StudentOverview> = records
        .iter()
        .map(|record| StudentOverview {
            student_id: record.student_id(),
            student_name: record.student_name(),
            course: record.course_name().to_string(),
            risk_tier: record.result.risk_tier,
            probability: record.result.probability,
        })
        .collect();

    overview.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(Ordering::Equal)
    });
    overview
}

/// Risk counts for one course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRisk {
    pub course: String,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl CourseRisk {
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Risk counts per course, courses in first-seen order
pub fn course_breakdown(records: &[AnnotatedRecord]) -> Vec<CourseRisk> {
    let mut breakdown: Vec<CourseRisk> = Vec::new();

    for record in records {
        let course = record.course_name();
        let index = match breakdown.iter().position(|entry| entry.course == course) {
            Some(index) => index,
            None => {
                breakdown.push(CourseRisk {
                    course: course.to_string(),
                    high: 0,
                    medium: 0,
                    low: 0,
                });
                breakdown.len() - 1
            }
        };

        let entry = &mut breakdown[index];
        match record.result.risk_tier {
            RiskTier::High => entry.high += 1,
            RiskTier::Medium => entry.medium += 1,
            RiskTier::Low => entry.low += 1,
        }
    }

    breakdown
}

/// Average approved curricular units among high-risk students
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SemesterPerformance {
    pub high_risk_students: usize,
    pub avg_first_semester_approved: f64,
    pub avg_second_semester_approved: f64,
}

/// Semester performance of high-risk students. Missing values count as 0 and
/// the divisor is at least 1.
pub fn high_risk_performance(records: &[AnnotatedRecord]) -> SemesterPerformance {
    let high_risk: Vec<&AnnotatedRecord> = records
        .iter()
        .filter(|record| record.result.risk_tier == RiskTier::High)
        .collect();

    let divisor = high_risk.len().max(1) as f64;
    let average = |column: &str| {
        high_risk
            .iter()
            .map(|record| record.record.number(column).unwrap_or(0.0))
            .sum::<f64>()
            / divisor
    };

    SemesterPerformance {
        high_risk_students: high_risk.len(),
        avg_first_semester_approved: average("Curricular units 1st sem (approved)"),
        avg_second_semester_approved: average("Curricular units 2nd sem (approved)"),
    }
}
