use crate::models::FeatureRecord;

/// Remark used when no rule fires
pub const FALLBACK_REMARK: &str = "Multiple contributing factors.";

/// At most this many phrases are reported
pub const MAX_PHRASES: usize = 2;

/// Previous-qualification grade below which a row is flagged
pub const LOW_GRADE_THRESHOLD: f64 = 110.0;

/// Grade assumed when the field is absent
const DEFAULT_GRADE: f64 = 200.0;

/// A named predicate over raw row values
pub struct RemarkRule {
    pub phrase: &'static str,
    pub applies: fn(&FeatureRecord) -> bool,
}

/// Rules in priority order
pub const REMARK_RULES: [RemarkRule; 4] = [
    RemarkRule {
        phrase: "Tuition fees not up to date",
        applies: tuition_overdue,
    },
    RemarkRule {
        phrase: "Low previous grade",
        applies: low_previous_grade,
    },
    RemarkRule {
        phrase: "Outstanding debt",
        applies: debtor,
    },
    RemarkRule {
        phrase: "No 1st semester units approved",
        applies: no_units_approved,
    },
];

fn tuition_overdue(record: &FeatureRecord) -> bool {
    record.number("Tuition fees up to date") == Some(0.0)
}

fn low_previous_grade(record: &FeatureRecord) -> bool {
    record
        .number("Previous qualification (grade)")
        .unwrap_or(DEFAULT_GRADE)
        < LOW_GRADE_THRESHOLD
}

fn debtor(record: &FeatureRecord) -> bool {
    record.number("Debtor") == Some(1.0)
}

fn no_units_approved(record: &FeatureRecord) -> bool {
    let enrolled = record.number("Curricular units 1st sem (enrolled)");
    let approved = record.number("Curricular units 1st sem (approved)");
    matches!((enrolled, approved), (Some(e), Some(a)) if e > 0.0 && a == 0.0)
}

/// Short rationale for one raw row
pub fn generate(record: &FeatureRecord) -> String {
    let phrases: Vec<&str> = REMARK_RULES
        .iter()
        .filter(|rule| (rule.applies)(record))
        .map(|rule| rule.phrase)
        .take(MAX_PHRASES)
        .collect();

    if phrases.is_empty() {
        FALLBACK_REMARK.to_string()
    } else {
        phrases.join(", ")
    }
}
