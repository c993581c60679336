use crate::error::Result;
use crate::models::course;
use crate::models::table::{FeatureRecord, Value};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::io::Write;
use strum::{Display, EnumIter, EnumString};

/// Output column holding the dropout probability
pub const PROBABILITY_COLUMN: &str = "Dropout_Probability";

/// Output column holding the risk tier
pub const RISK_LEVEL_COLUMN: &str = "Risk_Level";

/// Output column holding the remarks
pub const REMARKS_COLUMN: &str = "Remarks";

/// Discrete risk bucket derived from a dropout probability
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

/// Pipeline output for one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Probability of the positive (dropout) class, in [0, 1]
    pub probability: f64,

    /// Risk tier derived from the probability
    pub risk_tier: RiskTier,

    /// Short human-readable rationale
    pub remarks: String,
}

/// An input row together with its prediction
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRecord {
    pub record: FeatureRecord,
    pub result: PredictionResult,
}

impl AnnotatedRecord {
    pub fn new(record: FeatureRecord, result: PredictionResult) -> Self {
        Self { record, result }
    }

    pub fn student_id(&self) -> Option<String> {
        self.text_field("Student ID")
    }

    pub fn student_name(&self) -> Option<String> {
        self.text_field("Student Name")
    }

    pub fn parent_mail(&self) -> Option<String> {
        self.text_field("Parent Mail")
    }

    /// Course name resolved through the course catalogue
    pub fn course_name(&self) -> &'static str {
        course::course_label(self.record.get("Course"))
    }

    fn text_field(&self, column: &str) -> Option<String> {
        self.record
            .get(column)
            .filter(|v| !v.is_missing())
            .map(Value::to_string)
    }
}

impl Serialize for AnnotatedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.record.len() + 3))?;
        for (name, value) in self.record.iter() {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(PROBABILITY_COLUMN, &self.result.probability)?;
        map.serialize_entry(RISK_LEVEL_COLUMN, &self.result.risk_tier)?;
        map.serialize_entry(REMARKS_COLUMN, &self.result.remarks)?;
        map.end()
    }
}

/// Write annotated records as CSV: the input columns in first-seen order,
/// then the three result columns
pub fn write_annotated_csv<W: Write>(records: &[AnnotatedRecord], writer: W) -> Result<()> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for (name, _) in record.record.iter() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }

    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = columns.clone();
    header.extend(
        [PROBABILITY_COLUMN, RISK_LEVEL_COLUMN, REMARKS_COLUMN]
            .iter()
            .map(|c| c.to_string()),
    );
    csv_writer.write_record(&header)?;

    for annotated in records {
        let mut row: Vec<String> = columns
            .iter()
            .map(|c| {
                annotated
                    .record
                    .get(c)
                    .map(Value::to_string)
                    .unwrap_or_default()
            })
            .collect();
        row.push(annotated.result.probability.to_string());
        row.push(annotated.result.risk_tier.to_string());
        row.push(annotated.result.remarks.clone());
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}
