use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Label column of the training tables
pub const TARGET_COLUMN: &str = "Target";

/// Label value counted as the positive class
pub const POSITIVE_LABEL: &str = "Dropout";

/// Identifier columns carried through to the output but never used as features
pub const ID_COLUMNS: [&str; 3] = ["Student ID", "Student Name", "Parent Mail"];

/// Feature columns required for the 1-semester data shape
pub const REQUIRED_COLUMNS_1SEM: [&str; 23] = [
    "Marital status",
    "Course",
    "Daytime/evening attendance",
    "Previous qualification",
    "Previous qualification (grade)",
    "Mother's qualification",
    "Father's qualification",
    "Mother's occupation",
    "Father's occupation",
    "Displaced",
    "Educational special needs",
    "Debtor",
    "Tuition fees up to date",
    "Gender",
    "Scholarship holder",
    "Age at enrollment",
    "International",
    "Curricular units 1st sem (credited)",
    "Curricular units 1st sem (enrolled)",
    "Curricular units 1st sem (evaluations)",
    "Curricular units 1st sem (approved)",
    "Curricular units 1st sem (grade)",
    "Curricular units 1st sem (without evaluations)",
];

/// Extra feature columns required for the 2-semester data shape
pub const SECOND_SEMESTER_COLUMNS: [&str; 6] = [
    "Curricular units 2nd sem (credited)",
    "Curricular units 2nd sem (enrolled)",
    "Curricular units 2nd sem (evaluations)",
    "Curricular units 2nd sem (approved)",
    "Curricular units 2nd sem (grade)",
    "Curricular units 2nd sem (without evaluations)",
];

/// One of the two independently trained prediction contexts
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
pub enum Cohort {
    /// Records carrying only first-semester curricular data
    #[serde(rename = "1sem")]
    #[strum(to_string = "1sem", serialize = "1-semester", serialize = "one-semester")]
    OneSemester,

    /// Records carrying first and second semester curricular data
    #[serde(rename = "2sem")]
    #[strum(to_string = "2sem", serialize = "2-semester", serialize = "two-semester")]
    TwoSemester,
}

impl Cohort {
    /// Feature columns an input table must provide for this cohort
    pub fn required_columns(&self) -> Vec<&'static str> {
        match self {
            Cohort::OneSemester => REQUIRED_COLUMNS_1SEM.to_vec(),
            Cohort::TwoSemester => REQUIRED_COLUMNS_1SEM
                .iter()
                .chain(SECOND_SEMESTER_COLUMNS.iter())
                .copied()
                .collect(),
        }
    }

    /// Columns a training table must provide: the feature columns plus the label
    pub fn training_columns(&self) -> Vec<&'static str> {
        let mut columns = self.required_columns();
        columns.push(TARGET_COLUMN);
        columns
    }

    /// Stable array index used by per-cohort slots
    pub fn index(&self) -> usize {
        match self {
            Cohort::OneSemester => 0,
            Cohort::TwoSemester => 1,
        }
    }
}

/// Whether a column name is an identifier column
pub fn is_id_column(name: &str) -> bool {
    ID_COLUMNS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_cohort_parsing() {
        assert_eq!(Cohort::from_str("1sem").unwrap(), Cohort::OneSemester);
        assert_eq!(Cohort::from_str("2-semester").unwrap(), Cohort::TwoSemester);
        assert!(Cohort::from_str("3sem").is_err());
        assert_eq!(Cohort::TwoSemester.to_string(), "2sem");
    }

    #[test]
    fn test_required_columns() {
        assert_eq!(Cohort::OneSemester.required_columns().len(), 23);
        assert_eq!(Cohort::TwoSemester.required_columns().len(), 29);
        assert!(Cohort::TwoSemester
            .required_columns()
            .contains(&"Curricular units 2nd sem (grade)"));
        assert!(Cohort::OneSemester.training_columns().contains(&TARGET_COLUMN));
    }

    #[test]
    fn test_cohort_indices_are_distinct() {
        let indices: Vec<usize> = Cohort::iter().map(|c| c.index()).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Cohort::OneSemester).unwrap();
        assert_eq!(json, "\"1sem\"");
    }
}
