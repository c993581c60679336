//! Shared fixtures for integration tests
//!
//! Synthetic student tables for both cohorts and a stub classifier that
//! returns fixed probabilities.

#![allow(dead_code)]

use dropout_early_warning::{
    config::ModelConfig,
    ml::{
        Classifier, ClassifierFactory, InMemoryTrainingSource, ModelMetadata, ModelMetrics,
        ModelType, PredictionService, TrainingDataset, TrainingPipeline,
    },
    models::{Cohort, DataTable, Value, TARGET_COLUMN},
    Result,
};
use ndarray::{Array1, Array2};
use std::sync::Arc;

/// Course codes cycled through the synthetic rows
pub const COURSES: [f64; 3] = [9254.0, 9500.0, 171.0];

/// Value of one feature column for a synthetic student
pub fn feature_value(column: &str, at_risk: bool, i: usize) -> Value {
    let flag = |on: bool| Value::Number(if on { 1.0 } else { 0.0 });

    match column {
        "Marital status" => Value::from(if i % 3 == 0 { "married" } else { "single" }),
        "Course" => Value::Number(COURSES[i % COURSES.len()]),
        "Tuition fees up to date" => flag(!at_risk),
        "Debtor" => flag(at_risk),
        "Scholarship holder" => flag(!at_risk),
        "Previous qualification (grade)" => Value::Number(if at_risk {
            95.0 + (i % 5) as f64
        } else {
            140.0 + (i % 7) as f64
        }),
        "Age at enrollment" => Value::Number(if at_risk {
            27.0 + (i % 4) as f64
        } else {
            19.0 + (i % 3) as f64
        }),
        c if c.ends_with("(approved)") => {
            Value::Number(if at_risk { 0.0 } else { 5.0 + (i % 2) as f64 })
        }
        c if c.ends_with("(enrolled)") => Value::Number(6.0),
        c if c.ends_with("(grade)") => Value::Number(if at_risk {
            0.0
        } else {
            12.5 + (i % 4) as f64 * 0.5
        }),
        _ => Value::Number((i % 2) as f64),
    }
}

/// Labelled training table; even rows drop out, odd rows graduate
pub fn training_table(cohort: Cohort, rows: usize) -> DataTable {
    let mut columns = cohort.required_columns();
    columns.push(TARGET_COLUMN);

    let rows = (0..rows)
        .map(|i| {
            let at_risk = i % 2 == 0;
            let mut row: Vec<Value> = cohort
                .required_columns()
                .iter()
                .map(|column| feature_value(column, at_risk, i))
                .collect();
            row.push(Value::from(if at_risk { "Dropout" } else { "Graduate" }));
            row
        })
        .collect();

    DataTable::from_rows(&columns, rows).unwrap()
}

/// Upload table with identifier columns; `at_risk[i]` shapes row `i`
pub fn upload_table(cohort: Cohort, at_risk: &[bool]) -> DataTable {
    let mut columns = vec!["Student ID", "Student Name", "Parent Mail"];
    columns.extend(cohort.required_columns());

    let rows = at_risk
        .iter()
        .enumerate()
        .map(|(i, &risky)| {
            let mut row = vec![
                Value::from(format!("S{}", i + 1)),
                Value::from(format!("Student {}", i + 1)),
                Value::from(format!("parent{}@example.com", i + 1)),
            ];
            row.extend(
                cohort
                    .required_columns()
                    .iter()
                    .map(|column| feature_value(column, risky, i)),
            );
            row
        })
        .collect();

    DataTable::from_rows(&columns, rows).unwrap()
}

/// Training source holding synthetic tables for both cohorts
pub fn training_source(rows: usize) -> InMemoryTrainingSource {
    InMemoryTrainingSource::new()
        .with_table(Cohort::OneSemester, training_table(Cohort::OneSemester, rows))
        .with_table(Cohort::TwoSemester, training_table(Cohort::TwoSemester, rows))
}

/// Classifier returning `probabilities[row % len]` for each row
pub struct FixedClassifier {
    probabilities: Vec<f64>,
    metadata: ModelMetadata,
    trained: bool,
}

impl Classifier for FixedClassifier {
    fn fit(&mut self, dataset: &TrainingDataset) -> Result<ModelMetrics> {
        self.metadata.n_training_samples = dataset.n_samples;
        self.metadata.n_features = dataset.n_features;
        self.trained = true;
        Ok(ModelMetrics::new())
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        Ok((0..features.nrows())
            .map(|row| self.probabilities[row % self.probabilities.len()])
            .collect())
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn model_type(&self) -> ModelType {
        ModelType::Custom("fixed".into())
    }

    fn is_trained(&self) -> bool {
        self.trained
    }
}

pub fn fixed_factory(probabilities: Vec<f64>) -> ClassifierFactory {
    Arc::new(move |config: &ModelConfig| {
        Box::new(FixedClassifier {
            probabilities: probabilities.clone(),
            metadata: ModelMetadata::new("fixed", ModelType::Custom("fixed".into()), config.seed),
            trained: false,
        }) as Box<dyn Classifier>
    })
}

/// Service whose classifiers return fixed probabilities
pub fn fixed_service(probabilities: Vec<f64>) -> Arc<PredictionService> {
    let pipeline = TrainingPipeline::new(ModelConfig::default())
        .with_classifier_factory(fixed_factory(probabilities));
    Arc::new(PredictionService::with_pipeline(pipeline, 2))
}
