use crate::config::{ModelConfig, TrainingConfig};
use crate::error::{AppError, Result};
use crate::ml::classifier::{svm_factory, Classifier, ClassifierFactory};
use crate::ml::encoder::EncoderSet;
use crate::ml::models::{ModelMetadata, ModelMetrics, TrainingDataset};
use crate::ml::scaler::{feature_matrix, StandardScaler};
use crate::ml::schema::SchemaNormalizer;
use crate::models::{is_id_column, Cohort, DataTable, POSITIVE_LABEL, TARGET_COLUMN};
use ndarray::Array1;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Where a cohort's training table comes from
pub trait TrainingSource: Send + Sync {
    /// Load the raw training table for a cohort
    fn load(&self, cohort: Cohort) -> Result<DataTable>;

    /// Human-readable location, for logs
    fn describe(&self, cohort: Cohort) -> String {
        cohort.to_string()
    }
}

/// Training tables read from CSV files on disk
#[derive(Debug, Clone)]
pub struct CsvTrainingSource {
    one_semester_path: PathBuf,
    two_semester_path: PathBuf,
}

impl CsvTrainingSource {
    pub fn new(one_semester_path: impl Into<PathBuf>, two_semester_path: impl Into<PathBuf>) -> Self {
        Self {
            one_semester_path: one_semester_path.into(),
            two_semester_path: two_semester_path.into(),
        }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(&config.one_semester_path, &config.two_semester_path)
    }

    fn path(&self, cohort: Cohort) -> &PathBuf {
        match cohort {
            Cohort::OneSemester => &self.one_semester_path,
            Cohort::TwoSemester => &self.two_semester_path,
        }
    }
}

impl TrainingSource for CsvTrainingSource {
    fn load(&self, cohort: Cohort) -> Result<DataTable> {
        DataTable::from_csv_path(self.path(cohort))
    }

    fn describe(&self, cohort: Cohort) -> String {
        self.path(cohort).display().to_string()
    }
}

/// Training tables already held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryTrainingSource {
    tables: HashMap<Cohort, DataTable>,
}

impl InMemoryTrainingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, cohort: Cohort, table: DataTable) -> Self {
        self.tables.insert(cohort, table);
        self
    }
}

impl TrainingSource for InMemoryTrainingSource {
    fn load(&self, cohort: Cohort) -> Result<DataTable> {
        self.tables
            .get(&cohort)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no training table for cohort {}", cohort)))
    }
}

/// Artifacts produced by training one cohort; read-only once published
pub struct TrainedCohort {
    pub cohort: Cohort,

    /// Feature columns in the exact order the scaler and classifier expect
    pub feature_columns: Vec<String>,

    pub encoders: EncoderSet,

    pub scaler: StandardScaler,

    pub classifier: Box<dyn Classifier>,

    pub training_metrics: ModelMetrics,
}

impl TrainedCohort {
    pub fn metadata(&self) -> &ModelMetadata {
        self.classifier.metadata()
    }
}

impl fmt::Debug for TrainedCohort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedCohort")
            .field("cohort", &self.cohort)
            .field("feature_columns", &self.feature_columns.len())
            .field("encoders", &self.encoders.len())
            .field("model_type", &self.classifier.model_type())
            .field("training_metrics", &self.training_metrics)
            .finish()
    }
}

/// Encode, scale and fit one cohort from its raw training table
#[derive(Clone)]
pub struct TrainingPipeline {
    normalizer: SchemaNormalizer,
    model_config: ModelConfig,
    classifier_factory: ClassifierFactory,
}

impl TrainingPipeline {
    pub fn new(model_config: ModelConfig) -> Self {
        Self {
            normalizer: SchemaNormalizer::new(),
            model_config,
            classifier_factory: svm_factory(),
        }
    }

    /// Swap the classifier implementation
    pub fn with_classifier_factory(mut self, factory: ClassifierFactory) -> Self {
        self.classifier_factory = factory;
        self
    }

    /// Replace the header normalizer; the service scores uploads with the same one
    pub fn with_normalizer(mut self, normalizer: SchemaNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn normalizer(&self) -> &SchemaNormalizer {
        &self.normalizer
    }

    pub fn model_config(&self) -> &ModelConfig {
        &self.model_config
    }

    /// Load the cohort's table from `source` and train on it
    pub fn train(&self, cohort: Cohort, source: &dyn TrainingSource) -> Result<TrainedCohort> {
        info!(cohort = %cohort, source = %source.describe(cohort), "Loading training table");

        let raw = source.load(cohort).map_err(|e| {
            AppError::training(cohort, format!("cannot load training table: {}", e))
        })?;

        self.train_table(cohort, &raw)
    }

    /// Train a cohort on an already loaded table.
    ///
    /// Every failure is reported as a training error for `cohort`.
    pub fn train_table(&self, cohort: Cohort, raw: &DataTable) -> Result<TrainedCohort> {
        let fail = |message: String| AppError::training(cohort, message);

        if raw.is_empty() {
            return Err(fail("training table is empty".to_string()));
        }

        let mut table = self
            .normalizer
            .normalize_and_require(raw, &cohort.training_columns())
            .map_err(|e| fail(e.to_string()))?;

        if table.len() < self.model_config.min_training_rows {
            return Err(fail(format!(
                "{} rows, at least {} required",
                table.len(),
                self.model_config.min_training_rows
            )));
        }

        let identifiers: Vec<String> = table
            .columns()
            .iter()
            .filter(|column| is_id_column(column))
            .cloned()
            .collect();
        for column in &identifiers {
            table.drop_column(column);
            debug!(cohort = %cohort, column = %column, "Dropped identifier column");
        }

        let labels: Array1<bool> = table
            .column_values(TARGET_COLUMN)
            .ok_or_else(|| fail(format!("missing label column '{}'", TARGET_COLUMN)))?
            .map(|value| value.as_label().trim() == POSITIVE_LABEL)
            .collect();

        let positives = labels.iter().filter(|&&label| label).count();
        if positives == 0 || positives == labels.len() {
            return Err(fail("label column contains a single class".to_string()));
        }
        table.drop_column(TARGET_COLUMN);

        let feature_columns = table.columns().to_vec();
        if feature_columns.is_empty() {
            return Err(fail("no feature columns left".to_string()));
        }

        let (encoders, encoded) = EncoderSet::fit_transform(&table, &[]);
        let matrix = feature_matrix(&encoded).map_err(|e| fail(e.to_string()))?;
        let (scaler, scaled) =
            StandardScaler::fit_transform(&feature_columns, &matrix).map_err(|e| fail(e.to_string()))?;

        let dataset = TrainingDataset::new(scaled, labels, feature_columns.clone())
            .map_err(|e| fail(e.to_string()))?;

        let mut classifier = (self.classifier_factory)(&self.model_config);
        let training_metrics = classifier
            .fit(&dataset)
            .map_err(|e| fail(e.to_string()))?;

        info!(
            cohort = %cohort,
            rows = dataset.n_samples,
            features = dataset.n_features,
            categorical = encoders.len(),
            dropouts = positives,
            accuracy = training_metrics.accuracy,
            "Cohort model trained"
        );

        Ok(TrainedCohort {
            cohort,
            feature_columns,
            encoders,
            scaler,
            classifier,
            training_metrics,
        })
    }
}

impl fmt::Debug for TrainingPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainingPipeline")
            .field("normalizer", &self.normalizer)
            .field("model_config", &self.model_config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Value, REQUIRED_COLUMNS_1SEM};
    use ndarray::Array2;

    struct MeanClassifier {
        metadata: ModelMetadata,
        trained: bool,
    }

    impl Classifier for MeanClassifier {
        fn fit(&mut self, dataset: &TrainingDataset) -> Result<ModelMetrics> {
            self.trained = true;
            self.metadata.n_training_samples = dataset.n_samples;
            Ok(ModelMetrics::new())
        }

        fn predict_proba(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
            Ok(Array1::from_elem(features.nrows(), 0.5))
        }

        fn metadata(&self) -> &ModelMetadata {
            &self.metadata
        }

        fn model_type(&self) -> crate::ml::models::ModelType {
            self.metadata.model_type.clone()
        }

        fn is_trained(&self) -> bool {
            self.trained
        }
    }

    fn pipeline() -> TrainingPipeline {
        TrainingPipeline::new(ModelConfig::default()).with_classifier_factory(std::sync::Arc::new(
            |config: &ModelConfig| {
                Box::new(MeanClassifier {
                    metadata: ModelMetadata::new(
                        "mean",
                        crate::ml::models::ModelType::Custom("mean".into()),
                        config.seed,
                    ),
                    trained: false,
                }) as Box<dyn Classifier>
            },
        ))
    }

    fn training_table(targets: &[&str]) -> DataTable {
        let mut columns: Vec<&str> = vec!["Student ID"];
        columns.extend(REQUIRED_COLUMNS_1SEM.iter());
        columns.push(TARGET_COLUMN);

        let rows = targets
            .iter()
            .enumerate()
            .map(|(i, target)| {
                let mut row = vec![Value::from(format!("S{}", i))];
                row.extend(REQUIRED_COLUMNS_1SEM.iter().enumerate().map(|(j, column)| {
                    if *column == "Marital status" {
                        Value::from(if i % 2 == 0 { "single" } else { "married" })
                    } else {
                        Value::Number((i * j) as f64)
                    }
                }));
                row.push(Value::from(*target));
                row
            })
            .collect();

        DataTable::from_rows(&columns, rows).unwrap()
    }

    #[test]
    fn test_trains_and_drops_identifiers() {
        let table = training_table(&["Dropout", "Graduate", "Enrolled", "Dropout"]);
        let trained = pipeline().train_table(Cohort::OneSemester, &table).unwrap();

        assert_eq!(trained.cohort, Cohort::OneSemester);
        assert_eq!(trained.feature_columns.len(), REQUIRED_COLUMNS_1SEM.len());
        assert!(!trained.feature_columns.iter().any(|c| c == "Student ID"));
        assert!(!trained.feature_columns.iter().any(|c| c == TARGET_COLUMN));
        assert_eq!(trained.feature_columns[0], "Marital status");
        assert_eq!(trained.encoders.columns().collect::<Vec<_>>(), vec!["Marital status"]);
        assert_eq!(trained.metadata().n_training_samples, 4);
        assert_eq!(trained.metadata().seed, 42);
    }

    #[test]
    fn test_empty_table_fails() {
        let table = training_table(&[]);
        let err = pipeline().train_table(Cohort::OneSemester, &table).unwrap_err();
        assert!(matches!(err, AppError::Training { ref cohort, .. } if cohort == "1sem"));
    }

    #[test]
    fn test_label_less_table_fails() {
        let mut table = training_table(&["Dropout", "Graduate"]);
        table.drop_column(TARGET_COLUMN);
        let err = pipeline().train_table(Cohort::OneSemester, &table).unwrap_err();
        assert!(err.to_string().contains("Target"));
    }

    #[test]
    fn test_single_class_fails() {
        let table = training_table(&["Graduate", "Enrolled", "Graduate"]);
        let err = pipeline().train_table(Cohort::OneSemester, &table).unwrap_err();
        assert!(err.to_string().contains("single class"));
    }

    #[test]
    fn test_wrong_shape_fails_for_two_semester() {
        let table = training_table(&["Dropout", "Graduate"]);
        let err = pipeline().train_table(Cohort::TwoSemester, &table).unwrap_err();
        assert!(err.to_string().contains("Curricular units 2nd sem"));
    }

    #[test]
    fn test_in_memory_source() {
        let source = InMemoryTrainingSource::new()
            .with_table(Cohort::OneSemester, training_table(&["Dropout", "Graduate"]));

        assert!(pipeline().train(Cohort::OneSemester, &source).is_ok());
        let err = pipeline().train(Cohort::TwoSemester, &source).unwrap_err();
        assert!(matches!(err, AppError::Training { .. }));
    }

    #[test]
    fn test_missing_csv_file_fails() {
        let source = CsvTrainingSource::new("/nonexistent/1sem.csv", "/nonexistent/2sem.csv");
        let err = pipeline().train(Cohort::OneSemester, &source).unwrap_err();
        assert!(err.to_string().contains("cannot load training table"));
    }
}
