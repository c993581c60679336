//! Dropout risk prediction pipeline
//!
//! Raw upload → schema normalization → categorical encoding → scaling →
//! classifier probability → risk tier and remarks. Two cohorts (1-semester
//! and 2-semester data) are trained independently at startup and held by a
//! [`PredictionService`].

pub mod classifier;
pub mod encoder;
pub mod inference;
pub mod models;
pub mod remarks;
pub mod risk;
pub mod scaler;
pub mod schema;
pub mod service;
pub mod state;
pub mod training;

pub use classifier::{svm_factory, Classifier, ClassifierFactory, SvmClassifier};
pub use encoder::{EncoderSet, EncodingReport, LabelEncoder, UNKNOWN_LABEL};
pub use inference::InferencePipeline;
pub use models::{ClassWeights, ModelMetadata, ModelMetrics, ModelType, TrainingDataset};
pub use risk::{classify, RiskBand, RISK_BANDS};
pub use scaler::{feature_matrix, StandardScaler};
pub use schema::{SchemaNormalizer, HEADER_SYNONYMS};
pub use service::{CohortStatus, PredictionService};
pub use state::{StateTransition, TrainingState};
pub use training::{
    CsvTrainingSource, InMemoryTrainingSource, TrainedCohort, TrainingPipeline, TrainingSource,
};
