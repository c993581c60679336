use crate::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::ml::models::{ModelMetadata, ModelMetrics, ModelType, TrainingDataset};
use crate::ml::scaler::MIN_STD;
use linfa::dataset::{Dataset, Pr};
use linfa::traits::{Fit, Predict};
use linfa_svm::Svm;
use ndarray::{Array1, Array2};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Binary probabilistic classifier plugged into the training pipeline
pub trait Classifier: Send + Sync {
    /// Train the classifier
    fn fit(&mut self, dataset: &TrainingDataset) -> Result<ModelMetrics>;

    /// Probability of the positive class per row, each in [0, 1]
    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array1<f64>>;

    /// Predict class labels at the 0.5 threshold
    fn predict(&self, features: &Array2<f64>) -> Result<Vec<bool>> {
        Ok(self
            .predict_proba(features)?
            .iter()
            .map(|&p| p >= 0.5)
            .collect())
    }

    /// Get model metadata
    fn metadata(&self) -> &ModelMetadata;

    /// Get model type
    fn model_type(&self) -> ModelType;

    /// Check if model is trained
    fn is_trained(&self) -> bool;
}

/// Builds an untrained classifier for a cohort
pub type ClassifierFactory = Arc<dyn Fn(&ModelConfig) -> Box<dyn Classifier> + Send + Sync>;

/// Factory producing [`SvmClassifier`]s from the model configuration
pub fn svm_factory() -> ClassifierFactory {
    Arc::new(|config: &ModelConfig| {
        Box::new(SvmClassifier::new(config.c, config.seed)) as Box<dyn Classifier>
    })
}

/// RBF-kernel SVM with Platt-scaled probabilities and balanced class weights
pub struct SvmClassifier {
    /// Model metadata
    metadata: ModelMetadata,

    /// Trained model
    model: Option<Svm<f64, Pr>>,

    /// Regularization parameter before class weighting
    c: f64,
}

impl SvmClassifier {
    pub fn new(c: f64, seed: u64) -> Self {
        Self {
            metadata: ModelMetadata::new("Dropout SVM", ModelType::GaussianSvm, seed)
                .with_hyperparameter("c", c)
                .with_hyperparameter("kernel", "rbf")
                .with_hyperparameter("class_weight", "balanced"),
            model: None,
            c,
        }
    }

    /// Kernel width equivalent to `gamma = 1 / (n_features · var(X))`
    fn gaussian_eps(features: &Array2<f64>) -> f64 {
        let n_features = features.ncols().max(1) as f64;
        let variance = features.var(0.0);
        if variance.is_finite() && variance > MIN_STD {
            n_features * variance
        } else {
            n_features
        }
    }
}

impl fmt::Debug for SvmClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SvmClassifier")
            .field("c", &self.c)
            .field("trained", &self.model.is_some())
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl Classifier for SvmClassifier {
    fn fit(&mut self, dataset: &TrainingDataset) -> Result<ModelMetrics> {
        let (positive, negative) = dataset.class_counts();
        if positive == 0 || negative == 0 {
            return Err(AppError::Validation(
                "training labels contain a single class".to_string(),
            ));
        }

        let weights = dataset.class_weights();
        let eps = Self::gaussian_eps(&dataset.features);
        debug!(
            samples = dataset.n_samples,
            features = dataset.n_features,
            eps,
            c_pos = self.c * weights.positive,
            c_neg = self.c * weights.negative,
            "Fitting SVM"
        );

        let records = Dataset::new(dataset.features.clone(), dataset.labels.clone());
        let model = Svm::<f64, Pr>::params()
            .pos_neg_weights(self.c * weights.positive, self.c * weights.negative)
            .gaussian_kernel(eps)
            .fit(&records)
            .map_err(|e| AppError::Internal(format!("Failed to train SVM: {}", e)))?;

        self.model = Some(model);

        let predictions = self.predict(&dataset.features)?;
        let metrics = ModelMetrics::from_predictions(&dataset.labels.to_vec(), &predictions);

        self.metadata.n_training_samples = dataset.n_samples;
        self.metadata.n_features = dataset.n_features;
        self.metadata.trained_at = chrono::Utc::now();
        self.metadata.training_metrics = metrics.clone();
        self.metadata
            .hyperparameters
            .insert("eps".to_string(), eps.to_string());

        Ok(metrics)
    }

    fn predict_proba(&self, features: &Array2<f64>) -> Result<Array1<f64>> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| AppError::Inference("Model not trained".to_string()))?;

        let predictions: Array1<Pr> = model.predict(features);
        predictions
            .iter()
            .map(|p| {
                let probability = f64::from(**p);
                if probability.is_nan() {
                    Err(AppError::Inference(
                        "classifier produced a NaN probability".to_string(),
                    ))
                } else {
                    Ok(probability.clamp(0.0, 1.0))
                }
            })
            .collect()
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn model_type(&self) -> ModelType {
        ModelType::GaussianSvm
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }
}
