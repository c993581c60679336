use crate::error::{AppError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Training matrix for one cohort
#[derive(Debug, Clone)]
pub struct TrainingDataset {
    /// Feature matrix (n_samples × n_features), already encoded and scaled
    pub features: Array2<f64>,

    /// `true` for the positive (dropout) class
    pub labels: Array1<bool>,

    /// Feature column names, in matrix order
    pub feature_names: Vec<String>,

    /// Number of samples
    pub n_samples: usize,

    /// Number of features
    pub n_features: usize,
}

impl TrainingDataset {
    pub fn new(features: Array2<f64>, labels: Array1<bool>, feature_names: Vec<String>) -> Result<Self> {
        let (n_samples, n_features) = features.dim();

        if labels.len() != n_samples {
            return Err(AppError::Validation(format!(
                "{} labels for {} samples",
                labels.len(),
                n_samples
            )));
        }
        if feature_names.len() != n_features {
            return Err(AppError::Validation(format!(
                "{} feature names for {} features",
                feature_names.len(),
                n_features
            )));
        }

        Ok(Self {
            features,
            labels,
            feature_names,
            n_samples,
            n_features,
        })
    }

    /// (positive, negative) sample counts
    pub fn class_counts(&self) -> (usize, usize) {
        let positive = self.labels.iter().filter(|&&label| label).count();
        (positive, self.n_samples - positive)
    }

    /// Balanced class weights: `n_samples / (2 · n_class)` per class
    pub fn class_weights(&self) -> ClassWeights {
        let (positive, negative) = self.class_counts();
        let n = self.n_samples as f64;
        let weight = |count: usize| {
            if count == 0 {
                0.0
            } else {
                n / (2.0 * count as f64)
            }
        };

        ClassWeights {
            positive: weight(positive),
            negative: weight(negative),
        }
    }
}

/// Per-class multipliers of the regularization parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    pub positive: f64,
    pub negative: f64,
}

/// Model evaluation metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Accuracy
    pub accuracy: f64,

    /// Precision (positive class)
    pub precision: f64,

    /// Recall (positive class)
    pub recall: f64,

    /// F1 score
    pub f1_score: f64,

    /// Per-class metrics
    pub per_class_metrics: HashMap<String, ClassMetrics>,
}

/// Per-class evaluation metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self {
            accuracy: 0.0,
            precision: 0.0,
            recall: 0.0,
            f1_score: 0.0,
            per_class_metrics: HashMap::new(),
        }
    }

    /// Binary metrics; headline precision/recall/F1 refer to the positive class
    pub fn from_predictions(y_true: &[bool], y_pred: &[bool]) -> Self {
        let n_samples = y_true.len();
        if n_samples == 0 {
            return Self::new();
        }

        let correct = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(t, p)| t == p)
            .count();
        let accuracy = correct as f64 / n_samples as f64;

        let mut per_class = HashMap::new();
        for (name, class) in [("dropout", true), ("other", false)] {
            per_class.insert(name.to_string(), Self::class_metrics(y_true, y_pred, class));
        }

        let positive = per_class
            .get("dropout")
            .cloned()
            .unwrap_or_else(|| Self::class_metrics(y_true, y_pred, true));

        Self {
            accuracy,
            precision: positive.precision,
            recall: positive.recall,
            f1_score: positive.f1_score,
            per_class_metrics: per_class,
        }
    }

    fn class_metrics(y_true: &[bool], y_pred: &[bool], class: bool) -> ClassMetrics {
        let pairs = || y_true.iter().zip(y_pred.iter());

        let tp = pairs().filter(|(t, p)| **t == class && **p == class).count();
        let fp = pairs().filter(|(t, p)| **t != class && **p == class).count();
        let fn_count = pairs().filter(|(t, p)| **t == class && **p != class).count();

        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };

        let recall = if tp + fn_count > 0 {
            tp as f64 / (tp + fn_count) as f64
        } else {
            0.0
        };

        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        ClassMetrics {
            precision,
            recall,
            f1_score,
            support: y_true.iter().filter(|&&t| t == class).count(),
        }
    }
}

impl Default for ModelMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Model metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Model name
    pub name: String,

    /// Model version
    pub version: String,

    /// Model type
    pub model_type: ModelType,

    /// Training timestamp
    pub trained_at: chrono::DateTime<chrono::Utc>,

    /// Number of training samples
    pub n_training_samples: usize,

    /// Number of features
    pub n_features: usize,

    /// Seed the model was trained with
    pub seed: u64,

    /// Training metrics
    pub training_metrics: ModelMetrics,

    /// Hyperparameters
    pub hyperparameters: HashMap<String, String>,
}

impl ModelMetadata {
    pub fn new(name: impl Into<String>, model_type: ModelType, seed: u64) -> Self {
        Self {
            name: name.into(),
            version: "1.0".to_string(),
            model_type,
            trained_at: chrono::Utc::now(),
            n_training_samples: 0,
            n_features: 0,
            seed,
            training_metrics: ModelMetrics::new(),
            hyperparameters: HashMap::new(),
        }
    }

    pub fn with_hyperparameter(mut self, key: &str, value: impl ToString) -> Self {
        self.hyperparameters.insert(key.to_string(), value.to_string());
        self
    }
}

/// Model type enumeration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    /// Kernel SVM with Platt-scaled probabilities
    GaussianSvm,
    /// Any other implementation plugged in behind [`Classifier`](crate::ml::Classifier)
    Custom(String),
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelType::GaussianSvm => write!(f, "Gaussian SVM"),
            ModelType::Custom(name) => write!(f, "{}", name),
        }
    }
}
