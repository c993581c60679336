use crate::error::Result;
use crate::models::Cohort;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Static training tables, one per cohort
    pub training: TrainingConfig,

    /// Classifier hyperparameters
    #[validate(nested)]
    pub model: ModelConfig,

    /// Request processing limits
    #[serde(default)]
    #[validate(nested)]
    pub processing: ProcessingConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/local.toml".to_string());

        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: DEW_)
            .add_source(
                config::Environment::with_prefix("DEW")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Training table location for a cohort
    pub fn training_path(&self, cohort: Cohort) -> &PathBuf {
        match cohort {
            Cohort::OneSemester => &self.training.one_semester_path,
            Cohort::TwoSemester => &self.training.two_semester_path,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            training: TrainingConfig::default(),
            model: ModelConfig::default(),
            processing: ProcessingConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Training table for the 1-semester cohort
    #[serde(default = "default_one_semester_path")]
    pub one_semester_path: PathBuf,

    /// Training table for the 2-semester cohort
    #[serde(default = "default_two_semester_path")]
    pub two_semester_path: PathBuf,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            one_semester_path: default_one_semester_path(),
            two_semester_path: default_two_semester_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ModelConfig {
    /// SVM regularization strength, multiplied by the per-class weight
    #[serde(default = "default_c")]
    #[validate(range(min = 1e-9))]
    pub c: f64,

    /// Seed recorded with the trained model
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Smallest training table accepted
    #[serde(default = "default_min_training_rows")]
    #[validate(range(min = 2))]
    pub min_training_rows: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            c: default_c(),
            seed: default_seed(),
            min_training_rows: default_min_training_rows(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProcessingConfig {
    /// Upload batches scored at the same time
    #[serde(default = "default_max_concurrent_uploads")]
    #[validate(range(min = 1))]
    pub max_concurrent_uploads: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_concurrent_uploads: default_max_concurrent_uploads(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Service name
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Enable Prometheus metrics
    #[serde(default = "default_true")]
    pub prometheus_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            service_name: default_service_name(),
            prometheus_enabled: true,
        }
    }
}

// Default value functions
fn default_one_semester_path() -> PathBuf {
    PathBuf::from("data/Data(Nosem).csv")
}

fn default_two_semester_path() -> PathBuf {
    PathBuf::from("data/Data(Sem-2).csv")
}

fn default_c() -> f64 {
    1.0
}

fn default_seed() -> u64 {
    42
}

fn default_min_training_rows() -> usize {
    2
}

fn default_max_concurrent_uploads() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "dropout-early-warning".to_string()
}

fn default_true() -> bool {
    true
}
