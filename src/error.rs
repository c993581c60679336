use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// A required structural column is missing after schema normalization
    #[error("Schema error: missing required column(s): {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Cohort-level training failure
    #[error("Training failure ({cohort}): {message}")]
    Training { cohort: String, message: String },

    /// Malformed or empty input table, or cohort unavailable for scoring
    #[error("Inference error: {0}")]
    Inference(String),

    /// Invalid state transition
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflicting operation (e.g. a duplicate booking)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV decoding/encoding errors
    #[error("CSV error: {0}")]
    Csv(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn training(cohort: impl ToString, message: impl Into<String>) -> Self {
        AppError::Training {
            cohort: cohort.to_string(),
            message: message.into(),
        }
    }

    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Schema { .. } => "SCHEMA_ERROR",
            AppError::Training { .. } => "TRAINING_FAILURE",
            AppError::Inference(_) => "INFERENCE_ERROR",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::Csv(_) => "CSV_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error was caused by the caller's input rather than the system
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::Schema { .. }
                | AppError::Inference(_)
                | AppError::NotFound(_)
                | AppError::Conflict(_)
                | AppError::Validation(_)
                | AppError::Csv(_)
        )
    }
}

/// Conversion from csv::Error
impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::Csv(err.to_string())
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;
