//! Student dropout early-warning system
//!
//! Trains one kernel SVM per data shape (1-semester and 2-semester records)
//! at startup, then scores uploaded student tables into dropout
//! probabilities, risk tiers and short remarks. Scored students can be
//! tracked through counselling sessions and weekly attendance.

pub mod analytics;
pub mod config;
pub mod error;
pub mod followup;
pub mod metrics;
pub mod ml;
pub mod models;

pub use config::Config;
pub use error::{AppError, Result};
pub use ml::PredictionService;
