//! Prometheus metrics for the prediction pipeline.
//!
//! Covers training outcomes, cohort readiness, prediction volume by risk
//! tier, unseen-category folds and inference latency.
//!
//! # Example
//! ```no_run
//! use dropout_early_warning::metrics::PREDICTIONS_TOTAL;
//!
//! PREDICTIONS_TOTAL.with_label_values(&["1sem", "High"]).inc();
//! ```

use lazy_static::lazy_static;
use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry};

const NAMESPACE: &str = "dropout_early_warning";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Training Metrics
    // ============================================================================

    /// Training runs per cohort
    ///
    /// Labels: cohort, outcome (trained | failed)
    pub static ref TRAINING_RUNS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("training_runs_total", "Total number of cohort training runs")
            .namespace(NAMESPACE),
        &["cohort", "outcome"]
    ).expect("Failed to create TRAINING_RUNS_TOTAL metric");

    /// 1 when a cohort is ready for inference, 0 otherwise
    ///
    /// Labels: cohort
    pub static ref COHORT_READY: GaugeVec = GaugeVec::new(
        Opts::new("cohort_ready", "Whether a cohort has a trained model")
            .namespace(NAMESPACE),
        &["cohort"]
    ).expect("Failed to create COHORT_READY metric");

    // ============================================================================
    // Inference Metrics
    // ============================================================================

    /// Rows scored
    ///
    /// Labels: cohort, risk_level
    pub static ref PREDICTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("predictions_total", "Total number of rows scored")
            .namespace(NAMESPACE),
        &["cohort", "risk_level"]
    ).expect("Failed to create PREDICTIONS_TOTAL metric");

    /// Cells folded into the unknown category bucket
    ///
    /// Labels: cohort, column
    pub static ref UNKNOWN_CATEGORIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            "unknown_categories_total",
            "Total number of unseen categorical values folded into the unknown bucket"
        )
        .namespace(NAMESPACE),
        &["cohort", "column"]
    ).expect("Failed to create UNKNOWN_CATEGORIES_TOTAL metric");

    /// Failed inference batches
    ///
    /// Labels: cohort, error_code
    pub static ref INFERENCE_ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("inference_errors_total", "Total number of rejected inference batches")
            .namespace(NAMESPACE),
        &["cohort", "error_code"]
    ).expect("Failed to create INFERENCE_ERRORS_TOTAL metric");

    /// Batch inference duration in seconds
    ///
    /// Labels: cohort
    pub static ref INFERENCE_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "inference_duration_seconds",
            "Batch inference duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["cohort"]
    ).expect("Failed to create INFERENCE_DURATION_SECONDS metric");
}

/// Initialize all metrics
///
/// Registers every metric with [`PROMETHEUS_REGISTRY`]. Fails if called twice.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    PROMETHEUS_REGISTRY.register(Box::new(TRAINING_RUNS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(COHORT_READY.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(PREDICTIONS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(UNKNOWN_CATEGORIES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(INFERENCE_ERRORS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(INFERENCE_DURATION_SECONDS.clone()))?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Generate Prometheus text format metrics
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}
