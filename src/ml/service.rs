use crate::config::Config;
use crate::error::{AppError, Result};
use crate::metrics::{COHORT_READY, INFERENCE_ERRORS_TOTAL, TRAINING_RUNS_TOTAL};
use crate::ml::inference::InferencePipeline;
use crate::ml::models::ModelMetadata;
use crate::ml::state::{StateData, TrainingState};
use crate::ml::training::{TrainedCohort, TrainingPipeline, TrainingSource};
use crate::models::{AnnotatedRecord, Cohort, DataTable, PredictionResult};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// Training state and published artifacts of one cohort
struct CohortSlot {
    state: Mutex<StateData>,
    model: OnceCell<Arc<TrainedCohort>>,
}

impl CohortSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(StateData::new()),
            model: OnceCell::new(),
        }
    }
}

/// Holds both cohorts' trained artifacts and serves predictions against them
pub struct PredictionService {
    /// Indexed by [`Cohort::index`]
    slots: [CohortSlot; 2],

    training: TrainingPipeline,

    inference: InferencePipeline,

    /// Bounds the number of uploads scored at once
    upload_permits: Arc<Semaphore>,
}

impl PredictionService {
    /// Create a service from the application configuration
    pub fn new(config: &Config) -> Self {
        Self::with_pipeline(
            TrainingPipeline::new(config.model.clone()),
            config.processing.max_concurrent_uploads,
        )
    }

    /// Create a service around a custom training pipeline
    pub fn with_pipeline(training: TrainingPipeline, max_concurrent_uploads: usize) -> Self {
        let inference = InferencePipeline::with_normalizer(training.normalizer().clone());
        Self {
            slots: [CohortSlot::new(), CohortSlot::new()],
            training,
            inference,
            upload_permits: Arc::new(Semaphore::new(max_concurrent_uploads.max(1))),
        }
    }

    fn slot(&self, cohort: Cohort) -> &CohortSlot {
        &self.slots[cohort.index()]
    }

    /// Train both cohorts concurrently. A failing cohort is disabled; the
    /// other is unaffected.
    pub fn train_all(&self, source: &dyn TrainingSource) -> Vec<CohortStatus> {
        info!("🚀 Training cohort models");

        let (one, two) = rayon::join(
            || self.train_cohort(Cohort::OneSemester, source),
            || self.train_cohort(Cohort::TwoSemester, source),
        );

        let ready = [one, two].iter().filter(|result| result.is_ok()).count();
        info!(ready, total = 2, "Cohort training finished");

        self.status()
    }

    /// Train and publish one cohort. Allowed once per cohort.
    pub fn train_cohort(&self, cohort: Cohort, source: &dyn TrainingSource) -> Result<()> {
        let slot = self.slot(cohort);
        let label = cohort.to_string();

        let started = slot.state.lock().transition_to(TrainingState::Training)?;
        Self::record_readiness(&label, &started.to);

        match self.training.train(cohort, source) {
            Ok(trained) => {
                if slot.model.set(Arc::new(trained)).is_err() {
                    let reason = "artifacts already published".to_string();
                    let failed = slot
                        .state
                        .lock()
                        .transition_to(TrainingState::FailedTraining { reason: reason.clone() })?;
                    Self::record_readiness(&label, &failed.to);
                    return Err(AppError::Internal(reason));
                }
                let trained = slot.state.lock().transition_to(TrainingState::Trained)?;

                TRAINING_RUNS_TOTAL
                    .with_label_values(&[label.as_str(), "trained"])
                    .inc();
                Self::record_readiness(&label, &trained.to);
                info!(cohort = %cohort, "✅ Cohort ready for predictions");
                Ok(())
            }
            Err(e) => {
                error!(cohort = %cohort, error = %e, "Cohort training failed, cohort disabled");
                let failed = slot.state.lock().transition_to(TrainingState::FailedTraining {
                    reason: e.to_string(),
                })?;
                Self::record_readiness(&label, &failed.to);
                TRAINING_RUNS_TOTAL
                    .with_label_values(&[label.as_str(), "failed"])
                    .inc();
                Err(e)
            }
        }
    }

    fn record_readiness(cohort: &str, state: &TrainingState) {
        COHORT_READY
            .with_label_values(&[cohort])
            .set(state.to_metric_value());
    }

    /// Current training state of a cohort
    pub fn state(&self, cohort: Cohort) -> TrainingState {
        self.slot(cohort).state.lock().state.clone()
    }

    pub fn is_ready(&self, cohort: Cohort) -> bool {
        self.slot(cohort).model.get().is_some()
    }

    /// Published artifacts of a trained cohort
    pub fn model(&self, cohort: Cohort) -> Result<Arc<TrainedCohort>> {
        self.slot(cohort).model.get().cloned().ok_or_else(|| {
            AppError::Inference(format!(
                "cohort {} is not available ({})",
                cohort,
                self.state(cohort)
            ))
        })
    }

    /// Score a table against a cohort
    pub fn predict(&self, cohort: Cohort, table: &DataTable) -> Result<Vec<PredictionResult>> {
        Ok(self
            .annotate(cohort, table)?
            .into_iter()
            .map(|annotated| annotated.result)
            .collect())
    }

    /// Score a table and keep each input row next to its result
    pub fn annotate(&self, cohort: Cohort, table: &DataTable) -> Result<Vec<AnnotatedRecord>> {
        let result = self
            .model(cohort)
            .and_then(|model| self.inference.annotate(&model, table));

        if let Err(e) = &result {
            warn!(cohort = %cohort, error = %e, "Upload rejected");
            INFERENCE_ERRORS_TOTAL
                .with_label_values(&[cohort.to_string().as_str(), e.error_code()])
                .inc();
        }

        result
    }

    /// Score several independent uploads in parallel
    pub fn predict_many(&self, requests: &[(Cohort, DataTable)]) -> Vec<Result<Vec<AnnotatedRecord>>> {
        requests
            .par_iter()
            .map(|(cohort, table)| self.annotate(*cohort, table))
            .collect()
    }

    /// Score an upload on the blocking pool, at most
    /// `processing.max_concurrent_uploads` at a time
    pub async fn predict_upload(
        self: &Arc<Self>,
        cohort: Cohort,
        table: DataTable,
    ) -> Result<Vec<AnnotatedRecord>> {
        let permit = self
            .upload_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("upload pool closed: {}", e)))?;

        let service = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            service.annotate(cohort, &table)
        })
        .await
        .map_err(|e| AppError::Internal(format!("scoring task failed: {}", e)))?
    }

    /// Per-cohort state and model metadata
    pub fn status(&self) -> Vec<CohortStatus> {
        Cohort::iter()
            .map(|cohort| {
                let model = self.slot(cohort).model.get();
                CohortStatus {
                    cohort,
                    state: self.state(cohort),
                    feature_columns: model.map(|m| m.feature_columns.len()).unwrap_or(0),
                    metadata: model.map(|m| m.metadata().clone()),
                }
            })
            .collect()
    }
}

/// Snapshot of one cohort for status reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortStatus {
    pub cohort: Cohort,
    pub state: TrainingState,
    pub feature_columns: usize,
    pub metadata: Option<ModelMetadata>,
}
