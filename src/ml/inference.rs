use crate::error::{AppError, Result};
use crate::metrics::{INFERENCE_DURATION_SECONDS, PREDICTIONS_TOTAL, UNKNOWN_CATEGORIES_TOTAL};
use crate::ml::remarks;
use crate::ml::risk;
use crate::ml::scaler::feature_matrix;
use crate::ml::schema::SchemaNormalizer;
use crate::ml::training::TrainedCohort;
use crate::models::{AnnotatedRecord, DataTable, PredictionResult, Value};
use std::time::Instant;
use tracing::{debug, warn};

/// Scores uploaded tables against a trained cohort
#[derive(Debug, Clone, Default)]
pub struct InferencePipeline {
    normalizer: SchemaNormalizer,
}

impl InferencePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_normalizer(normalizer: SchemaNormalizer) -> Self {
        Self { normalizer }
    }

    /// One result per input row, in input order
    pub fn predict(&self, model: &TrainedCohort, raw: &DataTable) -> Result<Vec<PredictionResult>> {
        Ok(self
            .annotate(model, raw)?
            .into_iter()
            .map(|annotated| annotated.result)
            .collect())
    }

    /// Each normalized input row paired with its prediction, in input order.
    ///
    /// All-or-nothing: any structural problem fails the whole batch.
    pub fn annotate(&self, model: &TrainedCohort, raw: &DataTable) -> Result<Vec<AnnotatedRecord>> {
        let started = Instant::now();
        let cohort = model.cohort.to_string();

        if raw.is_empty() {
            return Err(AppError::Inference("uploaded table has no rows".to_string()));
        }

        let normalized = self.normalizer.normalize(raw);

        let required = model.cohort.required_columns();
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|column| !normalized.has_column(column))
            .collect();
        if missing.len() == required.len() {
            return Err(AppError::Inference(format!(
                "table does not match the {} data shape: none of its required columns are present",
                cohort
            )));
        }
        if !missing.is_empty() {
            warn!(
                cohort = %cohort,
                missing = missing.len(),
                columns = ?missing,
                "Required columns absent, defaulting to 0"
            );
        }

        let reindexed = normalized.reindex(&model.feature_columns, &Value::Number(0.0));

        let (encoded, report) = model.encoders.transform(&reindexed);
        for (column, count) in &report.folded {
            UNKNOWN_CATEGORIES_TOTAL
                .with_label_values(&[cohort.as_str(), column.as_str()])
                .inc_by(*count as f64);
        }

        let matrix = feature_matrix(&encoded)?;
        let scaled = model.scaler.transform(&model.feature_columns, &matrix)?;
        let probabilities = model.classifier.predict_proba(&scaled)?;

        if probabilities.len() != normalized.len() {
            return Err(AppError::Inference(format!(
                "classifier returned {} probabilities for {} rows",
                probabilities.len(),
                normalized.len()
            )));
        }

        let annotated = normalized
            .records()
            .zip(probabilities.iter())
            .map(|(record, &probability)| {
                let risk_tier = risk::classify(probability)
                    .map_err(|e| AppError::Inference(e.to_string()))?;
                let remarks = remarks::generate(&record);
                Ok(AnnotatedRecord::new(
                    record,
                    PredictionResult {
                        probability,
                        risk_tier,
                        remarks,
                    },
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        for record in &annotated {
            let tier = record.result.risk_tier.to_string();
            PREDICTIONS_TOTAL
                .with_label_values(&[cohort.as_str(), tier.as_str()])
                .inc();
        }
        INFERENCE_DURATION_SECONDS
            .with_label_values(&[cohort.as_str()])
            .observe(started.elapsed().as_secs_f64());

        debug!(
            cohort = %cohort,
            rows = annotated.len(),
            unknown_categories = report.total(),
            "Scored upload"
        );

        Ok(annotated)
    }
}
