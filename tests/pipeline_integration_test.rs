/// Integration tests for the prediction pipeline
///
/// These tests verify the complete flow:
/// - SVM training for both cohorts at startup
/// - Scoring of uploads with identifier columns
/// - Risk tiers at the band boundaries
/// - Remarks attached to scored rows
/// - Per-cohort failure isolation
/// - Training from CSV files on disk
mod common;

use common::{fixed_factory, fixed_service, training_source, training_table, upload_table};
use dropout_early_warning::{
    config::{Config, ModelConfig},
    ml::{
        classify, CsvTrainingSource, InMemoryTrainingSource, PredictionService, SchemaNormalizer,
        TrainingPipeline, TrainingState,
    },
    models::{write_annotated_csv, Cohort, DataTable, RiskTier, Value, TARGET_COLUMN},
    AppError,
};
use std::io::Write;
use std::sync::Arc;

fn svm_service() -> Arc<PredictionService> {
    let service = Arc::new(PredictionService::new(&Config::default()));
    service.train_all(&training_source(40));
    service
}

fn write_csv(table: &DataTable) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    {
        let mut writer = csv::Writer::from_writer(file.as_file_mut());
        writer.write_record(table.columns()).unwrap();
        for row in table.rows() {
            writer
                .write_record(row.iter().map(|v| v.to_string()))
                .unwrap();
        }
        writer.flush().unwrap();
    }
    file.as_file_mut().flush().unwrap();
    file
}

fn reversed(table: &DataTable) -> DataTable {
    let columns: Vec<String> = table.columns().iter().rev().cloned().collect();
    let rows = table
        .rows()
        .iter()
        .map(|row| row.iter().rev().cloned().collect())
        .collect();
    DataTable::new(columns, rows).unwrap()
}

#[test]
fn test_svm_trains_both_cohorts() {
    let service = svm_service();

    for cohort in [Cohort::OneSemester, Cohort::TwoSemester] {
        assert_eq!(service.state(cohort), TrainingState::Trained);

        let model = service.model(cohort).unwrap();
        assert_eq!(model.feature_columns.len(), cohort.required_columns().len());
        assert_eq!(model.metadata().n_training_samples, 40);
    }
}

#[test]
fn test_svm_scores_upload_in_order() {
    let service = svm_service();

    for cohort in [Cohort::OneSemester, Cohort::TwoSemester] {
        let upload = upload_table(cohort, &[true, false, true, false, false]);
        let annotated = service.annotate(cohort, &upload).unwrap();

        assert_eq!(annotated.len(), 5);
        for (i, record) in annotated.iter().enumerate() {
            assert_eq!(record.student_id(), Some(format!("S{}", i + 1)));
            assert!((0.0..=1.0).contains(&record.result.probability));
            assert_eq!(
                record.result.risk_tier,
                classify(record.result.probability).unwrap()
            );
        }
    }
}

#[test]
fn test_column_order_does_not_change_scores() {
    let service = svm_service();
    let upload = upload_table(Cohort::TwoSemester, &[true, false, false, true]);

    let original = service.predict(Cohort::TwoSemester, &upload).unwrap();
    let shuffled = service
        .predict(Cohort::TwoSemester, &reversed(&upload))
        .unwrap();

    assert_eq!(original, shuffled);
}

#[test]
fn test_unseen_category_still_scores() {
    let service = svm_service();
    let mut upload = upload_table(Cohort::OneSemester, &[true, false]);
    upload.map_column("Marital status", |_| Value::from("widowed"));

    let results = service.predict(Cohort::OneSemester, &upload).unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn test_risk_band_boundaries() {
    let service = fixed_service(vec![0.69, 0.70, 0.3999, 0.4, 1.0, 0.0]);
    service.train_all(&training_source(6));

    let upload = upload_table(Cohort::OneSemester, &[false; 6]);
    let tiers: Vec<RiskTier> = service
        .predict(Cohort::OneSemester, &upload)
        .unwrap()
        .into_iter()
        .map(|r| r.risk_tier)
        .collect();

    assert_eq!(
        tiers,
        vec![
            RiskTier::Medium,
            RiskTier::High,
            RiskTier::Low,
            RiskTier::Medium,
            RiskTier::High,
            RiskTier::Low,
        ]
    );
}

#[test]
fn test_remarks_follow_raw_values() {
    let service = fixed_service(vec![0.9]);
    service.train_all(&training_source(6));

    let upload = upload_table(Cohort::TwoSemester, &[true, false]);
    let annotated = service.annotate(Cohort::TwoSemester, &upload).unwrap();

    assert_eq!(
        annotated[0].result.remarks,
        "Tuition fees not up to date, Low previous grade"
    );
    assert_eq!(annotated[1].result.remarks, "Multiple contributing factors.");
}

#[test]
fn test_single_row_remarks_end_to_end() {
    let service = fixed_service(vec![0.2]);
    service.train_all(&training_source(6));

    let mut upload = upload_table(Cohort::OneSemester, &[false]);
    upload.map_column("Tuition fees up to date", |_| Value::Number(0.0));
    upload.map_column("Previous qualification (grade)", |_| Value::Number(90.0));

    let annotated = service.annotate(Cohort::OneSemester, &upload).unwrap();

    assert_eq!(annotated.len(), 1);
    assert!(annotated[0].result.remarks.contains("Tuition fees not up to date"));
    assert!(annotated[0].result.remarks.contains("Low previous grade"));
}

#[test]
fn test_custom_header_synonym_applies_to_training_and_uploads() {
    let pipeline = TrainingPipeline::new(ModelConfig::default())
        .with_classifier_factory(fixed_factory(vec![0.5]))
        .with_normalizer(SchemaNormalizer::new().with_synonym("Age", "Age at enrollment"));
    let service = PredictionService::with_pipeline(pipeline, 2);

    let mut training = training_table(Cohort::OneSemester, 6);
    training.rename_column("Age at enrollment", "Age");
    let source = InMemoryTrainingSource::new().with_table(Cohort::OneSemester, training);
    service.train_cohort(Cohort::OneSemester, &source).unwrap();

    let mut upload = upload_table(Cohort::OneSemester, &[true]);
    upload.rename_column("Age at enrollment", "Age");
    let annotated = service.annotate(Cohort::OneSemester, &upload).unwrap();

    assert_eq!(annotated[0].record.number("Age at enrollment"), Some(27.0));
    assert!(annotated[0].record.get("Age").is_none());
}

#[test]
fn test_missing_columns_default_to_zero() {
    let service = fixed_service(vec![0.5]);
    service.train_all(&training_source(6));

    let mut upload = upload_table(Cohort::OneSemester, &[true, true]);
    upload.drop_column("Debtor");
    upload.drop_column("Scholarship holder");

    let annotated = service.annotate(Cohort::OneSemester, &upload).unwrap();
    assert_eq!(annotated.len(), 2);
    assert!(annotated[0].record.get("Debtor").is_none());
}

#[test]
fn test_wrong_data_shape_is_rejected() {
    let service = fixed_service(vec![0.5]);
    service.train_all(&training_source(6));

    let upload = DataTable::from_rows(
        &["Student ID", "Favourite colour"],
        vec![vec![Value::from("S1"), Value::from("blue")]],
    )
    .unwrap();

    let err = service.annotate(Cohort::TwoSemester, &upload).unwrap_err();
    assert!(matches!(err, AppError::Inference(_)));
    assert!(err.to_string().contains("2sem"));
}

#[test]
fn test_failure_disables_only_that_cohort() {
    let service = fixed_service(vec![0.5]);
    let mut unlabelled = training_table(Cohort::TwoSemester, 6);
    unlabelled.drop_column(TARGET_COLUMN);

    let source = InMemoryTrainingSource::new()
        .with_table(Cohort::OneSemester, training_table(Cohort::OneSemester, 6))
        .with_table(Cohort::TwoSemester, unlabelled);
    let status = service.train_all(&source);

    assert_eq!(status[0].state, TrainingState::Trained);
    assert!(matches!(status[1].state, TrainingState::FailedTraining { .. }));

    let upload = upload_table(Cohort::TwoSemester, &[true]);
    assert!(service.annotate(Cohort::TwoSemester, &upload).is_err());
    assert!(service
        .annotate(Cohort::OneSemester, &upload_table(Cohort::OneSemester, &[true]))
        .is_ok());
}

#[test]
fn test_single_class_training_table_fails() {
    let service = fixed_service(vec![0.5]);
    let mut graduates = training_table(Cohort::OneSemester, 6);
    graduates.map_column(TARGET_COLUMN, |_| Value::from("Graduate"));

    let source = InMemoryTrainingSource::new().with_table(Cohort::OneSemester, graduates);
    service.train_all(&source);

    assert!(!service.is_ready(Cohort::OneSemester));
}

#[test]
fn test_training_from_csv_files() {
    let one = write_csv(&training_table(Cohort::OneSemester, 8));
    let source = CsvTrainingSource::new(one.path(), "/nonexistent/Data(Sem-2).csv");

    let service = fixed_service(vec![0.75]);
    let status = service.train_all(&source);

    assert_eq!(status[0].state, TrainingState::Trained);
    assert!(matches!(status[1].state, TrainingState::FailedTraining { .. }));

    let upload_file = write_csv(&upload_table(Cohort::OneSemester, &[true, false, true]));
    let upload = DataTable::from_csv_path(upload_file.path()).unwrap();
    let annotated = service.annotate(Cohort::OneSemester, &upload).unwrap();

    let mut output = Vec::new();
    write_annotated_csv(&annotated, &mut output).unwrap();
    let text = String::from_utf8(output).unwrap();
    let mut lines = text.lines();

    let header = lines.next().unwrap();
    assert!(header.starts_with("Student ID,Student Name,Parent Mail,"));
    assert!(header.ends_with("Dropout_Probability,Risk_Level,Remarks"));
    assert_eq!(lines.count(), 3);
}
