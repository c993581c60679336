// Prediction Pipeline Performance Benchmarks
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dropout_early_warning::config::Config;
use dropout_early_warning::ml::{classify, remarks, InMemoryTrainingSource, PredictionService};
use dropout_early_warning::models::{Cohort, DataTable, Value, TARGET_COLUMN};

fn student_value(column: &str, at_risk: bool, i: usize) -> Value {
    let number = match column {
        "Marital status" => return Value::from(if i % 3 == 0 { "married" } else { "single" }),
        "Course" => [9254.0, 9500.0, 171.0][i % 3],
        "Tuition fees up to date" | "Scholarship holder" => f64::from(u8::from(!at_risk)),
        "Debtor" => f64::from(u8::from(at_risk)),
        "Previous qualification (grade)" if at_risk => 95.0 + (i % 5) as f64,
        "Previous qualification (grade)" => 140.0 + (i % 7) as f64,
        "Age at enrollment" if at_risk => 27.0 + (i % 4) as f64,
        "Age at enrollment" => 19.0 + (i % 3) as f64,
        c if c.ends_with("(approved)") && at_risk => 0.0,
        c if c.ends_with("(approved)") => 5.0 + (i % 2) as f64,
        c if c.ends_with("(enrolled)") => 6.0,
        c if c.ends_with("(grade)") && at_risk => 0.0,
        c if c.ends_with("(grade)") => 12.5 + (i % 4) as f64 * 0.5,
        _ => (i % 2) as f64,
    };
    Value::Number(number)
}

fn student_table(cohort: Cohort, rows: usize, labelled: bool) -> DataTable {
    let features = cohort.required_columns();
    let mut columns = features.clone();
    if labelled {
        columns.push(TARGET_COLUMN);
    }

    let rows = (0..rows)
        .map(|i| {
            let at_risk = i % 2 == 0;
            let mut row: Vec<Value> = features
                .iter()
                .map(|column| student_value(column, at_risk, i))
                .collect();
            if labelled {
                row.push(Value::from(if at_risk { "Dropout" } else { "Graduate" }));
            }
            row
        })
        .collect();

    DataTable::from_rows(&columns, rows).unwrap()
}

fn trained_service() -> PredictionService {
    let service = PredictionService::new(&Config::default());
    let source = InMemoryTrainingSource::new()
        .with_table(Cohort::OneSemester, student_table(Cohort::OneSemester, 200, true))
        .with_table(Cohort::TwoSemester, student_table(Cohort::TwoSemester, 200, true));
    service.train_all(&source);
    service
}

fn pipeline_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_training");
    group.sample_size(10);

    for rows in [50, 200].iter() {
        let table = student_table(Cohort::TwoSemester, *rows, true);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| {
                let service = PredictionService::new(&Config::default());
                let source =
                    InMemoryTrainingSource::new().with_table(Cohort::TwoSemester, table.clone());
                black_box(service.train_cohort(Cohort::TwoSemester, &source))
            });
        });
    }
    group.finish();
}

fn pipeline_inference(c: &mut Criterion) {
    let service = trained_service();
    let mut group = c.benchmark_group("pipeline_inference");

    for rows in [10, 100, 1000].iter() {
        let upload = student_table(Cohort::OneSemester, *rows, false);
        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &upload, |b, upload| {
            b.iter(|| black_box(service.annotate(Cohort::OneSemester, upload)));
        });
    }
    group.finish();
}

fn pipeline_predict_many(c: &mut Criterion) {
    let service = trained_service();
    let requests: Vec<(Cohort, DataTable)> = (0..8)
        .map(|i| {
            let cohort = if i % 2 == 0 {
                Cohort::OneSemester
            } else {
                Cohort::TwoSemester
            };
            (cohort, student_table(cohort, 100, false))
        })
        .collect();

    c.bench_function("pipeline_predict_many_8x100", |b| {
        b.iter(|| black_box(service.predict_many(&requests)));
    });
}

fn risk_and_remarks(c: &mut Criterion) {
    c.bench_function("risk_classify", |b| {
        b.iter(|| {
            for i in 0..=100 {
                let _ = black_box(classify(black_box(i as f64 / 100.0)));
            }
        });
    });

    let table = student_table(Cohort::OneSemester, 100, false);
    let records: Vec<_> = table.records().collect();
    c.bench_function("remarks_generate_100", |b| {
        b.iter(|| {
            for record in &records {
                black_box(remarks::generate(record));
            }
        });
    });
}

criterion_group!(
    benches,
    pipeline_training,
    pipeline_inference,
    pipeline_predict_many,
    risk_and_remarks
);
criterion_main!(benches);
