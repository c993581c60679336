use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use dropout_early_warning::{
    analytics::DashboardData,
    config::{Config, ObservabilityConfig},
    ml::{CsvTrainingSource, PredictionService},
    models::{write_annotated_csv, AnnotatedRecord, Cohort, DataTable},
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "dropout-early-warning")]
#[command(version, about = "Student dropout risk prediction", long_about = None)]
struct Cli {
    /// Print Prometheus metrics to stderr when done
    #[arg(long, global = true)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a CSV of students
    Predict {
        /// Data shape of the input: 1sem or 2sem
        #[arg(short, long)]
        cohort: Cohort,

        /// Input CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
    },

    /// Risk summary and course breakdown for a CSV of students
    Summary {
        #[arg(short, long)]
        cohort: Cohort,

        #[arg(short, long)]
        input: PathBuf,

        /// Number of highest-risk students listed
        #[arg(short, long, default_value_t = 10)]
        top: usize,
    },

    /// Training state of each cohort
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load().context("Failed to load configuration")?;
    init_tracing(&config.observability);

    tracing::info!("Starting dropout early warning v{}", env!("CARGO_PKG_VERSION"));

    if config.observability.prometheus_enabled {
        if let Err(e) = dropout_early_warning::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
        } else {
            tracing::info!("✅ Prometheus metrics initialized");
        }
    }

    let service = Arc::new(PredictionService::new(&config));
    let source = CsvTrainingSource::from_config(&config.training);
    let trainer = Arc::clone(&service);
    let status = tokio::task::spawn_blocking(move || trainer.train_all(&source))
        .await
        .context("Training task panicked")?;

    match cli.command {
        Commands::Predict {
            cohort,
            input,
            output,
            format,
        } => {
            let annotated = score(&service, cohort, &input).await?;
            let writer: Box<dyn Write> = match &output {
                Some(path) => Box::new(BufWriter::new(
                    File::create(path)
                        .with_context(|| format!("Failed to create {}", path.display()))?,
                )),
                None => Box::new(std::io::stdout().lock()),
            };
            write_records(&annotated, format, writer)?;
            tracing::info!(rows = annotated.len(), "✅ Predictions written");
        }
        Commands::Summary { cohort, input, top } => {
            let annotated = score(&service, cohort, &input).await?;
            let mut dashboard = DashboardData::from_records(cohort, &annotated);
            dashboard.students.truncate(top);
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        }
        Commands::Status => {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    if cli.print_metrics {
        eprintln!("{}", dropout_early_warning::metrics::gather_metrics());
    }

    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("dropout_early_warning={}", config.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

async fn score(
    service: &Arc<PredictionService>,
    cohort: Cohort,
    input: &Path,
) -> anyhow::Result<Vec<AnnotatedRecord>> {
    if !service.is_ready(cohort) {
        bail!(
            "cohort {} is not available: {}",
            cohort,
            service.state(cohort)
        );
    }

    let table = DataTable::from_csv_path(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    service
        .predict_upload(cohort, table)
        .await
        .with_context(|| format!("Failed to score {}", input.display()))
}

fn write_records(
    records: &[AnnotatedRecord],
    format: OutputFormat,
    mut writer: Box<dyn Write>,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Csv => write_annotated_csv(records, &mut writer)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, records)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(())
}
