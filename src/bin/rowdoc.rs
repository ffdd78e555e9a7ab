//! rowdoc - export warehouse query rows as documents
//!
//! Usage:
//!   rowdoc --tables ./tables --output ./documents.jsonl \
//!     --query 'SELECT * FROM events' \
//!     --collection exports --run-id run-42 --project-id proj
//!
//!   # Single-threaded, throttled, with a dropped-record report
//!   rowdoc ... --sequential --max-writes-per-second 200 --diagnostics dropped.json

use clap::Parser;
use rowdoc::{
    DEFAULT_DATABASE_ID, ExecMode, ExportOptions, JsonlDocumentStore, JsonlWarehouse, MAX_BATCH_SIZE,
    RetryConfig, Runner, WriteQos, run_export,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "rowdoc", version, about = "Export warehouse query rows as documents")]
struct Cli {
    /// Query whose rows become documents
    #[arg(long, env = "ROWDOC_QUERY")]
    query: String,

    /// Collection root the run writes under
    #[arg(long, env = "ROWDOC_COLLECTION")]
    collection: String,

    /// Run identifier scoping this batch of documents
    #[arg(long, env = "ROWDOC_RUN_ID")]
    run_id: String,

    #[arg(long, env = "ROWDOC_DATABASE_ID", default_value = DEFAULT_DATABASE_ID)]
    database_id: String,

    /// Project id; falls back to GOOGLE_CLOUD_PROJECT, then GCLOUD_PROJECT
    #[arg(long, env = "ROWDOC_PROJECT_ID")]
    project_id: Option<String>,

    /// Directory of `<table>.schema.json` + `<table>.jsonl` files
    #[arg(long, default_value = "tables")]
    tables: PathBuf,

    /// JSONL file receiving the documents
    #[arg(long, default_value = "documents.jsonl")]
    output: PathBuf,

    /// Write dropped records to this JSON file
    #[arg(long)]
    diagnostics: Option<PathBuf>,

    #[arg(long, default_value_t = MAX_BATCH_SIZE)]
    batch_size: usize,

    /// Writes per second (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_writes_per_second: u32,

    /// Store attempts per batch, including the first
    #[arg(long, default_value_t = 5)]
    max_attempts: u32,

    /// Worker threads for the convert stage (default: all cores)
    #[arg(long)]
    threads: Option<usize>,

    /// Run the convert stage on the calling thread
    #[arg(long, conflicts_with = "threads")]
    sequential: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn options(&self) -> ExportOptions {
        let options = ExportOptions::new(&self.query, &self.collection, &self.run_id)
            .with_database_id(&self.database_id);
        match &self.project_id {
            Some(project) => options.with_project_id(project),
            None => options,
        }
    }

    fn qos(&self) -> WriteQos {
        WriteQos::default()
            .with_batch_size(self.batch_size)
            .with_max_writes_per_second(self.max_writes_per_second)
            .with_retry(RetryConfig {
                max_attempts: self.max_attempts,
                ..RetryConfig::default()
            })
    }

    fn runner(&self) -> Runner {
        if self.sequential {
            Runner::new(ExecMode::Sequential)
        } else {
            Runner::new(ExecMode::Parallel {
                threads: self.threads,
                partitions: None,
            })
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let warehouse = JsonlWarehouse::new(&cli.tables);
    let store = JsonlDocumentStore::new(&cli.output);
    let report = run_export(&cli.options(), &warehouse, &store, &cli.qos(), &cli.runner())?;

    if let Some(path) = &cli.diagnostics {
        report.diagnostics.write_to_file(path)?;
        info!(path = %path.display(), dropped = report.dropped(), "diagnostics written");
    }
    if report.dropped() > 0 {
        warn!(dropped = report.dropped(), "some records were not exported");
    }

    println!("{report}");
    println!("documents: {}", store.path().display());
    Ok(())
}
