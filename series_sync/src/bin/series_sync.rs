use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ohlc_ingestor::{
    io::{sink::CsvFileSink, source::SourceKind},
    providers::bitstamp_rest::BitstampProvider,
};
use series_sync::{
    config::load_config,
    inspect::inspect_file,
    preprocess::preprocess,
    reconcile::{ReconcileOutcome, Reconciler},
    report::TracingReporter,
};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(Parser)]
#[command(version, about = "Minute OHLCV series sync CLI")]
struct Cli {
    /// Config file (defaults to $SERIES_SYNC_CONFIG, then built-in defaults)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Fetch bars missing since the last stored one and rewrite the recent file
    Update,
    /// Build the bulk history from the raw exports
    Preprocess,
    /// Print a summary of a dataset
    Inspect {
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
        #[arg(long, default_value_t = SourceKind::Canonical)]
        kind: SourceKind,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(default.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = load_config(cli.config).context("loading configuration")?;
    let reporter = TracingReporter;

    match cli.cmd {
        Cmd::Update => {
            let provider = BitstampProvider::new(cfg.provider.bitstamp())?;
            let sink = CsvFileSink::new(&cfg.paths.recent);
            let outcome = Reconciler::new(&cfg, &provider, &sink, &reporter)
                .run()
                .await?;
            match outcome {
                ReconcileOutcome::UpToDate { .. } => {}
                ReconcileOutcome::NoData { stop } => {
                    tracing::warn!(%stop, "nothing fetched and no recent data; nothing written");
                }
                ReconcileOutcome::Updated(summary) => {
                    tracing::info!(
                        path = %summary.written.display(),
                        bars = summary.series.len(),
                        fetched = summary.fetched,
                        filled = summary.synthesized,
                        "update complete"
                    );
                }
            }
        }
        Cmd::Preprocess => {
            let sink = CsvFileSink::new(&cfg.paths.bulk);
            let outcome = preprocess(&cfg, &sink, &reporter).await?;
            tracing::info!(
                path = %outcome.written.display(),
                bars = outcome.series.len(),
                truncated = outcome.truncated_at.is_some(),
                "preprocess complete"
            );
        }
        Cmd::Inspect { file, kind } => {
            let path = file.unwrap_or_else(|| cfg.paths.bulk.clone());
            let report = inspect_file(&path, kind)
                .with_context(|| format!("inspecting {}", path.display()))?;
            println!("{report}");
        }
    }

    Ok(())
}
