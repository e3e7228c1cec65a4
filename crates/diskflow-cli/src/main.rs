// Copyright 2026 Dropbox (created by Andrew Yates <ayates@dropbox.com>)
// Allow clippy warnings for CLI application
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use diskflow::{PipelineConfig, PipelineOrchestrator, RunOutcome};
use diskflow_file_checkpointer::FileCheckpointStore;
use diskflow_http_analyzer::{HttpForecastAnalyzer, API_TOKEN_ENV};

mod entities;

use entities::FileEntitySource;

/// DiskFlow CLI - disk-capacity forecast runs
///
/// Reads the disk universe from an entities file, drives the external
/// forecast analyzer, and prints the violation summary as JSON on
/// stdout (logs go to stderr). A run that cannot finish within one
/// `slice` persists a checkpoint under the checkpoint directory and
/// resumes on the next invocation with the same run id.
#[derive(Parser)]
#[command(name = "diskflow")]
#[command(author = "Andrew Yates")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Disk capacity forecast pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the run to completion, re-invoking slices as needed
    Run(RunArgs),
    /// Perform exactly one slice and print the (possibly partial) outcome
    Slice(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// JSON file with the disk entity array
    #[arg(long)]
    entities: String,

    /// Analyzer service base URL
    #[arg(long, env = "DISKFLOW_BASE_URL")]
    base_url: String,

    /// API token (falls back to DISKFLOW_API_TOKEN)
    #[arg(long, env = API_TOKEN_ENV, hide_env_values = true)]
    api_token: String,

    /// Run identifier; generated when omitted. Reuse the id printed by
    /// an incomplete slice to resume it.
    #[arg(long)]
    run_id: Option<String>,

    /// Directory holding run checkpoints
    #[arg(long, default_value = ".diskflow/checkpoints")]
    checkpoint_dir: String,

    /// Disks advanced per invocation
    #[arg(long, default_value_t = 10)]
    batch_size: usize,

    /// Disks processed concurrently within a slice
    #[arg(long, default_value_t = 5)]
    max_concurrency: usize,

    /// Forecast horizon in days
    #[arg(long, default_value_t = 365)]
    horizon_days: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => drive(args, true).await,
        Commands::Slice(args) => drive(args, false).await,
    }
}

async fn drive(args: RunArgs, to_completion: bool) -> Result<()> {
    let config = PipelineConfig::default()
        .with_batch_size(args.batch_size)
        .with_max_concurrency(args.max_concurrency)
        .with_horizon_days(args.horizon_days);

    let analyzer = HttpForecastAnalyzer::new(&args.base_url, &args.api_token)
        .context("building analyzer client")?;
    let orchestrator = PipelineOrchestrator::new(
        FileEntitySource::new(&args.entities),
        Arc::new(analyzer),
        FileCheckpointStore::new(&args.checkpoint_dir),
        config,
    );

    let run_id = args
        .run_id
        .unwrap_or_else(|| format!("run-{}", uuid::Uuid::new_v4()));
    info!(%run_id, "starting invocation");

    let outcome = loop {
        let outcome = orchestrator.run(&run_id).await?;
        match &outcome {
            RunOutcome::Complete(summary) => {
                info!(
                    %run_id,
                    analyzed = summary.metrics.analyzed_disks,
                    violations = summary.violations.len(),
                    "run complete"
                );
                break outcome;
            }
            RunOutcome::Incomplete {
                processed, total, ..
            } => {
                if !to_completion {
                    info!(
                        %run_id,
                        processed = *processed,
                        total = *total,
                        "slice finished; re-invoke with --run-id {run_id} to resume"
                    );
                    break outcome;
                }
                info!(%run_id, processed = *processed, total = *total, "slice finished, continuing");
            }
        }
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
