//! Travel-time batch run.
//!
//! Loads sample points and candidate hospitals, resolves the fastest
//! driving route from every sample to one of its nearest candidates and
//! writes one CSV row per sample.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use accessmap::config::{Config, ServiceConfig};
use accessmap::error::RunError;
use accessmap::geometry::CandidateIndex;
use accessmap::io::{load_candidates, load_samples, write_results_to_path};
use accessmap::orchestrator::BatchOrchestrator;
use accessmap::routing::{GoogleDistanceMatrixClient, MAX_DESTINATIONS};

#[derive(Parser, Debug)]
#[command(name = "travel-times")]
#[command(about = "Compute travel times from sample points to the nearest hospitals")]
struct Args {
    /// Sample points (GeoJSON points or CSV with lat/lng, optionally .gz)
    #[arg(short, long)]
    samples: PathBuf,

    /// Candidate hospitals CSV (place_id,name,address,lat,lng)
    #[arg(long)]
    hospitals: PathBuf,

    /// Output CSV
    #[arg(short, long, default_value = "data/results/travel_times.csv")]
    output: PathBuf,

    /// Nearest candidates routed per sample
    #[arg(short, value_parser = clap::value_parser!(u64).range(1..=MAX_DESTINATIONS as u64))]
    k: Option<u64>,

    /// Samples resolved concurrently
    #[arg(long)]
    concurrency: Option<usize>,

    /// Global routing request budget
    #[arg(long)]
    requests_per_second: Option<f64>,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Accessmap travel times");

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(k) = args.k {
        config.run.k = k as usize;
    }
    if let Some(concurrency) = args.concurrency {
        config.run.concurrency = concurrency;
    }
    if let Some(rps) = args.requests_per_second {
        config.run.requests_per_second = rps;
    }

    // Everything fatal is checked before the first request
    let options = config.run.to_options()?;
    let service = ServiceConfig::from_lookup(&config.service, |key| std::env::var(key).ok())?;

    let samples = load_samples(&args.samples)?;
    let candidates = load_candidates(&args.hospitals)?;
    if candidates.is_empty() {
        warn!("No candidates loaded, every sample will be unresolved");
    }

    let index = Arc::new(CandidateIndex::build(candidates));
    let client = Arc::new(
        GoogleDistanceMatrixClient::new(&service).context("Failed to build routing client")?,
    );

    let pb = ProgressBar::new(samples.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let orchestrator =
        BatchOrchestrator::with_index(index, client, options).with_progress(pb.clone());

    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight samples");
            cancel.cancel();
        }
    });

    match orchestrator.run(&samples).await {
        Ok(report) => {
            pb.finish_and_clear();
            write_results_to_path(&args.output, &report.records)
                .with_context(|| format!("Failed to write {}", args.output.display()))?;
            info!(
                "Done in {}s: {}",
                (report.finished_at - report.started_at).num_seconds(),
                report.summary
            );
            println!("{}", report.summary);
            Ok(())
        }
        Err(RunError::Aborted {
            reason,
            total,
            report,
        }) => {
            pb.abandon();
            write_results_to_path(&args.output, &report.records)
                .with_context(|| format!("Failed to write {}", args.output.display()))?;
            error!(
                "Partial results ({} of {} samples) written to {}",
                report.records.len(),
                total,
                args.output.display()
            );
            println!("{}", report.summary);
            anyhow::bail!("run aborted: {}", reason)
        }
    }
}
