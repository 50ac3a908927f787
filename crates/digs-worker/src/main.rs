// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! DIGS Worker - Alignment Job Preparation
//!
//! Reads `perform_bwa_job` lines from stdin (or a file), prepares one
//! workspace per job, and exits once the input ends or Ctrl-C is pressed.
//!
//! ```bash
//! DIGS_CENTRAL_SERVERS=10.0.0.1:5000 digs-worker < jobs.txt
//! digs-worker --env-file worker.env --jobs-from jobs.txt --debug
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use digs_protocol::{DirectoryClient, TransferClient};
use digs_worker::{Config, JobRunner, LineJobSource, Worker};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "digs-worker")]
#[command(about = "DIGS worker node", long_about = None)]
struct Args {
    /// Env file to load before reading configuration
    #[arg(short = 'c', long)]
    env_file: Option<PathBuf>,

    /// Enable debug logging for the worker and protocol crates
    #[arg(short, long)]
    debug: bool,

    /// File with one `perform_bwa_job` line per job, or `-` for stdin
    #[arg(long, default_value = "-")]
    jobs_from: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match &args.env_file {
        Some(path) => {
            dotenvy::from_path_override(path)
                .with_context(|| format!("failed to load env file {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    let level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("digs_worker={level}").parse()?)
                .add_directive(format!("digs_protocol={level}").parse()?),
        )
        .init();

    info!("Starting DIGS worker");

    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        central_servers = ?config.central_servers,
        data_port = config.data_port,
        jobs_dir = %config.jobs_dir.display(),
        max_concurrent_jobs = config.max_concurrent_jobs,
        transport_retries = config.transport_retries,
        "Configuration loaded"
    );

    let directory = DirectoryClient::new(config.central_servers.clone(), config.client_config())?;
    let transfer = TransferClient::new(config.data_port, config.client_config());
    let runner = JobRunner::new(Arc::new(directory), Arc::new(transfer), &config.jobs_dir)
        .with_retry_policy(config.retry_policy());
    let worker = Worker::new(Arc::new(runner), config.max_concurrent_jobs);

    let shutdown = worker.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutting down...");
            shutdown.notify_one();
        }
    });

    let summary = if args.jobs_from == "-" {
        info!("Reading jobs from stdin");
        worker
            .run(LineJobSource::new(BufReader::new(tokio::io::stdin())))
            .await
    } else {
        let file = tokio::fs::File::open(&args.jobs_from)
            .await
            .with_context(|| format!("failed to open job file {}", args.jobs_from))?;
        info!(path = %args.jobs_from, "Reading jobs from file");
        worker.run(LineJobSource::new(BufReader::new(file))).await
    };

    info!(
        completed = summary.completed,
        failed = summary.failed,
        rejected = summary.rejected,
        cancelled = summary.cancelled,
        "Shutdown complete"
    );

    Ok(())
}
