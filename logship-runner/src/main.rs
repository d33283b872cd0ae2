//! Logship Runner
//!
//! Ships lines newly appended to a remote log file to a syslog collector.
//!
//! Architecture:
//! - Configuration: Load settings from environment, fresh for every run
//! - Repositories: Trait seams over snapshot storage, SFTP, the collector and KMS
//! - Services: Sync orchestration and per-invocation setup
//! - Scheduler: Optional fixed-interval re-runs
//!
//! Each run fetches the stored snapshot and the remote log, diffs them,
//! forwards the new lines and stores the new snapshot.

mod config;
mod error;
mod repository;
mod scheduler;
mod service;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::scheduler::RunScheduler;
use crate::service::{ProcessState, invoke};

/// Ship new remote log lines to a syslog collector
#[derive(Parser, Debug)]
#[command(name = "logship-runner", version, about)]
struct Args {
    /// Re-run every SECONDS instead of exiting after a single run
    #[arg(long, env = "LOGSHIP_INTERVAL", value_name = "SECONDS")]
    interval: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logship_runner=info,logship_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let state = Arc::new(ProcessState::new());

    match args.interval {
        None => {
            info!("Starting single sync run");
            let result = invoke(&state).await?;
            println!("{}", serde_json::to_string(&result)?);
        }
        Some(0) => anyhow::bail!("--interval must be greater than 0"),
        Some(seconds) => {
            let scheduler = RunScheduler::new(Duration::from_secs(seconds));
            let runs = scheduler
                .run(
                    || {
                        let state = Arc::clone(&state);
                        async move {
                            match invoke(&state).await {
                                Ok(result) => info!(
                                    "Sync run succeeded: {}",
                                    serde_json::to_string(&result).unwrap_or_default()
                                ),
                                Err(e) => error!("Sync run failed: {}", e),
                            }
                        }
                    },
                    shutdown_signal(),
                )
                .await;
            info!("Runner stopped after {} run(s)", runs);
        }
    }

    Ok(())
}

/// Resolves on Ctrl-C; if the handler cannot be installed, never resolves
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
