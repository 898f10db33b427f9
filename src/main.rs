mod core;
mod features;
mod modules;
mod shared;

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::core::config::{self, HealthcheckConfig};
use crate::features::{bucket_init, healthcheck, tracking_server};

/// Entrypoint for an MLflow tracking server backed by PostgreSQL and MinIO
#[derive(Parser, Debug)]
#[command(name = "mlflow-launcher", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate settings and exec the tracking server
    Serve {
        /// Print the assembled command line instead of running it
        #[arg(long)]
        dry_run: bool,
    },
    /// Wait for MinIO, then create and configure the artifact bucket
    InitBuckets,
    /// Probe the local tracking server's health endpoint
    Healthcheck,
}

fn main() -> ExitCode {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    config::load_dotenv();

    // Logs go to stderr; stdout is reserved for --dry-run output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    // Everything here is sequential; one thread is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Serve { dry_run } => {
            let command = runtime
                .block_on(tracking_server::prepare_from_env())
                .context("Cannot start tracking server")?;

            if dry_run {
                println!("{}", command.display());
                return Ok(ExitCode::SUCCESS);
            }

            // Nothing async may outlive the exec
            drop(runtime);
            Ok(tracking_server::launch(&command)?)
        }
        Command::InitBuckets => {
            let report = runtime
                .block_on(bucket_init::run_from_env())
                .context("Bucket initialization failed")?;
            tracing::info!(
                "Bucket initialization finished after {} readiness check(s): {:?}, policy applied: {}",
                report.attempts,
                report.creation,
                report.policy_applied
            );
            Ok(ExitCode::SUCCESS)
        }
        Command::Healthcheck => {
            let config = HealthcheckConfig::from_env()?;
            match runtime.block_on(healthcheck::check(&config)) {
                Ok(()) => Ok(ExitCode::SUCCESS),
                Err(e) => {
                    eprintln!("Unhealthy: {}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
    }
}
