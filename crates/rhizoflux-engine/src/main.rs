//! Engine binary for the Rhizoflux simulation.
//!
//! Two commands:
//!
//! - `run` -- load the configuration (optionally with the overrides of one
//!   scenario), run the simulation to completion or Ctrl-C, and optionally
//!   write the step summaries as JSON.
//! - `batch` -- launch one `run` process per scenario of a file, bounded by
//!   the number of available cores, and report every exit status.
//!
//! # Exit status
//!
//! `0` on success, `1` on a failed run or batch, `2` on a configuration or
//! scenario error, `130` when a run was cancelled.

mod batch;
mod cli;
mod error;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use rhizoflux_core::config::{LoggingConfig, SimulationConfig};
use rhizoflux_core::runner::{self, NoOpCallback, SimulationEndReason, SimulationResult};
use rhizoflux_core::scenario::{ScenarioError, ScenarioSet};
use rhizoflux_core::step::SimulationState;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::batch::BatchOptions;
use crate::cli::{Cli, Commands};
use crate::error::EngineError;

/// Application entry point.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging settings come from the config, so load it first.
    let loaded = load_config(&cli.config);
    let logging = loaded
        .as_ref()
        .map_or_else(|_| LoggingConfig::default(), |(config, _)| config.logging.clone());
    init_logging(&logging);

    info!("rhizoflux-engine starting");

    let result = match loaded {
        Ok((config, from_file)) => {
            if from_file {
                info!(path = %cli.config.display(), "Configuration loaded");
            } else {
                info!(path = %cli.config.display(), "Config file not found, using defaults");
            }
            dispatch(cli, config).await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            info!("rhizoflux-engine shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, status = e.exit_status(), "rhizoflux-engine failed");
            e.exit_code()
        }
    }
}

async fn dispatch(cli: Cli, config: SimulationConfig) -> Result<(), EngineError> {
    match cli.command {
        Commands::Run {
            scenarios,
            name,
            steps,
            output,
        } => run_single(config, scenarios.zip(name), steps, output).await,
        Commands::Batch {
            scenarios,
            jobs,
            output_dir,
            only,
        } => run_batch(cli.config, scenarios, jobs, output_dir, only).await,
    }
}

/// Install the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load the base configuration. A missing file means defaults; the flag
/// tells whether the file was read.
fn load_config(path: &Path) -> Result<(SimulationConfig, bool), EngineError> {
    if path.exists() {
        Ok((SimulationConfig::from_file(path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

/// Run one simulation in this process.
async fn run_single(
    mut config: SimulationConfig,
    scenario: Option<(PathBuf, String)>,
    steps: Option<u64>,
    output: Option<PathBuf>,
) -> Result<(), EngineError> {
    if let Some((path, name)) = scenario {
        let scenarios = ScenarioSet::from_file(&path)?;
        config = scenarios.apply(&name, &config)?;
        info!(scenario = %name, file = %path.display(), "Scenario applied");
    }
    if let Some(steps) = steps {
        config.run.steps = steps;
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received, stopping after the current step");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let result = tokio::task::spawn_blocking(move || simulate(&config, &cancel))
        .await
        .map_err(|e| EngineError::Task {
            message: e.to_string(),
        })??;
    runner::log_simulation_end(&result);

    if let Some(path) = output {
        write_json(&path, &result.summaries)?;
        info!(path = %path.display(), steps = result.summaries.len(), "Step summaries written");
    }

    match result.end_reason {
        SimulationEndReason::Completed => Ok(()),
        SimulationEndReason::Cancelled => Err(EngineError::Cancelled {
            completed: result.total_steps,
        }),
    }
}

fn simulate(config: &SimulationConfig, cancel: &AtomicBool) -> Result<SimulationResult, EngineError> {
    let mut state = SimulationState::new(config)?;
    let result = runner::run_simulation(&mut state, config.run.steps, cancel, &mut NoOpCallback)?;
    Ok(result)
}

/// Run the scenarios of a file as child processes.
async fn run_batch(
    config: PathBuf,
    scenarios: PathBuf,
    jobs: Option<usize>,
    output_dir: Option<PathBuf>,
    only: Vec<String>,
) -> Result<(), EngineError> {
    let set = ScenarioSet::from_file(&scenarios)?;
    let declared = set.names();
    let names = if only.is_empty() {
        declared
    } else {
        if let Some(unknown) = only.iter().find(|n| !declared.contains(n)) {
            return Err(ScenarioError::UnknownScenario(unknown.clone()).into());
        }
        only
    };
    if let Some(dir) = &output_dir {
        tokio::fs::create_dir_all(dir).await?;
    }

    let options = BatchOptions {
        program: std::env::current_exe()?,
        leading_args: Vec::new(),
        config,
        scenarios,
        jobs: jobs.unwrap_or_else(batch::default_jobs),
        output_dir: output_dir.clone(),
    };

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, stopping the batch");
            if tx.send(true).is_err() {
                debug!("batch already finished");
            }
        }
    });

    let report = batch::run_batch(options, names, rx).await;
    for outcome in &report.outcomes {
        info!(scenario = %outcome.name, status = ?outcome.status, "Scenario outcome");
    }
    if let Some(dir) = output_dir {
        write_json(&dir.join("batch-report.json"), &report)?;
    }

    if report.is_success() {
        Ok(())
    } else {
        Err(EngineError::BatchFailed {
            failed: report.unsuccessful(),
            total: report.outcomes.len(),
        })
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), EngineError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}
