//! Multi-process scenario batch driver.
//!
//! Each scenario runs in its own `rhizoflux-engine run` child process.
//! Processes share no memory and report only their exit status. At most
//! `jobs` processes run at once; a finished run frees its slot for the next
//! scenario. When cancellation is signalled, scenarios that have not been
//! launched are skipped and running processes are killed.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tokio::sync::{Semaphore, watch};
use tracing::{error, info, warn};

/// How to launch the runs of a batch.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Executable launched per scenario.
    pub program: PathBuf,
    /// Arguments placed before the `run` subcommand.
    pub leading_args: Vec<String>,
    /// Base configuration passed to every run.
    pub config: PathBuf,
    /// Scenario file passed to every run.
    pub scenarios: PathBuf,
    /// Maximum concurrent runs.
    pub jobs: usize,
    /// Directory receiving one summary file per run.
    pub output_dir: Option<PathBuf>,
}

impl BatchOptions {
    fn command(&self, name: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.leading_args)
            .arg("--config")
            .arg(&self.config)
            .arg("run")
            .arg("--scenarios")
            .arg(&self.scenarios)
            .arg("--name")
            .arg(name)
            .kill_on_drop(true);
        if let Some(dir) = &self.output_dir {
            command.arg("--output").arg(dir.join(format!("{name}.json")));
        }
        command
    }
}

/// Number of concurrent runs when none is requested: the available cores.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}

/// How one scenario of the batch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ScenarioStatus {
    /// The run exited successfully.
    Succeeded,
    /// The run exited with a failure status (`None` if killed by a signal).
    Failed {
        /// Exit code of the process.
        code: Option<i32>,
    },
    /// The process could not be started.
    LaunchFailed {
        /// Description of the failure.
        message: String,
    },
    /// The run was killed by cancellation.
    Cancelled,
    /// Cancellation came before the run was launched.
    Skipped,
}

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    /// Scenario name.
    pub name: String,
    /// How the run ended.
    pub status: ScenarioStatus,
    /// When the process was launched, if it was.
    pub started_at: Option<DateTime<Utc>>,
    /// When the outcome was recorded.
    pub finished_at: DateTime<Utc>,
}

/// Outcomes of a whole batch, in scenario order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One outcome per scenario.
    pub outcomes: Vec<ScenarioOutcome>,
}

impl BatchReport {
    /// Number of scenarios that succeeded.
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == ScenarioStatus::Succeeded)
            .count()
    }

    /// Number of scenarios that did not succeed.
    pub fn unsuccessful(&self) -> usize {
        self.outcomes.len().saturating_sub(self.succeeded())
    }

    /// Whether every scenario succeeded.
    pub fn is_success(&self) -> bool {
        self.unsuccessful() == 0
    }
}

/// Resolve once cancellation is signalled; never if the sender is gone.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn outcome(name: String, status: ScenarioStatus, started_at: Option<DateTime<Utc>>) -> ScenarioOutcome {
    ScenarioOutcome {
        name,
        status,
        started_at,
        finished_at: Utc::now(),
    }
}

fn status_of(exit: ExitStatus) -> ScenarioStatus {
    if exit.success() {
        ScenarioStatus::Succeeded
    } else {
        ScenarioStatus::Failed { code: exit.code() }
    }
}

/// Run one scenario once a slot is free.
async fn run_scenario(
    options: Arc<BatchOptions>,
    name: String,
    slots: Arc<Semaphore>,
    mut cancel: watch::Receiver<bool>,
) -> ScenarioOutcome {
    let permit = tokio::select! {
        permit = slots.acquire_owned() => permit,
        () = cancelled(&mut cancel) => return outcome(name, ScenarioStatus::Skipped, None),
    };
    let Ok(_permit) = permit else {
        return outcome(name, ScenarioStatus::Skipped, None);
    };
    if *cancel.borrow() {
        return outcome(name, ScenarioStatus::Skipped, None);
    }

    let started_at = Utc::now();
    let mut child = match options.command(&name).spawn() {
        Ok(child) => child,
        Err(e) => {
            error!(scenario = %name, error = %e, "failed to launch run");
            let status = ScenarioStatus::LaunchFailed {
                message: e.to_string(),
            };
            return outcome(name, status, Some(started_at));
        }
    };
    info!(scenario = %name, pid = child.id(), "run launched");

    let exit = tokio::select! {
        exit = child.wait() => Some(exit),
        () = cancelled(&mut cancel) => None,
    };
    let status = match exit {
        Some(Ok(exit)) => status_of(exit),
        Some(Err(e)) => ScenarioStatus::LaunchFailed {
            message: e.to_string(),
        },
        None => {
            if let Err(e) = child.kill().await {
                warn!(scenario = %name, error = %e, "failed to kill run");
            }
            ScenarioStatus::Cancelled
        }
    };

    match &status {
        ScenarioStatus::Succeeded => info!(scenario = %name, "run succeeded"),
        other => warn!(scenario = %name, status = ?other, "run did not succeed"),
    }
    outcome(name, status, Some(started_at))
}

/// Run every named scenario, at most `options.jobs` at a time.
///
/// Raising `cancel` stops launching runs and kills the running ones. The
/// report lists every scenario in the order of `names`.
pub async fn run_batch(
    options: BatchOptions,
    names: Vec<String>,
    cancel: watch::Receiver<bool>,
) -> BatchReport {
    let jobs = options.jobs.max(1);
    info!(scenarios = names.len(), jobs, "batch starting");

    let options = Arc::new(options);
    let slots = Arc::new(Semaphore::new(jobs));
    let handles: Vec<_> = names
        .into_iter()
        .map(|name| {
            let task = run_scenario(
                Arc::clone(&options),
                name.clone(),
                Arc::clone(&slots),
                cancel.clone(),
            );
            (name, tokio::spawn(task))
        })
        .collect();

    let mut report = BatchReport::default();
    for (name, handle) in handles {
        match handle.await {
            Ok(outcome) => report.outcomes.push(outcome),
            Err(e) => {
                error!(scenario = %name, error = %e, "scenario task failed");
                let status = ScenarioStatus::LaunchFailed {
                    message: e.to_string(),
                };
                report.outcomes.push(outcome(name, status, None));
            }
        }
    }

    info!(
        succeeded = report.succeeded(),
        unsuccessful = report.unsuccessful(),
        "batch finished"
    );
    report
}
