//! Simulation loop runner.
//!
//! [`run_simulation`] drives the step loop of a single run with support for:
//!
//! - **Bounded simulation**: stop after `max_steps` steps
//! - **Cancellation**: a shared flag checked between steps, so a step is
//!   never interrupted halfway through its phases
//! - **Per-step callback**: observers receive every [`StepSummary`]
//!
//! A run is single-threaded and synchronous. The runner wraps the
//! single-step [`run_step`] function and adds the control plane around it.
//!
//! [`run_step`]: crate::step::run_step

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::step::{self, SimulationState, StepError, StepSummary};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A step execution failed.
    #[error("step error: {source}")]
    Step {
        /// The underlying step error.
        #[from]
        source: StepError,
    },
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEndReason {
    /// Every requested step ran.
    Completed,
    /// The cancellation flag was raised.
    Cancelled,
}

/// Result of the simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// Summary of every completed step, in order.
    pub summaries: Vec<StepSummary>,
    /// Total number of steps executed.
    pub total_steps: u64,
}

impl SimulationResult {
    /// The last step summary, if any step completed.
    pub fn final_summary(&self) -> Option<&StepSummary> {
        self.summaries.last()
    }
}

/// Callback invoked after each step completes.
pub trait StepCallback {
    /// Called after a step completes successfully.
    fn on_step(&mut self, summary: &StepSummary, state: &SimulationState);
}

/// A no-op step callback.
pub struct NoOpCallback;

impl StepCallback for NoOpCallback {
    fn on_step(&mut self, _summary: &StepSummary, _state: &SimulationState) {}
}

/// Run up to `max_steps` steps, stopping early when `cancel` is raised.
///
/// # Errors
///
/// Returns [`RunnerError`] if a step fails unrecoverably. Steps completed
/// before the failure are lost with it; the caller aborts the run.
pub fn run_simulation(
    state: &mut SimulationState,
    max_steps: u64,
    cancel: &AtomicBool,
    callback: &mut dyn StepCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut summaries = Vec::new();
    let mut total_steps: u64 = 0;

    info!(run = %state.run_id, max_steps, "Simulation starting");

    while total_steps < max_steps {
        if cancel.load(Ordering::Relaxed) {
            info!(run = %state.run_id, completed = total_steps, "Cancellation requested");
            return Ok(SimulationResult {
                end_reason: SimulationEndReason::Cancelled,
                summaries,
                total_steps,
            });
        }

        let summary = step::run_step(state)?;
        total_steps = total_steps.saturating_add(1);
        callback.on_step(&summary, state);
        summaries.push(summary);
    }

    Ok(SimulationResult {
        end_reason: SimulationEndReason::Completed,
        summaries,
        total_steps,
    })
}

/// Log the simulation end.
pub fn log_simulation_end(result: &SimulationResult) {
    let last = result.final_summary();
    info!(
        reason = ?result.end_reason,
        total_steps = result.total_steps,
        final_length = last.map(|s| s.total_length),
        final_struct_mass = last.map(|s| s.total_struct_mass),
        anomalies = result.summaries.iter().map(|s| s.anomalies.len()).sum::<usize>(),
        "Simulation ended"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;

    fn state() -> SimulationState {
        let Ok(state) = SimulationState::new(&SimulationConfig::default()) else {
            panic!("state construction failed");
        };
        state
    }

    /// Raises the cancellation flag after a given number of steps.
    struct CancelAfter<'a> {
        steps: u64,
        flag: &'a AtomicBool,
        seen: Vec<u64>,
    }

    impl StepCallback for CancelAfter<'_> {
        fn on_step(&mut self, summary: &StepSummary, _state: &SimulationState) {
            self.seen.push(summary.step);
            if summary.step >= self.steps {
                self.flag.store(true, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn runs_every_requested_step() {
        let mut s = state();
        let cancel = AtomicBool::new(false);
        let Ok(result) = run_simulation(&mut s, 3, &cancel, &mut NoOpCallback) else {
            panic!("run failed");
        };
        assert_eq!(result.end_reason, SimulationEndReason::Completed);
        assert_eq!(result.total_steps, 3);
        assert_eq!(result.final_summary().map(|s| s.step), Some(3));
        assert_eq!(s.clock.step(), 3);
    }

    #[test]
    fn cancellation_is_checked_between_steps() {
        let mut s = state();
        let cancel = AtomicBool::new(false);
        let mut callback = CancelAfter {
            steps: 2,
            flag: &cancel,
            seen: Vec::new(),
        };
        let Ok(result) = run_simulation(&mut s, 10, &cancel, &mut callback) else {
            panic!("run failed");
        };
        assert_eq!(result.end_reason, SimulationEndReason::Cancelled);
        assert_eq!(result.total_steps, 2);
        assert_eq!(callback.seen, vec![1, 2]);
    }

    #[test]
    fn cancelled_before_start() {
        let mut s = state();
        let cancel = AtomicBool::new(true);
        let result = run_simulation(&mut s, 5, &cancel, &mut NoOpCallback).ok();
        assert_eq!(result.map(|r| (r.end_reason, r.total_steps)), Some((SimulationEndReason::Cancelled, 0)));
    }

    #[test]
    fn zero_steps_completes_immediately() {
        let mut s = state();
        let cancel = AtomicBool::new(false);
        let result = run_simulation(&mut s, 0, &cancel, &mut NoOpCallback).ok();
        assert!(result.is_some_and(|r| r.end_reason == SimulationEndReason::Completed && r.summaries.is_empty()));
    }
}
