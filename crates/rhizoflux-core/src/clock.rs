//! Simulation clock for the Rhizoflux simulation.
//!
//! Tracks the step counter and the simulated time elapsed since the start
//! of the run. Every phase reads the step duration from here.
//!
//! # Design Principles
//!
//! - The step counter uses checked arithmetic (no silent overflow).
//! - The step duration is fixed for a run and validated once, at
//!   construction: it must be finite and strictly positive.

use crate::config::RunConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Step counter would overflow.
    #[error("step counter overflow: cannot advance beyond u64::MAX")]
    StepOverflow,

    /// Invalid run configuration (e.g. a zero time step).
    #[error("invalid run configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Step counter and elapsed simulated time.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    /// Number of completed or running steps (0 before the first step).
    step: u64,

    /// Duration of one step in seconds.
    time_step: f64,

    /// Simulated seconds elapsed at the end of the current step.
    elapsed: f64,
}

impl SimulationClock {
    /// Create a clock at step zero from the run configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the time step is not a
    /// finite positive number.
    pub fn new(config: &RunConfig) -> Result<Self, ClockError> {
        let time_step = config.time_step_seconds;
        if !time_step.is_finite() || time_step <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("time_step_seconds must be finite and positive, got {time_step}"),
            });
        }
        Ok(Self {
            step: 0,
            time_step,
            elapsed: 0.0,
        })
    }

    /// Advance the clock by one step. Returns the new step number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::StepOverflow`] if the step counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.step = self.step.checked_add(1).ok_or(ClockError::StepOverflow)?;
        self.elapsed += self.time_step;
        Ok(self.step)
    }

    /// Return the current step number.
    pub const fn step(&self) -> u64 {
        self.step
    }

    /// Return the step duration in seconds.
    pub const fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Return the simulated seconds elapsed.
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn run_config(time_step_seconds: f64) -> RunConfig {
        RunConfig {
            time_step_seconds,
            ..RunConfig::default()
        }
    }

    #[test]
    fn clock_starts_at_step_zero() {
        let clock = SimulationClock::new(&run_config(600.0)).unwrap();
        assert_eq!(clock.step(), 0);
        assert!(clock.elapsed().abs() < f64::EPSILON);
    }

    #[test]
    fn clock_advances() {
        let mut clock = SimulationClock::new(&run_config(600.0)).unwrap();
        assert_eq!(clock.advance().ok(), Some(1));
        assert_eq!(clock.advance().ok(), Some(2));
        assert_eq!(clock.step(), 2);
        assert!((clock.elapsed() - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_time_step_rejected() {
        for dt in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                SimulationClock::new(&run_config(dt)),
                Err(ClockError::InvalidConfig { .. })
            ));
        }
    }

    #[test]
    fn overflow_is_an_error() {
        let mut clock = SimulationClock::new(&run_config(1.0)).unwrap();
        clock.step = u64::MAX;
        assert!(matches!(clock.advance(), Err(ClockError::StepOverflow)));
    }
}
