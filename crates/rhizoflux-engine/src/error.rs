//! Error types for the engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes of a single run or a batch, and maps each to the process
//! exit status the batch driver reads back.

use std::process::ExitCode;

/// Exit status of a configuration or scenario error.
pub const EXIT_CONFIG: u8 = 2;

/// Exit status of a run that failed while stepping.
pub const EXIT_FAILURE: u8 = 1;

/// Exit status of a run stopped by Ctrl-C (128 + SIGINT).
pub const EXIT_CANCELLED: u8 = 130;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: rhizoflux_core::config::ConfigError,
    },

    /// Scenario loading or merging failed.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying scenario error.
        #[from]
        source: rhizoflux_core::scenario::ScenarioError,
    },

    /// The simulation state could not be assembled.
    #[error("setup error: {source}")]
    Setup {
        /// The underlying step error.
        #[from]
        source: rhizoflux_core::step::StepError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: rhizoflux_core::runner::RunnerError,
    },

    /// Writing output failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Serializing summaries failed.
    #[error("JSON error: {source}")]
    Json {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// A blocking task could not be joined.
    #[error("task error: {message}")]
    Task {
        /// Description of the failure.
        message: String,
    },

    /// The run was cancelled before completing.
    #[error("run cancelled after {completed} steps")]
    Cancelled {
        /// Steps completed before cancellation.
        completed: u64,
    },

    /// One or more scenarios of a batch did not succeed.
    #[error("{failed} of {total} scenarios did not succeed")]
    BatchFailed {
        /// Scenarios that failed, were cancelled or never launched.
        failed: usize,
        /// Scenarios in the batch.
        total: usize,
    },
}

impl EngineError {
    /// Process exit status for this error.
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Config { .. } | Self::Scenario { .. } => EXIT_CONFIG,
            Self::Cancelled { .. } => EXIT_CANCELLED,
            Self::Setup { .. }
            | Self::Runner { .. }
            | Self::Io { .. }
            | Self::Json { .. }
            | Self::Task { .. }
            | Self::BatchFailed { .. } => EXIT_FAILURE,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.exit_status())
    }
}
