//! Configuration loading and typed config structures for the Rhizoflux simulation.
//!
//! The canonical configuration lives in `rhizoflux-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, and a loader that reads the file. Every field has a
//! default, so an empty document is a valid configuration.

use std::path::Path;

use rhizoflux_coupling::TranslatorTable;
use rhizoflux_graph::StartingRootSpec;
use rhizoflux_growth::GrowthParameters;
use serde::{Deserialize, Serialize};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `rhizoflux-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Time step and run length.
    #[serde(default)]
    pub run: RunConfig,

    /// Potential growth, allocation and life-cycle parameters.
    #[serde(default)]
    pub growth: GrowthParameters,

    /// Soil conditions seen by the root system.
    #[serde(default)]
    pub environment: EnvironmentConfig,

    /// Seed architecture.
    #[serde(default)]
    pub starting_root: StartingRootSpec,

    /// How the pool balance reads the growth ledgers.
    #[serde(default)]
    pub coupling: CouplingConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to a unit value, not a mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

/// Time step and run length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Duration of one step in seconds (default: 3600).
    #[serde(default = "default_time_step_seconds")]
    pub time_step_seconds: f64,

    /// Number of steps of a run (default: 24).
    #[serde(default = "default_steps")]
    pub steps: u64,

    /// Compute potential growth each step. Disable when an external driver
    /// writes `potential_length` and `potential_radius` (default: true).
    #[serde(default = "default_true")]
    pub compute_potentials: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            time_step_seconds: default_time_step_seconds(),
            steps: default_steps(),
            compute_potentials: true,
        }
    }
}

const fn default_time_step_seconds() -> f64 {
    3600.0
}

const fn default_steps() -> u64 {
    24
}

const fn default_true() -> bool {
    true
}

/// Soil conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Soil temperature in degrees Celsius (default: 20).
    #[serde(default = "default_soil_temperature")]
    pub soil_temperature: f64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            soil_temperature: default_soil_temperature(),
        }
    }
}

const fn default_soil_temperature() -> f64 {
    20.0
}

/// Coupling of the pool balance to the allocator ledgers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouplingConfig {
    /// Bind pool balance inputs to allocator fields of the same name
    /// (default: true). When false, `translator` must name every input.
    #[serde(default = "default_true")]
    pub same_names: bool,

    /// `{pool_balance_input: {allocator_field: factor}}`.
    #[serde(default)]
    pub translator: TranslatorTable,
}

impl Default for CouplingConfig {
    fn default() -> Self {
        Self {
            same_names: true,
            translator: TranslatorTable::default(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error). `RUST_LOG`
    /// takes precedence.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON log lines instead of the human-readable format.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rhizoflux_growth::PolicyKind;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.run.time_step_seconds > 0.0);
        assert_eq!(config.run.steps, 24);
        assert!(config.run.compute_potentials);
        assert_eq!(config.growth.policy, PolicyKind::DualLimited);
        assert!(config.coupling.same_names);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
run:
  time_step_seconds: 1800
  steps: 10
  compute_potentials: false

growth:
  policy: carbon_only
  growing_zone_factor: 8
  archi_simple: false
  apex_growth_duration: 1.0e6

environment:
  soil_temperature: 12.5

starting_root:
  primary_segments: 5
  nodules: 2

coupling:
  same_names: false
  translator:
    hexose_consumption_by_growth:
      hexose_consumption_by_growth: 1.0
    amino_acids_consumption_by_growth:
      amino_acids_consumption_by_growth: 1.0

logging:
  level: debug
  json: true
";
        let Ok(config) = SimulationConfig::parse(yaml) else {
            panic!("full config should parse");
        };
        assert_eq!(config.run.steps, 10);
        assert!(!config.run.compute_potentials);
        assert_eq!(config.growth.policy, PolicyKind::CarbonOnly);
        assert!(!config.growth.archi_simple);
        assert_eq!(config.growth.apex_growth_duration.map(f64::to_bits), Some(1.0e6_f64.to_bits()));
        assert_eq!(config.starting_root.primary_segments, 5);
        assert_eq!(config.starting_root.nodules, 2);
        assert!(!config.coupling.same_names);
        assert!(config.coupling.translator.terms("hexose_consumption_by_growth").is_some());
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn parse_minimal_yaml() {
        let yaml = "run:\n  steps: 3\n";
        let config = SimulationConfig::parse(yaml).unwrap();

        // Steps are overridden
        assert_eq!(config.run.steps, 3);
        // Everything else uses defaults
        assert_eq!(config.growth, GrowthParameters::default());
        assert_eq!(config.starting_root, StartingRootSpec::default());
    }

    #[test]
    fn parse_empty_yaml() {
        assert_eq!(SimulationConfig::parse("").ok(), Some(SimulationConfig::default()));
    }

    #[test]
    fn unknown_policy_rejected() {
        let result = SimulationConfig::parse("growth:\n  policy: nitrogen_only\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("rhizoflux-config.yaml");
        if path.exists() {
            let config = SimulationConfig::from_file(&path);
            assert!(config.is_ok(), "failed to load project config: {config:?}");
        }
    }
}
