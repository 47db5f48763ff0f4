//! Scenario files: named overrides applied on top of the base configuration.
//!
//! A scenario file is a YAML mapping of `name -> overrides`, where each
//! override document has the shape of `rhizoflux-config.yaml` restricted to
//! the keys it changes:
//!
//! ```yaml
//! low_carbon:
//!   starting_root:
//!     c_hexose_root: 1.0e-4
//! carbon_only:
//!   growth:
//!     policy: carbon_only
//! ```
//!
//! Mappings merge key by key; any other value replaces the base value.

use std::collections::BTreeMap;
use std::path::Path;

use serde_yml::Value;

use crate::config::SimulationConfig;

/// Errors raised while loading or applying scenarios.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Failed to read the scenario file from disk.
    #[error("failed to read scenario file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// The scenario file or a merged configuration is not valid.
    #[error("invalid scenario YAML: {source}")]
    Yaml {
        /// The underlying YAML error.
        source: serde_yml::Error,
    },

    /// No scenario has the requested name.
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
}

impl From<serde_yml::Error> for ScenarioError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// A set of named scenarios, ordered by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioSet {
    scenarios: BTreeMap<String, Value>,
}

impl ScenarioSet {
    /// Load a scenario file.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Io`] if the file cannot be read, or
    /// [`ScenarioError::Yaml`] if it is not a mapping of scenarios.
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a scenario file from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::Yaml`] if the string is not a mapping of
    /// scenarios.
    pub fn parse(yaml: &str) -> Result<Self, ScenarioError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let scenarios: BTreeMap<String, Value> = serde_yml::from_str(yaml)?;
        Ok(Self { scenarios })
    }

    /// Scenario names, in order.
    pub fn names(&self) -> Vec<String> {
        self.scenarios.keys().cloned().collect()
    }

    /// Number of scenarios.
    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    /// Whether the file declared no scenario.
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// The configuration of scenario `name`: `base` with its overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownScenario`] if `name` is not declared,
    /// or [`ScenarioError::Yaml`] if the merged document is not a valid
    /// configuration.
    pub fn apply(&self, name: &str, base: &SimulationConfig) -> Result<SimulationConfig, ScenarioError> {
        let overrides = self
            .scenarios
            .get(name)
            .ok_or_else(|| ScenarioError::UnknownScenario(name.to_owned()))?;
        let mut merged = serde_yml::to_value(base)?;
        merge(&mut merged, overrides.clone());
        let config: SimulationConfig = serde_yml::from_value(merged)?;
        Ok(config)
    }
}

/// Merge `overrides` into `base`: mappings key by key, anything else replaces.
fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Mapping(base), Value::Mapping(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        // An empty override leaves the base untouched.
        (_, Value::Null) => {}
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use rhizoflux_growth::PolicyKind;

    use super::*;

    const SCENARIOS: &str = r"
carbon_only:
  growth:
    policy: carbon_only
short_run:
  run:
    steps: 2
  starting_root:
    nodules: 1
baseline:
";

    fn set() -> ScenarioSet {
        let Ok(set) = ScenarioSet::parse(SCENARIOS) else {
            panic!("scenario file should parse");
        };
        set
    }

    #[test]
    fn names_are_sorted() {
        assert_eq!(set().names(), vec!["baseline", "carbon_only", "short_run"]);
    }

    #[test]
    fn overrides_merge_onto_base() {
        let base = SimulationConfig::default();
        let Ok(config) = set().apply("short_run", &base) else {
            panic!("scenario should apply");
        };
        assert_eq!(config.run.steps, 2);
        assert_eq!(config.starting_root.nodules, 1);
        // Sibling keys keep their base values.
        assert_eq!(config.run.time_step_seconds.to_bits(), base.run.time_step_seconds.to_bits());
        assert_eq!(config.starting_root.primary_segments, base.starting_root.primary_segments);
        assert_eq!(config.growth, base.growth);
    }

    #[test]
    fn enum_override() {
        let config = set().apply("carbon_only", &SimulationConfig::default()).ok();
        assert_eq!(config.map(|c| c.growth.policy), Some(PolicyKind::CarbonOnly));
    }

    #[test]
    fn empty_scenario_is_the_base() {
        let base = SimulationConfig::default();
        assert_eq!(set().apply("baseline", &base).ok(), Some(base));
    }

    #[test]
    fn unknown_scenario_rejected() {
        let result = set().apply("drought", &SimulationConfig::default());
        assert!(matches!(result, Err(ScenarioError::UnknownScenario(ref n)) if n == "drought"));
    }

    #[test]
    fn invalid_override_rejected() {
        let Ok(set) = ScenarioSet::parse("broken:\n  run:\n    steps: many\n") else {
            panic!("scenario file should parse");
        };
        let result = set.apply("broken", &SimulationConfig::default());
        assert!(matches!(result, Err(ScenarioError::Yaml { .. })));
    }
}
