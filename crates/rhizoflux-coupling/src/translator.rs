//! Linking receiver inputs to provider fields.
//!
//! Independently developed components declare the inputs they need, grouped
//! by category, and the fields they provide. [`link`] resolves one category
//! of a receiver against a provider, either name for name or through a
//! [`TranslatorTable`] of `{receiver_field: {provider_field: factor}}`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assembly::Assembly;
use crate::binding::{Binding, Bindings};
use crate::error::CouplingError;

/// The coupling surface of a component.
pub trait CoupledModel {
    /// Human-readable component name.
    fn name(&self) -> &str;

    /// Input names declared under `category`, or `None` if the category is
    /// not declared.
    fn inputs(&self, category: &str) -> Option<Vec<String>>;

    /// Whether the component exposes a field called `field`.
    fn provides(&self, field: &str) -> bool;
}

/// Declarative [`CoupledModel`]: inputs by category plus provided fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInterface {
    /// Component name.
    pub name: String,
    /// Declared inputs grouped by category.
    #[serde(default)]
    pub inputs: BTreeMap<String, Vec<String>>,
    /// Fields the component writes and exposes.
    #[serde(default)]
    pub provides: BTreeSet<String>,
}

impl ModelInterface {
    /// Create an interface with no inputs and no provided fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: BTreeMap::new(),
            provides: BTreeSet::new(),
        }
    }

    /// Declare inputs under `category` (builder style).
    #[must_use]
    pub fn with_inputs(mut self, category: &str, names: &[&str]) -> Self {
        self.inputs
            .entry(category.to_owned())
            .or_default()
            .extend(names.iter().map(|n| (*n).to_owned()));
        self
    }

    /// Declare provided fields (builder style).
    #[must_use]
    pub fn with_provides(mut self, names: &[&str]) -> Self {
        self.provides.extend(names.iter().map(|n| (*n).to_owned()));
        self
    }
}

impl CoupledModel for ModelInterface {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self, category: &str) -> Option<Vec<String>> {
        self.inputs.get(category).cloned()
    }

    fn provides(&self, field: &str) -> bool {
        self.provides.contains(field)
    }
}

/// Name translation between two components:
/// `receiver_field -> provider_field -> conversion factor`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TranslatorTable(pub BTreeMap<String, BTreeMap<String, f64>>);

impl TranslatorTable {
    /// Load a translator table from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::Io`] if the file cannot be read, or
    /// [`CouplingError::Yaml`] if it is not a valid table.
    pub fn from_file(path: &Path) -> Result<Self, CouplingError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a translator table from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::Yaml`] if the string is not a valid table.
    pub fn parse(yaml: &str) -> Result<Self, CouplingError> {
        let table: Self = serde_yml::from_str(yaml)?;
        Ok(table)
    }

    /// Constituent terms of `target`, ordered by provider field name.
    pub fn terms(&self, target: &str) -> Option<Vec<(String, f64)>> {
        self.0
            .get(target)
            .map(|terms| terms.iter().map(|(k, v)| (k.clone(), *v)).collect())
    }

    /// Whether the table has no entry.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Bind every `category` input of `receiver` to fields of `provider`.
///
/// With `same_names`, each input binds directly to the provider field of the
/// same name. Otherwise each input becomes an [`Assembly`] of the provider
/// fields listed for it in `translator`.
///
/// # Errors
///
/// Returns [`CouplingError::UnknownCategory`] if the receiver does not
/// declare `category`, [`CouplingError::MissingTranslation`] if an input has
/// no translator entry, and [`CouplingError::NotProvided`] if a referenced
/// provider field is not exposed.
pub fn link(
    receiver: &dyn CoupledModel,
    provider: &dyn CoupledModel,
    category: &str,
    translator: &TranslatorTable,
    same_names: bool,
) -> Result<Bindings, CouplingError> {
    let inputs = receiver
        .inputs(category)
        .ok_or_else(|| CouplingError::UnknownCategory {
            model: receiver.name().to_owned(),
            category: category.to_owned(),
        })?;

    let not_provided = |field: &str| CouplingError::NotProvided {
        provider: provider.name().to_owned(),
        field: field.to_owned(),
    };

    let mut bindings = Bindings::new();
    for input in inputs {
        let binding = if same_names {
            if !provider.provides(&input) {
                return Err(not_provided(&input));
            }
            Binding::Direct(input.clone())
        } else {
            let terms = translator
                .terms(&input)
                .ok_or_else(|| CouplingError::MissingTranslation(input.clone()))?;
            if let Some((missing, _)) = terms.iter().find(|(field, _)| !provider.provides(field)) {
                return Err(not_provided(missing));
            }
            Binding::Assembly(Assembly::new(input.clone(), terms))
        };
        debug!(receiver = receiver.name(), input = %input, ?binding, "input bound");
        bindings.insert(input, binding);
    }

    info!(
        receiver = receiver.name(),
        provider = provider.name(),
        category,
        same_names,
        bound = bindings.len(),
        "models linked"
    );
    Ok(bindings)
}
