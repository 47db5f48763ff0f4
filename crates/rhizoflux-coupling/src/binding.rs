//! Bound receiver inputs and the field stores they read from.

use std::collections::BTreeMap;

use rhizoflux_graph::{Field, GraphError, RootGraph};
use serde::{Deserialize, Serialize};

use crate::assembly::Assembly;
use crate::error::CouplingError;

/// Anything that can produce a named field snapshot.
pub trait FieldSource {
    /// Read the current values of `name`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownField`] when the source has no such field.
    fn read_field(&self, name: &str) -> Result<Field, GraphError>;
}

impl FieldSource for RootGraph {
    fn read_field(&self, name: &str) -> Result<Field, GraphError> {
        self.field(name)
    }
}

impl FieldSource for BTreeMap<String, Field> {
    fn read_field(&self, name: &str) -> Result<Field, GraphError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| GraphError::UnknownField(name.to_owned()))
    }
}

/// How one receiver input is resolved against the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// Shared view of the provider field with this name.
    Direct(String),
    /// Converted sum of several provider fields.
    Assembly(Assembly),
}

impl Binding {
    /// Resolve the binding against `source`.
    ///
    /// # Errors
    ///
    /// Propagates read failures and assembly key mismatches.
    pub fn read(&self, source: &dyn FieldSource) -> Result<Field, CouplingError> {
        match self {
            Self::Direct(name) => Ok(source.read_field(name)?),
            Self::Assembly(assembly) => assembly.read(source),
        }
    }
}

/// All inputs bound for one receiver, keyed by receiver-side name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bindings {
    entries: BTreeMap<String, Binding>,
}

impl Bindings {
    /// Create an empty binding set.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Bind `name`, replacing any earlier binding of the same name.
    pub fn insert(&mut self, name: impl Into<String>, binding: Binding) {
        self.entries.insert(name.into(), binding);
    }

    /// The binding of `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    /// Bound receiver names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of bound inputs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read the receiver input `name` through its binding.
    ///
    /// # Errors
    ///
    /// Returns [`CouplingError::Unbound`] if `name` was never linked, or the
    /// binding's own read failure.
    pub fn read(&self, name: &str, source: &dyn FieldSource) -> Result<Field, CouplingError> {
        self.entries
            .get(name)
            .ok_or_else(|| CouplingError::Unbound(name.to_owned()))?
            .read(source)
    }
}
