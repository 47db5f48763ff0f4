//! Read-time aggregation of several provider fields into one aliased field.
//!
//! An [`Assembly`] is the value a receiver sees when its input name has no
//! same-named counterpart in the provider: an ordered list of
//! `(provider_field, conversion_factor)` pairs whose converted values are
//! summed key-wise. Nothing is cached; every [`Assembly::read`] recomputes
//! the sum from the live store.

use rhizoflux_graph::Field;
use serde::{Deserialize, Serialize};

use crate::binding::FieldSource;
use crate::error::CouplingError;

/// Ordered `(field, factor)` pairs aliased under one target name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    /// Receiver-side name of the aggregate.
    pub target: String,
    /// Provider fields and the factor each is multiplied by.
    pub terms: Vec<(String, f64)>,
}

impl Assembly {
    /// Create an assembly for `target` from its terms.
    pub fn new(target: impl Into<String>, terms: Vec<(String, f64)>) -> Self {
        Self {
            target: target.into(),
            terms,
        }
    }

    /// Read every constituent from `source` and sum the converted values.
    ///
    /// # Errors
    ///
    /// Fails if a constituent cannot be read, or with
    /// [`CouplingError::MissingKey`] if a constituent lacks a vertex present
    /// in the first one.
    pub fn read(&self, source: &dyn FieldSource) -> Result<Field, CouplingError> {
        let mut converted = Vec::with_capacity(self.terms.len());
        for (name, factor) in &self.terms {
            converted.push((name.as_str(), source.read_field(name)?, *factor));
        }
        sum_converted(&self.target, &converted)
    }
}

/// Key-wise sum of `field * factor` over all constituents.
///
/// The key set is taken from the first constituent.
///
/// # Errors
///
/// Returns [`CouplingError::EmptyAssembly`] with no constituent and
/// [`CouplingError::MissingKey`] when a later constituent lacks a key.
pub fn sum_converted(
    target: &str,
    constituents: &[(&str, Field, f64)],
) -> Result<Field, CouplingError> {
    let Some((_, first, _)) = constituents.first() else {
        return Err(CouplingError::EmptyAssembly(target.to_owned()));
    };
    let mut out = Field::new();
    for vertex in first.keys() {
        let mut total = 0.0;
        for (name, values, factor) in constituents {
            let Some(value) = values.get(vertex) else {
                return Err(CouplingError::MissingKey {
                    target: target.to_owned(),
                    field: (*name).to_owned(),
                    vertex: *vertex,
                });
            };
            total += value * factor;
        }
        out.insert(*vertex, total);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use rhizoflux_types::VertexId;

    use super::*;

    fn field(values: &[(u64, f64)]) -> Field {
        values.iter().map(|(k, v)| (VertexId(*k), *v)).collect()
    }

    fn pools() -> BTreeMap<String, Field> {
        let mut source = BTreeMap::new();
        source.insert("pool_A".to_owned(), field(&[(1, 5.0), (2, 7.0)]));
        source.insert("pool_B".to_owned(), field(&[(1, 3.0), (2, 0.0)]));
        source
    }

    #[test]
    fn aggregates_with_conversion_factors() {
        let assembly = Assembly::new(
            "X",
            vec![("pool_A".to_owned(), 2.0), ("pool_B".to_owned(), 10.0)],
        );
        let result = assembly.read(&pools()).ok();
        assert_eq!(result, Some(field(&[(1, 40.0), (2, 14.0)])));
    }

    #[test]
    fn recomputed_on_every_read() {
        let assembly = Assembly::new("X", vec![("pool_A".to_owned(), 1.0)]);
        let mut source = pools();
        let before = assembly.read(&source).ok();
        source.insert("pool_A".to_owned(), field(&[(1, 1.0), (2, 1.0)]));
        let after = assembly.read(&source).ok();
        assert_eq!(before, Some(field(&[(1, 5.0), (2, 7.0)])));
        assert_eq!(after, Some(field(&[(1, 1.0), (2, 1.0)])));
    }

    #[test]
    fn missing_key_is_fatal() {
        let mut source = pools();
        source.insert("pool_B".to_owned(), field(&[(1, 3.0)]));
        let assembly = Assembly::new(
            "X",
            vec![("pool_A".to_owned(), 1.0), ("pool_B".to_owned(), 1.0)],
        );
        let result = assembly.read(&source);
        assert!(matches!(
            result,
            Err(CouplingError::MissingKey { ref field, vertex: VertexId(2), .. }) if field == "pool_B"
        ));
    }

    #[test]
    fn empty_assembly_rejected() {
        let assembly = Assembly::new("X", Vec::new());
        assert!(matches!(assembly.read(&pools()), Err(CouplingError::EmptyAssembly(_))));
    }

    #[test]
    fn unknown_constituent_propagates() {
        let assembly = Assembly::new("X", vec![("pool_C".to_owned(), 1.0)]);
        assert!(matches!(assembly.read(&pools()), Err(CouplingError::Graph(_))));
    }
}
