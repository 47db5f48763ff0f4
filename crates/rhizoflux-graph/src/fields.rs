//! Named scalar fields over the root graph.
//!
//! Coupled components exchange data as named fields: a mapping from vertex
//! to value for one property. The typed [`RootElement`] members are exposed
//! through the static [`ELEMENT_FIELDS`] table, each entry naming exactly one
//! component allowed to write it through the named interface. Any other name
//! is stored in the element's `extra` map and may be written by anyone.
//!
//! | Owner | Fields |
//! |-------|--------|
//! | `Topology` | `root_tissue_density` |
//! | `StepInit` | `initial_*` |
//! | `PotentialGrowth` | `potential_length`, `potential_radius` |
//! | `SupplyScan` | supply window summaries |
//! | `Allocator` | geometry, ledgers, `resp_growth`, `struct_mass_produced` |
//! | `Lifecycle` | timestamps |
//! | `PoolBalance` | `C_hexose_root`, `AA`, deficits |

use std::collections::BTreeMap;

use rhizoflux_types::VertexId;
use serde::{Deserialize, Serialize};

use crate::element::RootElement;
use crate::error::GraphError;

/// Values of one named property keyed by vertex.
pub type Field = BTreeMap<VertexId, f64>;

/// Component allowed to write a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOwner {
    /// Topology construction (element creation).
    Topology,
    /// Per-step snapshot and ledger reset.
    StepInit,
    /// Potential growth computation.
    PotentialGrowth,
    /// Resource supply scan.
    SupplyScan,
    /// Constrained growth allocator.
    Allocator,
    /// Segment life-cycle state machine.
    Lifecycle,
    /// Hexose and amino acid pool balance.
    PoolBalance,
    /// A coupled component outside this workspace.
    External,
}

/// Accessor pair for one typed element field.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Property name as seen by coupled components.
    pub name: &'static str,
    /// The only component allowed to write the field by name.
    pub owner: FieldOwner,
    /// Read the value from an element.
    pub get: fn(&RootElement) -> f64,
    /// Write the value into an element.
    pub set: fn(&mut RootElement, f64),
}

macro_rules! field {
    ($name:literal, $owner:ident, $member:ident) => {
        FieldSpec {
            name: $name,
            owner: FieldOwner::$owner,
            get: |e| e.$member,
            set: |e, v| e.$member = v,
        }
    };
}

/// All typed element fields.
pub const ELEMENT_FIELDS: &[FieldSpec] = &[
    field!("radius", Allocator, radius),
    field!("length", Allocator, length),
    field!("volume", Allocator, volume),
    field!("struct_mass", Allocator, struct_mass),
    field!("root_tissue_density", Topology, tissue_density),
    field!("potential_length", PotentialGrowth, potential_length),
    field!("potential_radius", PotentialGrowth, potential_radius),
    field!("initial_length", StepInit, initial_length),
    field!("initial_radius", StepInit, initial_radius),
    field!("initial_volume", StepInit, initial_volume),
    field!("C_hexose_root", PoolBalance, c_hexose_root),
    field!("AA", PoolBalance, amino_acids),
    field!("hexose_consumption_by_growth", Allocator, hexose_consumption_by_growth),
    field!("amino_acids_consumption_by_growth", Allocator, amino_acids_consumption_by_growth),
    field!("resp_growth", Allocator, resp_growth),
    field!("struct_mass_produced", Allocator, struct_mass_produced),
    field!("hexose_possibly_required_for_elongation", SupplyScan, hexose_possibly_required_for_elongation),
    field!("amino_acids_possibly_required_for_elongation", SupplyScan, amino_acids_possibly_required_for_elongation),
    field!("struct_mass_contributing_to_elongation", SupplyScan, struct_mass_contributing_to_elongation),
    field!("growing_zone_C_hexose_root", SupplyScan, growing_zone_c_hexose_root),
    field!("deficit_hexose_root", PoolBalance, deficit_hexose_root),
    field!("deficit_AA_root", PoolBalance, deficit_amino_acids_root),
    field!("time_since_emergence", Lifecycle, time_since_emergence),
    field!("thermal_time_since_emergence", Lifecycle, thermal_time_since_emergence),
    field!("time_since_growth_stopped", Lifecycle, time_since_growth_stopped),
    field!("time_since_death", Lifecycle, time_since_death),
];

/// Look up the accessor of a typed field by name.
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    ELEMENT_FIELDS.iter().find(|spec| spec.name == name)
}

impl RootElement {
    /// Read a named field, typed fields first, then extra fields.
    pub fn field_value(&self, name: &str) -> Option<f64> {
        match field_spec(name) {
            Some(spec) => Some((spec.get)(self)),
            None => self.extra.get(name).copied(),
        }
    }

    /// Write a named field on behalf of `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotOwner`] if `writer` is not the declared owner
    /// of a typed field.
    pub fn set_field_value(
        &mut self,
        name: &str,
        value: f64,
        writer: FieldOwner,
    ) -> Result<(), GraphError> {
        match field_spec(name) {
            Some(spec) if spec.owner != writer => Err(GraphError::NotOwner {
                field: name.to_owned(),
                owner: spec.owner,
                writer,
            }),
            Some(spec) => {
                (spec.set)(self, value);
                Ok(())
            }
            None => {
                self.extra.insert(name.to_owned(), value);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rhizoflux_types::{OrganKind, SegmentType};

    use super::*;

    fn element() -> RootElement {
        RootElement::new(OrganKind::Segment, SegmentType::AfterEmergence, 1e-4, 0.01, 1e5)
            .with_pools(2e-3, 5e-4)
    }

    #[test]
    fn field_names_are_unique() {
        for (i, a) in ELEMENT_FIELDS.iter().enumerate() {
            for b in ELEMENT_FIELDS.iter().skip(i.saturating_add(1)) {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn typed_fields_read_members() {
        let e = element();
        assert_eq!(e.field_value("C_hexose_root").map(f64::to_bits), Some(2e-3_f64.to_bits()));
        assert_eq!(e.field_value("AA").map(f64::to_bits), Some(5e-4_f64.to_bits()));
        assert!(e.field_value("unknown").is_none());
    }

    #[test]
    fn owner_is_enforced_on_typed_fields() {
        let mut e = element();
        let denied = e.set_field_value("C_hexose_root", 1.0, FieldOwner::Allocator);
        assert!(matches!(denied, Err(GraphError::NotOwner { owner: FieldOwner::PoolBalance, .. })));

        let allowed = e.set_field_value("C_hexose_root", 1.0, FieldOwner::PoolBalance);
        assert!(allowed.is_ok());
        assert_eq!(e.c_hexose_root.to_bits(), 1.0_f64.to_bits());
    }

    #[test]
    fn unknown_names_land_in_extra() {
        let mut e = element();
        assert!(e.set_field_value("pool_A", 5.0, FieldOwner::External).is_ok());
        assert_eq!(e.field_value("pool_A").map(f64::to_bits), Some(5.0_f64.to_bits()));
    }
}
