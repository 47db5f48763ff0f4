//! Hexose and amino acid pool balance.
//!
//! The pool balance is a coupled component: it declares the growth ledgers
//! it needs as inputs and reads them from the allocator through
//! [`Bindings`], either under the same names or through a translator table.
//!
//! Per element, with `m0` the structural mass at step start and `m` the mass
//! after growth:
//!
//! ```text
//! amount = C * m0 - consumed
//! C'     = amount / m        if amount >= 0   (dilution by new mass)
//! C'     = 0, deficit = -amount               otherwise
//! ```
//!
//! Elements without structural mass carry no pool and are left untouched.

use rhizoflux_coupling::{Bindings, CoupledModel, CouplingError, ModelInterface, link};
use rhizoflux_graph::fields::ELEMENT_FIELDS;
use rhizoflux_graph::{FieldOwner, GraphError, RootGraph};
use rhizoflux_types::VertexId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::CouplingConfig;

/// Name of the pool balance component.
pub const POOL_BALANCE: &str = "pool_balance";

/// Name of the allocator component.
pub const ALLOCATOR: &str = "allocator";

/// Input category under which the pool balance declares the ledgers.
pub const LEDGER_CATEGORY: &str = "growth_ledgers";

/// Hexose consumed by growth, as seen by the pool balance.
pub const HEXOSE_INPUT: &str = "hexose_consumption_by_growth";

/// Amino acids consumed by growth, as seen by the pool balance.
pub const AMINO_ACIDS_INPUT: &str = "amino_acids_consumption_by_growth";

/// Errors raised by the pool balance.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Linking or reading the ledgers failed.
    #[error("coupling error: {source}")]
    Coupling {
        /// The underlying coupling error.
        #[from]
        source: CouplingError,
    },

    /// A graph access failed.
    #[error("graph error: {source}")]
    Graph {
        /// The underlying graph error.
        #[from]
        source: GraphError,
    },

    /// The balance produced a non-finite value.
    #[error("non-finite {quantity} for vertex {vertex}: {value}")]
    NonFinite {
        /// The element concerned.
        vertex: VertexId,
        /// Name of the offending quantity.
        quantity: &'static str,
        /// The offending value.
        value: f64,
    },
}

/// Outcome of one pool balance pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolReport {
    /// Elements whose pools were rebalanced.
    pub updated: usize,
    /// Elements that ended the step with a hexose deficit.
    pub hexose_deficits: usize,
    /// Elements that ended the step with an amino acid deficit.
    pub amino_acids_deficits: usize,
    /// Sum of hexose deficits (mol).
    pub total_hexose_deficit: f64,
    /// Sum of amino acid deficits (mol).
    pub total_amino_acids_deficit: f64,
}

/// Coupling surface of the allocator: every field it owns.
pub fn allocator_interface() -> ModelInterface {
    let owned: Vec<&str> = ELEMENT_FIELDS
        .iter()
        .filter(|spec| spec.owner == FieldOwner::Allocator)
        .map(|spec| spec.name)
        .collect();
    ModelInterface::new(ALLOCATOR).with_provides(&owned)
}

/// Coupling surface of the pool balance.
pub fn pool_balance_interface() -> ModelInterface {
    ModelInterface::new(POOL_BALANCE)
        .with_inputs(LEDGER_CATEGORY, &[HEXOSE_INPUT, AMINO_ACIDS_INPUT])
        .with_provides(&["C_hexose_root", "AA", "deficit_hexose_root", "deficit_AA_root"])
}

/// The pool balance, linked to its ledger provider.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolBalance {
    bindings: Bindings,
}

impl PoolBalance {
    /// Link the pool balance inputs to `provider`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Coupling`] if an input cannot be bound.
    pub fn link(provider: &dyn CoupledModel, coupling: &CouplingConfig) -> Result<Self, PoolError> {
        let bindings = link(
            &pool_balance_interface(),
            provider,
            LEDGER_CATEGORY,
            &coupling.translator,
            coupling.same_names,
        )?;
        Ok(Self { bindings })
    }

    /// Subtract this step's growth consumption from every element's pools.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Coupling`] on a ledger read failure (including a
    /// vertex missing from one ledger), [`PoolError::Graph`] on a broken
    /// write, and [`PoolError::NonFinite`] on numerical failure.
    pub fn apply(&self, graph: &mut RootGraph) -> Result<PoolReport, PoolError> {
        let hexose_used = self.bindings.read(HEXOSE_INPUT, &*graph)?;
        let amino_acids_used = self.bindings.read(AMINO_ACIDS_INPUT, &*graph)?;

        let mut report = PoolReport::default();
        for (id, consumed_hexose) in &hexose_used {
            let consumed_amino_acids =
                amino_acids_used
                    .get(id)
                    .copied()
                    .ok_or_else(|| CouplingError::MissingKey {
                        target: POOL_BALANCE.to_owned(),
                        field: AMINO_ACIDS_INPUT.to_owned(),
                        vertex: *id,
                    })?;

            let element = graph.element(*id)?;
            let mass = element.struct_mass;
            if mass <= 0.0 {
                continue;
            }
            let initial_mass = element.initial_struct_mass();
            let (c_hexose, hexose_deficit) =
                rebalance(element.c_hexose_root, initial_mass, *consumed_hexose, mass);
            let (amino_acids, amino_acids_deficit) =
                rebalance(element.amino_acids, initial_mass, consumed_amino_acids, mass);

            for (quantity, value) in [
                ("C_hexose_root", c_hexose),
                ("AA", amino_acids),
                ("deficit_hexose_root", hexose_deficit),
                ("deficit_AA_root", amino_acids_deficit),
            ] {
                if !value.is_finite() {
                    return Err(PoolError::NonFinite {
                        vertex: *id,
                        quantity,
                        value,
                    });
                }
                graph.set_field(quantity, *id, value, FieldOwner::PoolBalance)?;
            }

            if hexose_deficit > 0.0 {
                warn!(vertex = %id, deficit = hexose_deficit, "hexose pool in deficit");
                report.hexose_deficits = report.hexose_deficits.saturating_add(1);
                report.total_hexose_deficit += hexose_deficit;
            }
            if amino_acids_deficit > 0.0 {
                warn!(vertex = %id, deficit = amino_acids_deficit, "amino acid pool in deficit");
                report.amino_acids_deficits = report.amino_acids_deficits.saturating_add(1);
                report.total_amino_acids_deficit += amino_acids_deficit;
            }
            report.updated = report.updated.saturating_add(1);
        }

        debug!(
            updated = report.updated,
            hexose_deficits = report.hexose_deficits,
            amino_acids_deficits = report.amino_acids_deficits,
            "pools balanced"
        );
        Ok(report)
    }
}

/// New concentration and deficit of one pool.
fn rebalance(concentration: f64, initial_mass: f64, consumed: f64, mass: f64) -> (f64, f64) {
    let amount = concentration.mul_add(initial_mass, -consumed);
    if amount < 0.0 {
        (0.0, -amount)
    } else {
        (amount / mass, 0.0)
    }
}
