//! Constrained root growth for the Rhizoflux simulation.
//!
//! Turns potential elongation and thickening into actual growth under
//! hexose and amino acid co-limitation, charges the consumption back to the
//! elements that supplied it, and advances the segment life cycle.
//!
//! Per step, in order:
//!
//! 1. [`potential`] -- unlimited elongation and thickening targets.
//! 2. [`supply`] -- the resource window behind each elongating apex.
//! 3. [`allocation`] -- post-order actualization under a [`GrowthPolicy`].
//! 4. [`conservation`] -- attributed consumption balances per episode.
//! 5. [`lifecycle`] -- emergence, stop and death transitions.
//!
//! # Modules
//!
//! - [`config`] -- [`GrowthParameters`] and [`PolicyKind`].
//! - [`error`] -- [`GrowthError`].
//! - [`policy`] -- Most-limiting-factor policies.

pub mod allocation;
pub mod config;
pub mod conservation;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod potential;
pub mod supply;

pub use allocation::{AllocationReport, Attribution, GrowthEpisode, GrowthProcess, allocate_growth};
pub use config::{GrowthParameters, PolicyKind};
pub use conservation::{ConservationAnomaly, ConservationResult, verify_conservation};
pub use error::GrowthError;
pub use lifecycle::{LifecycleReport, update_lifecycle};
pub use policy::{
    CarbonOnlyPolicy, DualLimitedPolicy, GrowthPolicy, LimitingFactor, VolumeLimit, policy_for,
};
pub use potential::compute_potentials;
pub use supply::{annotate_all, annotate_supply, scan_supply, supply_volume};
