//! Root architecture and per-element property storage for the Rhizoflux simulation.
//!
//! This crate models the root system as a tree: elements (segments, apices,
//! nodules) are vertices; each element is attached to its parent by either a
//! same-axis successor edge (`<`) or a lateral branch edge (`+`).
//!
//! # Modules
//!
//! - [`element`] -- [`RootElement`] with geometry, pools, ledgers, and the
//!   per-step [`SupplyWindow`] annotation.
//! - [`error`] -- Error types for graph operations.
//! - [`fields`] -- Static table of named scalar fields with one declared
//!   writer per field.
//! - [`root_graph`] -- The tree store: insertion, navigation, post-order
//!   traversal, and named field views.
//! - [`starting_root`] -- Default seed architecture used when no topology
//!   model provides one.
//!
//! [`RootElement`]: element::RootElement
//! [`SupplyWindow`]: element::SupplyWindow

pub mod element;
pub mod error;
pub mod fields;
pub mod root_graph;
pub mod starting_root;

// Re-export primary types at crate root.
pub use element::{RootElement, SupplyContribution, SupplyWindow, radius_for_volume, volume_of};
pub use error::GraphError;
pub use fields::{Field, FieldOwner, FieldSpec, field_spec};
pub use root_graph::RootGraph;
pub use starting_root::{StartingRootIds, StartingRootSpec, create_starting_root};
