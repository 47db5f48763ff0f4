//! Shared type definitions for the Rhizoflux root growth simulation.
//!
//! This crate is the single source of truth for identifiers and
//! enumerations used across the workspace.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for vertex and run identifiers
//! - [`enums`] -- Segment life-cycle types, edge types, and organ kinds

pub mod enums;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{EdgeType, OrganKind, SegmentType};
pub use ids::{RunId, VertexId};
