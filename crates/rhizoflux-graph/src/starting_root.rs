//! Default starting root system for the Rhizoflux simulation.
//!
//! Builds a small seed architecture when no topology model provides one:
//!
//! ```text
//! base (support) -< s1 -< s2 -< ... -< apex
//!                   |+    |+
//!                lateral lateral   (primordia, zero length)
//!                   |+
//!                 nodule            (first `nodules` segments)
//! ```

use rhizoflux_types::{EdgeType, OrganKind, SegmentType, VertexId};
use serde::{Deserialize, Serialize};

use crate::element::RootElement;
use crate::error::GraphError;
use crate::root_graph::RootGraph;

/// Shape and initial content of the seed root system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartingRootSpec {
    /// Radius of the primary axis (m).
    #[serde(default = "default_primary_radius")]
    pub primary_radius: f64,
    /// Length of each primary segment (m).
    #[serde(default = "default_segment_length")]
    pub segment_length: f64,
    /// Number of emerged primary segments, apex included.
    #[serde(default = "default_primary_segments")]
    pub primary_segments: u32,
    /// Whether every primary segment below the apex carries a lateral primordium.
    #[serde(default = "default_true")]
    pub lateral_primordia: bool,
    /// Radius of lateral primordia (m).
    #[serde(default = "default_lateral_radius")]
    pub lateral_radius: f64,
    /// Number of nodules, attached to the most basal primary segments.
    #[serde(default)]
    pub nodules: u32,
    /// Initial nodule radius (m).
    #[serde(default = "default_nodule_radius")]
    pub nodule_radius: f64,
    /// Tissue density of every element (g m-3).
    #[serde(default = "default_tissue_density")]
    pub tissue_density: f64,
    /// Initial hexose concentration (mol g-1).
    #[serde(default = "default_c_hexose_root")]
    pub c_hexose_root: f64,
    /// Initial amino acid concentration (mol g-1).
    #[serde(default = "default_amino_acids")]
    pub amino_acids: f64,
}

const fn default_primary_radius() -> f64 {
    3.5e-4
}
const fn default_segment_length() -> f64 {
    3e-3
}
const fn default_primary_segments() -> u32 {
    3
}
const fn default_true() -> bool {
    true
}
const fn default_lateral_radius() -> f64 {
    1.5e-4
}
const fn default_nodule_radius() -> f64 {
    5e-5
}
const fn default_tissue_density() -> f64 {
    1e5
}
const fn default_c_hexose_root() -> f64 {
    1e-3
}
const fn default_amino_acids() -> f64 {
    1e-4
}

impl Default for StartingRootSpec {
    fn default() -> Self {
        Self {
            primary_radius: default_primary_radius(),
            segment_length: default_segment_length(),
            primary_segments: default_primary_segments(),
            lateral_primordia: true,
            lateral_radius: default_lateral_radius(),
            nodules: 0,
            nodule_radius: default_nodule_radius(),
            tissue_density: default_tissue_density(),
            c_hexose_root: default_c_hexose_root(),
            amino_acids: default_amino_acids(),
        }
    }
}

/// Identifiers of the seed elements, returned alongside the graph so callers
/// can address specific elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartingRootIds {
    /// Zero-length support at the base.
    pub base: VertexId,
    /// Primary segments from base to apex.
    pub primary: Vec<VertexId>,
    /// Growing tip of the primary axis (last of `primary`, or the base).
    pub apex: VertexId,
    /// Lateral primordia.
    pub laterals: Vec<VertexId>,
    /// Nodules.
    pub nodules: Vec<VertexId>,
}

/// Build the seed root system described by `spec`.
///
/// # Errors
///
/// Propagates [`GraphError`] from graph insertion.
pub fn create_starting_root(
    spec: &StartingRootSpec,
) -> Result<(RootGraph, StartingRootIds), GraphError> {
    let mut graph = RootGraph::new();
    let density = spec.tissue_density;

    let base = graph.add_root(
        RootElement::new(OrganKind::Segment, SegmentType::Support, spec.primary_radius, 0.0, density)
            .with_pools(spec.c_hexose_root, spec.amino_acids),
    )?;

    let mut primary = Vec::new();
    let mut previous = base;
    for _ in 0..spec.primary_segments {
        let segment = RootElement::new(
            OrganKind::Segment,
            SegmentType::AfterEmergence,
            spec.primary_radius,
            spec.segment_length,
            density,
        )
        .with_pools(spec.c_hexose_root, spec.amino_acids);
        previous = graph.add_child(previous, EdgeType::Successor, segment)?;
        primary.push(previous);
    }
    let apex = previous;

    let mut laterals = Vec::new();
    if spec.lateral_primordia {
        for &carrier in primary.iter().filter(|id| **id != apex) {
            let primordium = RootElement::new(
                OrganKind::Segment,
                SegmentType::BeforeEmergence,
                spec.lateral_radius,
                0.0,
                density,
            )
            .with_pools(spec.c_hexose_root, spec.amino_acids);
            laterals.push(graph.add_child(carrier, EdgeType::Branch, primordium)?);
        }
    }

    let mut nodules = Vec::new();
    let carriers = usize::try_from(spec.nodules).unwrap_or(usize::MAX);
    for &carrier in primary.iter().take(carriers) {
        let nodule = RootElement::new(
            OrganKind::Nodule,
            SegmentType::AfterEmergence,
            spec.nodule_radius,
            0.0,
            density,
        )
        .with_pools(spec.c_hexose_root, spec.amino_acids);
        nodules.push(graph.add_child(carrier, EdgeType::Branch, nodule)?);
    }

    let ids = StartingRootIds {
        base,
        primary,
        apex,
        laterals,
        nodules,
    };
    Ok((graph, ids))
}
