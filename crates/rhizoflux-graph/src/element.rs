//! Root element state: geometry, resource pools, per-step ledgers, and
//! life-cycle bookkeeping.
//!
//! A [`RootElement`] is the hot, per-step state of one vertex of the root
//! graph. Geometry obeys two invariants at every quiescent point:
//!
//! ```text
//! volume      == volume_of(kind, radius, length)
//! struct_mass == volume * tissue_density
//! ```
//!
//! Use [`RootElement::refresh_geometry`] after changing radius or length.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use rhizoflux_types::{OrganKind, SegmentType, VertexId};
use serde::{Deserialize, Serialize};

/// Volume of an element from its radius and length.
///
/// Segments are cylinders (`π r² L`); nodules are spheres (`4/3 π r³`) and
/// ignore their length.
pub fn volume_of(kind: OrganKind, radius: f64, length: f64) -> f64 {
    match kind {
        OrganKind::Segment => PI * radius * radius * length,
        OrganKind::Nodule => 4.0 / 3.0 * PI * radius * radius * radius,
    }
}

/// Radius giving `volume` for an element of the given kind and length.
///
/// Returns `None` for a segment of non-positive length or for a negative
/// volume, where no radius exists.
pub fn radius_for_volume(kind: OrganKind, volume: f64, length: f64) -> Option<f64> {
    if volume < 0.0 {
        return None;
    }
    match kind {
        OrganKind::Segment => (length > 0.0).then(|| (volume / (PI * length)).sqrt()),
        OrganKind::Nodule => Some((3.0 * volume / (4.0 * PI)).cbrt()),
    }
}

// ---------------------------------------------------------------------------
// Supply window
// ---------------------------------------------------------------------------

/// What one element contributes to the supply window of a growing apex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupplyContribution {
    /// The contributing element.
    pub vertex: VertexId,
    /// Hexose the element can provide (mol).
    pub hexose: f64,
    /// Amino acids the element can provide (mol).
    pub amino_acids: f64,
    /// Structural mass the contribution is drawn from (g).
    pub struct_mass: f64,
}

/// Resource reachable by an apex within its growing-zone volume window.
///
/// Contributions are ordered from the apex toward the root. Totals are the
/// sums of the per-element contributions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupplyWindow {
    /// Per-element contributions, apex first.
    pub contributions: Vec<SupplyContribution>,
    /// Total hexose available (mol).
    pub total_hexose: f64,
    /// Total amino acids available (mol).
    pub total_amino_acids: f64,
    /// Total structural mass contributing (g).
    pub total_struct_mass: f64,
}

impl SupplyWindow {
    /// Append a contribution and update the totals.
    pub fn push(&mut self, contribution: SupplyContribution) {
        self.total_hexose += contribution.hexose;
        self.total_amino_acids += contribution.amino_acids;
        self.total_struct_mass += contribution.struct_mass;
        self.contributions.push(contribution);
    }

    /// Identifiers of the contributing elements, apex first.
    pub fn vertices(&self) -> Vec<VertexId> {
        self.contributions.iter().map(|c| c.vertex).collect()
    }

    /// Whether no element contributes.
    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Root element
// ---------------------------------------------------------------------------

/// Mutable state of one root element.
///
/// Concentrations are expressed per gram of structural mass; ledgers are
/// amounts for the current step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootElement {
    /// Segment or nodule.
    pub kind: OrganKind,
    /// Life-cycle state.
    pub segment_type: SegmentType,

    // --- Geometry ---
    /// Radius (m).
    pub radius: f64,
    /// Length (m).
    pub length: f64,
    /// Volume (m3).
    pub volume: f64,
    /// Structural dry mass (g).
    pub struct_mass: f64,
    /// Tissue density (g m-3).
    pub tissue_density: f64,

    // --- Potential growth (input of the allocator) ---
    /// Length the element would reach without resource limitation (m).
    pub potential_length: f64,
    /// Radius the element would reach without resource limitation (m).
    pub potential_radius: f64,

    // --- Step-start snapshot ---
    /// Length at the start of the step (m).
    pub initial_length: f64,
    /// Radius at the start of the step (m).
    pub initial_radius: f64,
    /// Volume at the start of the step (m3).
    pub initial_volume: f64,

    // --- Resource pools ---
    /// Hexose concentration (mol g-1).
    pub c_hexose_root: f64,
    /// Amino acid concentration (mol g-1).
    pub amino_acids: f64,

    // --- Per-step ledgers ---
    /// Hexose drawn from this element's pool by growth (mol).
    pub hexose_consumption_by_growth: f64,
    /// Amino acids drawn from this element's pool by growth (mol).
    pub amino_acids_consumption_by_growth: f64,
    /// Growth respiration charged to this element (mol C).
    pub resp_growth: f64,
    /// Net structural mass produced this step (g).
    pub struct_mass_produced: f64,

    // --- Supply window summary (apices) ---
    /// Hexose reachable by elongation (mol).
    pub hexose_possibly_required_for_elongation: f64,
    /// Amino acids reachable by elongation (mol).
    pub amino_acids_possibly_required_for_elongation: f64,
    /// Structural mass of the supply window (g).
    pub struct_mass_contributing_to_elongation: f64,
    /// Average hexose concentration of the supply window (mol g-1).
    pub growing_zone_c_hexose_root: f64,

    // --- Deficits (pool balance) ---
    /// Hexose missing after the pool balance (mol).
    pub deficit_hexose_root: f64,
    /// Amino acids missing after the pool balance (mol).
    pub deficit_amino_acids_root: f64,

    // --- Timestamps ---
    /// Time since emergence (s).
    pub time_since_emergence: f64,
    /// Thermal time since emergence (degree-seconds).
    pub thermal_time_since_emergence: f64,
    /// Time since growth stopped (s).
    pub time_since_growth_stopped: f64,
    /// Time since death (s).
    pub time_since_death: f64,

    /// Per-step supply window, set on apices by the supply scan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supply: Option<SupplyWindow>,

    /// Fields contributed by coupled components under their own names.
    #[serde(default)]
    pub extra: BTreeMap<String, f64>,
}

impl RootElement {
    /// Create an element with consistent geometry and empty pools.
    pub fn new(
        kind: OrganKind,
        segment_type: SegmentType,
        radius: f64,
        length: f64,
        tissue_density: f64,
    ) -> Self {
        let volume = volume_of(kind, radius, length);
        Self {
            kind,
            segment_type,
            radius,
            length,
            volume,
            struct_mass: volume * tissue_density,
            tissue_density,
            potential_length: length,
            potential_radius: radius,
            initial_length: length,
            initial_radius: radius,
            initial_volume: volume,
            c_hexose_root: 0.0,
            amino_acids: 0.0,
            hexose_consumption_by_growth: 0.0,
            amino_acids_consumption_by_growth: 0.0,
            resp_growth: 0.0,
            struct_mass_produced: 0.0,
            hexose_possibly_required_for_elongation: 0.0,
            amino_acids_possibly_required_for_elongation: 0.0,
            struct_mass_contributing_to_elongation: 0.0,
            growing_zone_c_hexose_root: 0.0,
            deficit_hexose_root: 0.0,
            deficit_amino_acids_root: 0.0,
            time_since_emergence: 0.0,
            thermal_time_since_emergence: 0.0,
            time_since_growth_stopped: 0.0,
            time_since_death: 0.0,
            supply: None,
            extra: BTreeMap::new(),
        }
    }

    /// Set both resource concentrations (builder style).
    #[must_use]
    pub fn with_pools(mut self, c_hexose_root: f64, amino_acids: f64) -> Self {
        self.c_hexose_root = c_hexose_root;
        self.amino_acids = amino_acids;
        self
    }

    /// Whether this is a zero-length support placeholder.
    pub fn is_support(&self) -> bool {
        self.segment_type == SegmentType::Support && self.length <= 0.0
    }

    /// Hexose content of the element (mol).
    pub fn hexose_amount(&self) -> f64 {
        self.c_hexose_root * self.struct_mass
    }

    /// Amino acid content of the element (mol).
    pub fn amino_acids_amount(&self) -> f64 {
        self.amino_acids * self.struct_mass
    }

    /// Structural mass at the step-start snapshot (g).
    pub fn initial_struct_mass(&self) -> f64 {
        self.initial_volume * self.tissue_density
    }

    /// Hexose still available after this step's recorded consumption (mol).
    ///
    /// Measured against the step-start mass: growth earlier in the step
    /// adds structure, not hexose.
    pub fn remaining_hexose(&self) -> f64 {
        self.c_hexose_root
            .mul_add(self.initial_struct_mass(), -self.hexose_consumption_by_growth)
            .max(0.0)
    }

    /// Amino acids still available after this step's recorded consumption (mol).
    pub fn remaining_amino_acids(&self) -> f64 {
        self.amino_acids
            .mul_add(self.initial_struct_mass(), -self.amino_acids_consumption_by_growth)
            .max(0.0)
    }

    /// Recompute volume and structural mass from radius and length.
    pub fn refresh_geometry(&mut self) {
        self.volume = volume_of(self.kind, self.radius, self.length);
        self.struct_mass = self.volume * self.tissue_density;
    }

    /// Take the step-start snapshot and zero the per-step ledgers.
    pub fn begin_step(&mut self) {
        self.initial_length = self.length;
        self.initial_radius = self.radius;
        self.initial_volume = self.volume;
        self.hexose_consumption_by_growth = 0.0;
        self.amino_acids_consumption_by_growth = 0.0;
        self.resp_growth = 0.0;
        self.struct_mass_produced = 0.0;
        self.hexose_possibly_required_for_elongation = 0.0;
        self.amino_acids_possibly_required_for_elongation = 0.0;
        self.struct_mass_contributing_to_elongation = 0.0;
        self.supply = None;
    }

    /// Restore the step-start geometry.
    pub fn rollback_geometry(&mut self) {
        self.length = self.initial_length;
        self.radius = self.initial_radius;
        self.refresh_geometry();
        self.struct_mass_produced = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn cylinder_and_sphere_volumes() {
        assert!(close(volume_of(OrganKind::Segment, 1.0, 2.0), 2.0 * PI));
        assert!(close(volume_of(OrganKind::Nodule, 1.0, 5.0), 4.0 / 3.0 * PI));
    }

    #[test]
    fn radius_inverts_volume() {
        let v = volume_of(OrganKind::Segment, 3e-4, 0.01);
        let r = radius_for_volume(OrganKind::Segment, v, 0.01);
        assert!(r.is_some_and(|r| close(r, 3e-4)));

        let v = volume_of(OrganKind::Nodule, 5e-4, 0.0);
        let r = radius_for_volume(OrganKind::Nodule, v, 0.0);
        assert!(r.is_some_and(|r| close(r, 5e-4)));

        assert!(radius_for_volume(OrganKind::Segment, v, 0.0).is_none());
        assert!(radius_for_volume(OrganKind::Segment, -1.0, 1.0).is_none());
    }

    #[test]
    fn new_element_respects_mass_invariant() {
        let e = RootElement::new(OrganKind::Segment, SegmentType::AfterEmergence, 2e-4, 0.01, 1e5);
        assert!(close(e.struct_mass, e.volume * 1e5));
        assert!(close(e.initial_volume, e.volume));
    }

    #[test]
    fn begin_step_clears_ledgers_and_snapshots() {
        let mut e = RootElement::new(OrganKind::Segment, SegmentType::AfterEmergence, 2e-4, 0.01, 1e5);
        e.hexose_consumption_by_growth = 3.0;
        e.resp_growth = 1.0;
        e.length = 0.02;
        e.refresh_geometry();
        e.begin_step();
        assert!(close(e.initial_length, 0.02));
        assert!(close(e.hexose_consumption_by_growth, 0.0));
        assert!(close(e.resp_growth, 0.0));
    }

    #[test]
    fn remaining_pool_never_negative() {
        let mut e = RootElement::new(OrganKind::Segment, SegmentType::AfterEmergence, 2e-4, 0.01, 1e5)
            .with_pools(1e-3, 1e-4);
        e.hexose_consumption_by_growth = e.hexose_amount() * 2.0;
        assert!(close(e.remaining_hexose(), 0.0));
        assert!(e.remaining_amino_acids() > 0.0);
    }

    #[test]
    fn remaining_pool_ignores_growth_within_step() {
        let mut e = RootElement::new(OrganKind::Segment, SegmentType::AfterEmergence, 2e-4, 0.01, 1e5)
            .with_pools(1e-3, 1e-4);
        e.begin_step();
        let start = e.hexose_amount();
        e.length = 0.02;
        e.refresh_geometry();
        assert!(e.hexose_amount() > start);
        assert!(close(e.remaining_hexose(), start));
        assert!(close(e.initial_struct_mass(), e.initial_volume * 1e5));
    }

    #[test]
    fn rollback_restores_snapshot() {
        let mut e = RootElement::new(OrganKind::Segment, SegmentType::AfterEmergence, 2e-4, 0.01, 1e5);
        e.begin_step();
        e.radius = 1e-4;
        e.length = 0.5;
        e.refresh_geometry();
        e.rollback_geometry();
        assert!(close(e.radius, 2e-4));
        assert!(close(e.length, 0.01));
        assert!(close(e.volume, e.initial_volume));
    }

    #[test]
    fn supply_window_totals_track_contributions() {
        let mut w = SupplyWindow::default();
        w.push(SupplyContribution { vertex: VertexId(1), hexose: 1.0, amino_acids: 0.5, struct_mass: 2.0 });
        w.push(SupplyContribution { vertex: VertexId(0), hexose: 0.5, amino_acids: 0.25, struct_mass: 1.0 });
        assert_eq!(w.vertices(), vec![VertexId(1), VertexId(0)]);
        assert!(close(w.total_hexose, 1.5));
        assert!(close(w.total_amino_acids, 0.75));
        assert!(close(w.total_struct_mass, 3.0));
    }
}
