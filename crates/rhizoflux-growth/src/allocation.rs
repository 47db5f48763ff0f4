//! Constrained growth allocation.
//!
//! Converts potential elongation and thickening into actual growth under
//! hexose and amino acid limitation. Elements are visited in strict
//! post-order from the base, so a nodule or lateral always draws on its
//! parent's pool before the parent's own thickening does.
//!
//! Each growth episode charges its consumption back to the elements that
//! supplied it, in proportion to what each made available:
//!
//! ```text
//! supplier_share = total_consumption * supplier_contribution / total_available
//! ```
//!
//! | Process | Resource available | Respiration charged to |
//! |---------|--------------------|------------------------|
//! | Elongation | supply window totals | growing element |
//! | Segment thickening | own remaining pool | growing element |
//! | Nodule thickening | own + parent remaining pool | nodule and parent, pro rata |

use std::f64::consts::PI;

use rhizoflux_graph::{RootGraph, SupplyWindow, radius_for_volume, volume_of};
use rhizoflux_types::{OrganKind, VertexId};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::GrowthParameters;
use crate::error::{GrowthError, ensure_finite};
use crate::policy::{GrowthPolicy, LimitingFactor};
use crate::supply::scan_supply;

/// Kind of structural growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrowthProcess {
    /// Length increase of an apex or primordium.
    Elongation,
    /// Radius increase of a segment or nodule.
    Thickening,
}

/// Consumption charged to one supplying element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// The supplying element.
    pub vertex: VertexId,
    /// Hexose charged (mol).
    pub hexose: f64,
    /// Amino acids charged (mol).
    pub amino_acids: f64,
}

/// One actualized growth event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthEpisode {
    /// The growing element.
    pub vertex: VertexId,
    /// Elongation or thickening.
    pub process: GrowthProcess,
    /// Volume increase asked for by the potential (m3).
    pub potential_volume: f64,
    /// Volume increase granted (m3).
    pub volume_increase: f64,
    /// The binding constraint.
    pub limiting: LimitingFactor,
    /// Hexose consumed in total (mol).
    pub hexose_consumed: f64,
    /// Amino acids consumed in total (mol).
    pub amino_acids_consumed: f64,
    /// Growth respiration released (mol C).
    pub respiration: f64,
    /// Per-supplier split of the consumption.
    pub attributions: Vec<Attribution>,
}

/// Outcome of one allocation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationReport {
    /// Every visited vertex, in visit order.
    pub visit_order: Vec<VertexId>,
    /// Actualized growth events.
    pub episodes: Vec<GrowthEpisode>,
    /// Elements whose growth was deferred for lack of resource.
    pub deferred: Vec<VertexId>,
    /// Elements whose degenerate growth was rolled back.
    pub rolled_back: Vec<VertexId>,
}

impl AllocationReport {
    /// Number of distinct elements that grew.
    pub fn growing_count(&self) -> usize {
        let mut grown: Vec<VertexId> = self.episodes.iter().map(|e| e.vertex).collect();
        grown.dedup();
        grown.len()
    }
}

/// Internal result of one growth attempt.
enum Attempt {
    /// Nothing to do.
    Idle,
    /// Growth happened.
    Grew(GrowthEpisode),
    /// Resource exhausted; growth waits for a later step.
    Deferred,
    /// Degenerate outcome; the visit is rolled back to the snapshot.
    Degenerate,
}

/// A resource supplier of a thickening episode.
struct Supplier {
    vertex: VertexId,
    hexose: f64,
    amino_acids: f64,
}

/// Actualize potential growth over the whole graph.
///
/// Dead elements, zero-length supports, and elements without positive
/// demand are visited but left untouched.
///
/// # Errors
///
/// Returns [`GrowthError::NonFinite`] if an update produces a non-finite
/// value, and [`GrowthError::Graph`] on a broken graph access.
pub fn allocate_growth(
    graph: &mut RootGraph,
    params: &GrowthParameters,
    policy: &dyn GrowthPolicy,
) -> Result<AllocationReport, GrowthError> {
    let mut report = AllocationReport::default();

    for id in graph.post_order() {
        report.visit_order.push(id);
        let element = graph.element(id)?;
        if element.segment_type.is_dead() || element.is_support() {
            continue;
        }

        let elongation = elongate(graph, id, params, policy)?;
        if matches!(elongation, Attempt::Degenerate) {
            report.rolled_back.push(id);
            continue;
        }
        let thickening = thicken(graph, id, params, policy)?;
        if matches!(thickening, Attempt::Degenerate) {
            if let Attempt::Grew(episode) = &elongation {
                reverse(graph, episode)?;
            }
            graph.element_mut(id)?.rollback_geometry();
            report.rolled_back.push(id);
            continue;
        }

        for attempt in [elongation, thickening] {
            match attempt {
                Attempt::Idle | Attempt::Degenerate => {}
                Attempt::Grew(episode) => report.episodes.push(episode),
                Attempt::Deferred => {
                    if report.deferred.last() != Some(&id) {
                        report.deferred.push(id);
                    }
                }
            }
        }
    }

    debug!(
        visited = report.visit_order.len(),
        episodes = report.episodes.len(),
        deferred = report.deferred.len(),
        rolled_back = report.rolled_back.len(),
        policy = policy.name(),
        "allocation pass complete"
    );
    Ok(report)
}

/// Share of `total` owed by a contributor of `part` out of `available`.
fn pro_rata(total: f64, part: f64, available: f64) -> f64 {
    if available > 0.0 {
        total * part / available
    } else {
        0.0
    }
}

fn elongate(
    graph: &mut RootGraph,
    id: VertexId,
    params: &GrowthParameters,
    policy: &dyn GrowthPolicy,
) -> Result<Attempt, GrowthError> {
    let element = graph.element(id)?;
    if element.kind != OrganKind::Segment {
        return Ok(Attempt::Idle);
    }
    let potential_length = ensure_finite(id, "potential_length", element.potential_length)?;
    let initial_length = element.initial_length;
    if potential_length <= initial_length {
        if potential_length < initial_length {
            error!(vertex = %id, potential_length, initial_length, "negative elongation demand");
        }
        return Ok(Attempt::Idle);
    }

    let radius = element.radius;
    let density = element.tissue_density;
    let section = PI * radius * radius;
    let demand = section * (potential_length - initial_length);
    if demand <= 0.0 {
        error!(vertex = %id, demand, radius, "degenerate elongation demand");
        graph.element_mut(id)?.rollback_geometry();
        return Ok(Attempt::Degenerate);
    }

    let window: SupplyWindow = match &element.supply {
        Some(window) => window.clone(),
        None => scan_supply(graph, id, params.growing_zone_factor)?,
    };

    let limit = policy.permitted_volume(
        demand,
        window.total_hexose,
        window.total_amino_acids,
        density,
        params,
    );
    if limit.volume <= 0.0 {
        debug!(vertex = %id, limiting = ?limit.limiting, "elongation deferred: no resource in supply window");
        return Ok(Attempt::Deferred);
    }

    let new_length = ensure_finite(id, "length", initial_length + limit.volume / section)?;
    if new_length < initial_length {
        error!(vertex = %id, new_length, initial_length, "elongation would shorten element");
        graph.element_mut(id)?.rollback_geometry();
        return Ok(Attempt::Degenerate);
    }
    let hexose = ensure_finite(id, "hexose consumption", policy.hexose_cost(limit.volume, density, params))?;
    let amino_acids = ensure_finite(
        id,
        "amino acid consumption",
        policy.amino_acids_cost(limit.volume, density, params),
    )?;
    let respiration = params.growth_respiration(hexose);

    let attributions: Vec<Attribution> = window
        .contributions
        .iter()
        .map(|c| Attribution {
            vertex: c.vertex,
            hexose: pro_rata(hexose, c.hexose, window.total_hexose),
            amino_acids: pro_rata(amino_acids, c.amino_acids, window.total_amino_acids),
        })
        .collect();

    let grown = graph.element_mut(id)?;
    let mass_before = grown.struct_mass;
    grown.length = new_length;
    grown.refresh_geometry();
    grown.struct_mass_produced += grown.struct_mass - mass_before;
    grown.resp_growth += respiration;
    charge(graph, &attributions)?;

    debug!(
        vertex = %id,
        volume = limit.volume,
        limiting = ?limit.limiting,
        hexose,
        amino_acids,
        "element elongated"
    );
    Ok(Attempt::Grew(GrowthEpisode {
        vertex: id,
        process: GrowthProcess::Elongation,
        potential_volume: demand,
        volume_increase: limit.volume,
        limiting: limit.limiting,
        hexose_consumed: hexose,
        amino_acids_consumed: amino_acids,
        respiration,
        attributions,
    }))
}

fn thicken(
    graph: &mut RootGraph,
    id: VertexId,
    params: &GrowthParameters,
    policy: &dyn GrowthPolicy,
) -> Result<Attempt, GrowthError> {
    let element = graph.element(id)?;
    let potential_radius = ensure_finite(id, "potential_radius", element.potential_radius)?;
    let initial_radius = element.initial_radius;
    if potential_radius <= element.radius {
        if potential_radius < initial_radius {
            error!(vertex = %id, potential_radius, initial_radius, "negative thickening demand");
        }
        return Ok(Attempt::Idle);
    }

    let kind = element.kind;
    let length = element.length;
    let density = element.tissue_density;
    let volume_before = element.volume;
    let demand = volume_of(kind, potential_radius, length) - volume_before;
    if demand <= 0.0 {
        // A segment of zero length has no lateral surface to thicken.
        return Ok(Attempt::Idle);
    }

    let mut suppliers = vec![Supplier {
        vertex: id,
        hexose: element.remaining_hexose(),
        amino_acids: element.remaining_amino_acids(),
    }];
    if kind == OrganKind::Nodule
        && let Some((parent, _)) = graph.parent_edge(id)
    {
        let carrier = graph.element(parent)?;
        if !carrier.segment_type.is_dead() {
            suppliers.push(Supplier {
                vertex: parent,
                hexose: carrier.remaining_hexose(),
                amino_acids: carrier.remaining_amino_acids(),
            });
        }
    }
    let available_hexose: f64 = suppliers.iter().map(|s| s.hexose).sum();
    let available_amino_acids: f64 = suppliers.iter().map(|s| s.amino_acids).sum();

    let limit = policy.permitted_volume(demand, available_hexose, available_amino_acids, density, params);
    if limit.volume <= 0.0 {
        debug!(vertex = %id, limiting = ?limit.limiting, "thickening deferred: pool exhausted");
        return Ok(Attempt::Deferred);
    }

    let new_volume = ensure_finite(id, "volume", volume_before + limit.volume)?;
    let Some(new_radius) = radius_for_volume(kind, new_volume, length) else {
        error!(vertex = %id, new_volume, length, "no radius matches thickened volume");
        return Ok(Attempt::Degenerate);
    };
    let new_radius = ensure_finite(id, "radius", new_radius)?;
    if new_radius < initial_radius {
        error!(vertex = %id, new_radius, initial_radius, "thickening would shrink element");
        return Ok(Attempt::Degenerate);
    }

    let hexose = ensure_finite(id, "hexose consumption", policy.hexose_cost(limit.volume, density, params))?;
    let amino_acids = ensure_finite(
        id,
        "amino acid consumption",
        policy.amino_acids_cost(limit.volume, density, params),
    )?;
    let respiration = params.growth_respiration(hexose);

    let attributions: Vec<Attribution> = suppliers
        .iter()
        .map(|s| Attribution {
            vertex: s.vertex,
            hexose: pro_rata(hexose, s.hexose, available_hexose),
            amino_acids: pro_rata(amino_acids, s.amino_acids, available_amino_acids),
        })
        .collect();

    let grown = graph.element_mut(id)?;
    let mass_before = grown.struct_mass;
    grown.radius = new_radius;
    grown.refresh_geometry();
    grown.struct_mass_produced += grown.struct_mass - mass_before;
    charge(graph, &attributions)?;

    // Respiration follows the hexose: all of it for a segment, pro rata
    // between nodule and carrier for a nodule.
    for a in &attributions {
        graph.element_mut(a.vertex)?.resp_growth += params.growth_respiration(a.hexose);
    }

    debug!(
        vertex = %id,
        kind = ?kind,
        volume = limit.volume,
        limiting = ?limit.limiting,
        hexose,
        amino_acids,
        "element thickened"
    );
    Ok(Attempt::Grew(GrowthEpisode {
        vertex: id,
        process: GrowthProcess::Thickening,
        potential_volume: demand,
        volume_increase: limit.volume,
        limiting: limit.limiting,
        hexose_consumed: hexose,
        amino_acids_consumed: amino_acids,
        respiration,
        attributions,
    }))
}

/// Add each attribution to its supplier's consumption ledgers.
fn charge(graph: &mut RootGraph, attributions: &[Attribution]) -> Result<(), GrowthError> {
    for a in attributions {
        let supplier = graph.element_mut(a.vertex)?;
        supplier.hexose_consumption_by_growth += a.hexose;
        supplier.amino_acids_consumption_by_growth += a.amino_acids;
    }
    Ok(())
}

/// Undo the ledger and respiration charges of an episode.
fn reverse(graph: &mut RootGraph, episode: &GrowthEpisode) -> Result<(), GrowthError> {
    for a in &episode.attributions {
        let supplier = graph.element_mut(a.vertex)?;
        supplier.hexose_consumption_by_growth = (supplier.hexose_consumption_by_growth - a.hexose).max(0.0);
        supplier.amino_acids_consumption_by_growth =
            (supplier.amino_acids_consumption_by_growth - a.amino_acids).max(0.0);
    }
    let grown = graph.element_mut(episode.vertex)?;
    grown.resp_growth = (grown.resp_growth - episode.respiration).max(0.0);
    debug!(vertex = %episode.vertex, process = ?episode.process, "growth episode reversed");
    Ok(())
}
