//! Resource supply scan for elongating apices.
//!
//! An apex elongates on resource drawn from a bounded window behind it: the
//! volume of a cylinder `growing_zone_factor` radii long at the apex radius.
//! The scan walks from the apex toward the base, taking the whole content of
//! each element that fits in what is left of the window and a volume-share
//! of the element that overflows it.
//!
//! ```text
//! window = growing_zone_factor * r * r^2 * pi
//! ```

use std::f64::consts::PI;

use rhizoflux_graph::{RootGraph, SupplyContribution, SupplyWindow};
use rhizoflux_types::{EdgeType, VertexId};
use tracing::{debug, error};

use crate::error::{GrowthError, ensure_finite};

/// Volume of the supply window of an apex of radius `radius`.
pub fn supply_volume(growing_zone_factor: f64, radius: f64) -> f64 {
    growing_zone_factor * radius * radius * radius * PI
}

/// Next element toward the base: the same-axis parent, else the mother root.
fn step_toward_base(graph: &RootGraph, id: VertexId) -> Option<VertexId> {
    graph
        .parent(id, EdgeType::Successor)
        .or_else(|| graph.parent(id, EdgeType::Branch))
}

/// Compute the supply window of `apex` without modifying the graph.
///
/// Zero-length supports are crossed without contributing. The walk ends when
/// the window is filled or the base is reached.
///
/// # Errors
///
/// Returns [`GrowthError::Graph`] if `apex` is unknown and
/// [`GrowthError::NonFinite`] if a contribution is not finite.
pub fn scan_supply(
    graph: &RootGraph,
    apex: VertexId,
    growing_zone_factor: f64,
) -> Result<SupplyWindow, GrowthError> {
    let tip = graph.element(apex)?;
    let mut remaining_volume = supply_volume(growing_zone_factor, tip.radius);
    let mut window = SupplyWindow::default();
    let mut current = apex;

    // Each vertex is visited at most once on the way to the base.
    for _ in 0..graph.len() {
        if remaining_volume <= 0.0 {
            break;
        }
        let element = graph.element(current)?;

        if remaining_volume > element.volume {
            if element.length > 0.0 {
                window.push(SupplyContribution {
                    vertex: current,
                    hexose: ensure_finite(current, "hexose contribution", element.hexose_amount())?,
                    amino_acids: ensure_finite(
                        current,
                        "amino acid contribution",
                        element.amino_acids_amount(),
                    )?,
                    struct_mass: element.struct_mass,
                });
                remaining_volume -= element.volume;
            }
            match step_toward_base(graph, current) {
                Some(next) => current = next,
                None => break,
            }
        } else {
            // remaining_volume > 0 here, so element.volume > 0.
            let share = remaining_volume / element.volume;
            window.push(SupplyContribution {
                vertex: current,
                hexose: ensure_finite(current, "hexose contribution", element.hexose_amount() * share)?,
                amino_acids: ensure_finite(
                    current,
                    "amino acid contribution",
                    element.amino_acids_amount() * share,
                )?,
                struct_mass: element.struct_mass * share,
            });
            break;
        }
    }

    Ok(window)
}

/// Scan the supply window of `apex` and annotate the apex with it.
///
/// Sets the apex's `*_possibly_required_for_elongation`,
/// `struct_mass_contributing_to_elongation` and `growing_zone_C_hexose_root`
/// summaries and stores the window for the allocator.
///
/// # Errors
///
/// Same as [`scan_supply`].
pub fn annotate_supply(
    graph: &mut RootGraph,
    apex: VertexId,
    growing_zone_factor: f64,
) -> Result<(), GrowthError> {
    let window = scan_supply(graph, apex, growing_zone_factor)?;
    let element = graph.element_mut(apex)?;

    element.hexose_possibly_required_for_elongation = window.total_hexose;
    element.amino_acids_possibly_required_for_elongation = window.total_amino_acids;
    element.struct_mass_contributing_to_elongation = window.total_struct_mass;
    element.growing_zone_c_hexose_root = if window.total_struct_mass > 0.0 {
        window.total_hexose / window.total_struct_mass
    } else {
        error!(
            vertex = %apex,
            segment_type = ?element.segment_type,
            struct_mass = element.struct_mass,
            "no structural mass contributes to elongation"
        );
        0.0
    };

    debug!(
        vertex = %apex,
        suppliers = window.contributions.len(),
        hexose = window.total_hexose,
        amino_acids = window.total_amino_acids,
        "supply window scanned"
    );
    element.supply = Some(window);
    Ok(())
}

/// Annotate every element whose potential length exceeds its initial length.
///
/// Returns the number of scanned elements.
///
/// # Errors
///
/// Same as [`scan_supply`].
pub fn annotate_all(graph: &mut RootGraph, growing_zone_factor: f64) -> Result<usize, GrowthError> {
    let candidates: Vec<VertexId> = graph
        .elements()
        .filter(|(_, e)| e.potential_length > e.initial_length && !e.segment_type.is_dead())
        .map(|(id, _)| *id)
        .collect();
    for id in &candidates {
        annotate_supply(graph, *id, growing_zone_factor)?;
    }
    Ok(candidates.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rhizoflux_graph::RootElement;
    use rhizoflux_types::{OrganKind, SegmentType};

    use super::*;

    const R: f64 = 1e-4;
    const DENSITY: f64 = 1e5;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1e-30)
    }

    fn segment(length: f64) -> RootElement {
        RootElement::new(OrganKind::Segment, SegmentType::AfterEmergence, R, length, DENSITY)
            .with_pools(1e-3, 2e-4)
    }

    fn window_length(factor: f64) -> f64 {
        // Window volume over a cylinder cross-section of radius R.
        supply_volume(factor, R) / (PI * R * R)
    }

    #[test]
    fn fractional_share_of_single_ancestor() {
        // The window reaches past the apex and covers a quarter of its parent.
        let factor = 16.0;
        let apex_length = window_length(factor) * 0.5;
        let parent_length = window_length(factor) * 2.0;

        let mut graph = RootGraph::new();
        let Ok(parent) = graph.add_root(segment(parent_length)) else {
            panic!("root insertion failed");
        };
        let Ok(apex) = graph.add_child(parent, EdgeType::Successor, segment(apex_length)) else {
            panic!("child insertion failed");
        };

        let Ok(window) = scan_supply(&graph, apex, factor) else {
            panic!("scan failed");
        };
        assert_eq!(window.vertices(), vec![apex, parent]);

        let parent_el = graph.get(parent).cloned().unwrap();
        let share = window.contributions.get(1).map(|c| c.hexose).unwrap();
        assert!(close(share, parent_el.hexose_amount() * 0.25));
        let aa_share = window.contributions.get(1).map(|c| c.amino_acids).unwrap();
        assert!(close(aa_share, parent_el.amino_acids_amount() * 0.25));
    }

    #[test]
    fn apex_larger_than_window_contributes_a_share() {
        let factor = 16.0;
        let mut graph = RootGraph::new();
        let Ok(apex) = graph.add_root(segment(window_length(factor) * 4.0)) else {
            panic!("root insertion failed");
        };
        let Ok(window) = scan_supply(&graph, apex, factor) else {
            panic!("scan failed");
        };
        assert_eq!(window.vertices(), vec![apex]);
        let total = graph.get(apex).map(RootElement::hexose_amount).unwrap();
        assert!(close(window.total_hexose, total / 4.0));
    }

    #[test]
    fn zero_length_supports_are_crossed() {
        let factor = 16.0;
        let mut graph = RootGraph::new();
        let Ok(base) = graph.add_root(segment(window_length(factor) * 10.0)) else {
            panic!("root insertion failed");
        };
        let support = RootElement::new(OrganKind::Segment, SegmentType::Support, R, 0.0, DENSITY);
        let Ok(support) = graph.add_child(base, EdgeType::Branch, support) else {
            panic!("support insertion failed");
        };
        let Ok(apex) = graph.add_child(support, EdgeType::Successor, segment(window_length(factor) * 0.5))
        else {
            panic!("apex insertion failed");
        };

        let Ok(window) = scan_supply(&graph, apex, factor) else {
            panic!("scan failed");
        };
        // The support has zero volume and is skipped; the walk follows the
        // branch edge into the mother root.
        assert_eq!(window.vertices(), vec![apex, base]);
    }

    #[test]
    fn walk_stops_at_base_when_window_not_filled() {
        let factor = 16.0;
        let mut graph = RootGraph::new();
        let Ok(base) = graph.add_root(segment(window_length(factor) * 0.1)) else {
            panic!("root insertion failed");
        };
        let Ok(apex) = graph.add_child(base, EdgeType::Successor, segment(window_length(factor) * 0.1))
        else {
            panic!("apex insertion failed");
        };
        let Ok(window) = scan_supply(&graph, apex, factor) else {
            panic!("scan failed");
        };
        assert_eq!(window.vertices(), vec![apex, base]);
        let expected: f64 = [apex, base]
            .iter()
            .filter_map(|id| graph.get(*id))
            .map(|e| e.struct_mass)
            .sum();
        assert!(close(window.total_struct_mass, expected));
    }

    #[test]
    fn empty_window_reports_zero_concentration() {
        let mut graph = RootGraph::new();
        let primordium =
            RootElement::new(OrganKind::Segment, SegmentType::BeforeEmergence, R, 0.0, DENSITY);
        let Ok(apex) = graph.add_root(primordium) else {
            panic!("root insertion failed");
        };
        assert!(annotate_supply(&mut graph, apex, 16.0).is_ok());
        let e = graph.get(apex);
        assert!(e.is_some_and(|e| e.growing_zone_c_hexose_root.abs() < f64::EPSILON));
        assert!(e.is_some_and(|e| e.supply.as_ref().is_some_and(SupplyWindow::is_empty)));
    }

    #[test]
    fn annotation_averages_window_concentration() {
        let factor = 16.0;
        let mut graph = RootGraph::new();
        let Ok(apex) = graph.add_root(segment(window_length(factor) * 2.0)) else {
            panic!("root insertion failed");
        };
        assert!(annotate_supply(&mut graph, apex, factor).is_ok());
        let c = graph.get(apex).map(|e| e.growing_zone_c_hexose_root).unwrap();
        assert!(close(c, 1e-3));
    }
}
