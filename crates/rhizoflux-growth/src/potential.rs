//! Potential growth: what each element would reach without resource limits.
//!
//! Elongation follows the ArchiSimple rule `EL * 2r * dt`, or, when
//! `archi_simple` is off, the same rate divided by a hexose and amino acid
//! regulation term:
//!
//! ```text
//! EL * 2r / (((1 + Km) / C_hexose) * ((1 + Km) / AA)) * dt
//! ```
//!
//! Thickening is a relative rate on the radius; nodules use their own rate
//! and never exceed `nodule_max_radius`.

use rhizoflux_graph::{RootElement, RootGraph};
use rhizoflux_types::{OrganKind, VertexId};
use tracing::{debug, error};

use crate::config::GrowthParameters;
use crate::error::{GrowthError, ensure_finite};

/// Length reached by an apex after `dt` seconds of unlimited elongation.
///
/// Never shorter than `element.length`; a negative elongation is logged and
/// clamped.
pub fn elongated_length(element: &RootElement, params: &GrowthParameters, dt: f64) -> f64 {
    let rate = params.elongation_rate * 2.0 * element.radius;
    let elongation = if params.archi_simple {
        rate * dt
    } else if element.c_hexose_root > 0.0 && element.amino_acids > 0.0 {
        let regulation = ((1.0 + params.km_elongation) / element.c_hexose_root)
            * ((1.0 + params.km_elongation) / element.amino_acids);
        rate / regulation * dt
    } else {
        0.0
    };

    if elongation < 0.0 {
        error!(
            length = element.length,
            radius = element.radius,
            dt,
            "negative potential elongation"
        );
        return element.length;
    }
    element.length + elongation
}

/// Radius reached after `dt` seconds of unlimited thickening.
pub fn thickened_radius(element: &RootElement, params: &GrowthParameters, dt: f64) -> f64 {
    match element.kind {
        OrganKind::Segment => element.radius * params.relative_thickening_rate.mul_add(dt, 1.0),
        OrganKind::Nodule => {
            let grown = element.radius * params.nodule_thickening_rate.mul_add(dt, 1.0);
            grown.min(params.nodule_max_radius).max(element.radius)
        }
    }
}

/// Set `potential_length` and `potential_radius` on every element.
///
/// Dead elements and supports keep their current geometry as potential.
/// Only living apices (emerged or not) elongate; living segments with a
/// positive length and nodules thicken.
///
/// Returns the number of elements given a potential above their current
/// geometry.
///
/// # Errors
///
/// Returns [`GrowthError::NonFinite`] if a potential is not finite.
pub fn compute_potentials(
    graph: &mut RootGraph,
    params: &GrowthParameters,
    dt: f64,
) -> Result<usize, GrowthError> {
    let apices: Vec<VertexId> = graph
        .vertices()
        .into_iter()
        .filter(|id| graph.is_apex(*id))
        .collect();

    let mut growing = 0_usize;
    for (id, e) in graph.elements_mut() {
        e.potential_length = e.length;
        e.potential_radius = e.radius;
        if e.segment_type.is_dead() || e.is_support() {
            continue;
        }

        if e.segment_type.can_elongate() && apices.binary_search(id).is_ok() {
            e.potential_length = ensure_finite(*id, "potential_length", elongated_length(e, params, dt))?;
        }
        if e.kind == OrganKind::Nodule || e.length > 0.0 {
            e.potential_radius = ensure_finite(*id, "potential_radius", thickened_radius(e, params, dt))?;
        }
        if e.potential_length > e.length || e.potential_radius > e.radius {
            growing = growing.saturating_add(1);
        }
    }

    debug!(growing, "potential growth computed");
    Ok(growing)
}

#[cfg(test)]
mod tests {
    use rhizoflux_types::{EdgeType, SegmentType};

    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * a.abs().max(b.abs()).max(1.0)
    }

    fn apex() -> RootElement {
        RootElement::new(OrganKind::Segment, SegmentType::AfterEmergence, 2e-4, 0.01, 1e5)
            .with_pools(1e-3, 1e-4)
    }

    #[test]
    fn archi_simple_rule() {
        let p = GrowthParameters::default();
        let e = apex();
        let expected = p.elongation_rate * 2.0 * 2e-4 * 3600.0;
        assert!(close(elongated_length(&e, &p, 3600.0), 0.01 + expected));
    }

    #[test]
    fn regulated_rule_needs_hexose() {
        let p = GrowthParameters {
            archi_simple: false,
            ..GrowthParameters::default()
        };
        let e = apex();
        let regulation = ((1.0 + p.km_elongation) / 1e-3) * ((1.0 + p.km_elongation) / 1e-4);
        let expected = p.elongation_rate * 2.0 * 2e-4 / regulation * 3600.0;
        assert!(close(elongated_length(&e, &p, 3600.0), 0.01 + expected));

        let starved = apex().with_pools(0.0, 1e-4);
        assert!(close(elongated_length(&starved, &p, 3600.0), 0.01));
    }

    #[test]
    fn nodule_radius_is_capped() {
        let p = GrowthParameters {
            nodule_thickening_rate: 1.0,
            ..GrowthParameters::default()
        };
        let nodule = RootElement::new(OrganKind::Nodule, SegmentType::AfterEmergence, 4e-4, 0.0, 1e5);
        assert!(close(thickened_radius(&nodule, &p, 3600.0), p.nodule_max_radius));
    }

    #[test]
    fn only_living_apices_elongate() {
        let mut g = RootGraph::new();
        let Ok(base) = g.add_root(apex()) else {
            panic!("root insertion failed");
        };
        let Ok(tip) = g.add_child(base, EdgeType::Successor, apex()) else {
            panic!("tip insertion failed");
        };
        let mut dead = apex();
        dead.segment_type = SegmentType::Dead;
        let Ok(dead) = g.add_child(base, EdgeType::Branch, dead) else {
            panic!("branch insertion failed");
        };

        let p = GrowthParameters::default();
        assert!(compute_potentials(&mut g, &p, 3600.0).is_ok());

        assert!(g.get(tip).is_some_and(|e| e.potential_length > e.length));
        assert!(g.get(base).is_some_and(|e| close(e.potential_length, e.length)));
        assert!(g.get(base).is_some_and(|e| e.potential_radius > e.radius));
        assert!(g.get(dead).is_some_and(|e| close(e.potential_length, e.length)
            && close(e.potential_radius, e.radius)));
    }
}
