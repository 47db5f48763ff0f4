//! Segment life-cycle state machine.
//!
//! One update per step, in three passes:
//!
//! 1. Settle: `JustStopped -> Stopped` and `JustDead -> Dead` for states
//!    entered during the previous step.
//! 2. Clocks: timestamps advance by `dt` according to the settled state;
//!    thermal time advances by `dt * max(0, T_soil - T_base)`.
//! 3. Transitions, in post-order so children and axis apices are resolved
//!    before the elements that depend on them:
//!    - `BeforeEmergence -> AfterEmergence` once the element lengthened;
//!    - optional apex stop and death rules;
//!    - non-apex elements copy a stopped status of their axis apex;
//!    - an element whose children are all dead becomes `JustDead`.
//!
//! `Support` and `Dead` never change.

use rhizoflux_graph::RootGraph;
use rhizoflux_types::{SegmentType, VertexId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GrowthParameters;
use crate::error::GrowthError;

/// Transitions made by one update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleReport {
    /// Elements that emerged.
    pub emerged: Vec<VertexId>,
    /// Elements that stopped growing.
    pub stopped: Vec<VertexId>,
    /// Elements that died.
    pub died: Vec<VertexId>,
}

/// Advance the life cycle of every element by one step of `dt` seconds.
///
/// # Errors
///
/// Returns [`GrowthError::Graph`] on a broken graph access.
pub fn update_lifecycle(
    graph: &mut RootGraph,
    dt: f64,
    soil_temperature: f64,
    params: &GrowthParameters,
) -> Result<LifecycleReport, GrowthError> {
    let thermal_dt = dt * (soil_temperature - params.base_temperature).max(0.0);

    for (_, e) in graph.elements_mut() {
        e.segment_type = match e.segment_type {
            SegmentType::JustStopped => SegmentType::Stopped,
            SegmentType::JustDead => SegmentType::Dead,
            other => other,
        };
        match e.segment_type {
            SegmentType::AfterEmergence => {
                e.time_since_emergence += dt;
                e.thermal_time_since_emergence += thermal_dt;
            }
            SegmentType::Stopped => {
                e.time_since_emergence += dt;
                e.thermal_time_since_emergence += thermal_dt;
                e.time_since_growth_stopped += dt;
            }
            SegmentType::Dead => e.time_since_death += dt,
            _ => {}
        }
    }

    let mut report = LifecycleReport::default();
    for id in graph.post_order() {
        let current = graph.element(id)?.segment_type;
        if !current.is_transitional() {
            continue;
        }
        let next = next_state(graph, id, current, params)?;
        if next == current {
            continue;
        }

        let dead_children_since = if next == SegmentType::JustDead {
            graph
                .children(id)
                .iter()
                .filter_map(|child| graph.get(*child))
                .map(|child| child.time_since_death)
                .reduce(f64::min)
                .unwrap_or(0.0)
        } else {
            0.0
        };

        let element = graph.element_mut(id)?;
        element.segment_type = next;
        match next {
            SegmentType::AfterEmergence => report.emerged.push(id),
            SegmentType::JustStopped | SegmentType::Stopped => report.stopped.push(id),
            SegmentType::JustDead => {
                element.time_since_death = dead_children_since;
                report.died.push(id);
            }
            _ => {}
        }
        debug!(vertex = %id, from = ?current, to = ?next, "segment type changed");
    }

    Ok(report)
}

/// State `id` moves to, given already-resolved children and axis apex.
fn next_state(
    graph: &RootGraph,
    id: VertexId,
    current: SegmentType,
    params: &GrowthParameters,
) -> Result<SegmentType, GrowthError> {
    let element = graph.element(id)?;
    let mut next = current;

    if next == SegmentType::BeforeEmergence && element.length > element.initial_length {
        next = SegmentType::AfterEmergence;
    }

    if graph.is_apex(id) {
        if next == SegmentType::AfterEmergence
            && params
                .apex_growth_duration
                .is_some_and(|d| element.thermal_time_since_emergence > d)
        {
            next = SegmentType::JustStopped;
        }
        if next == SegmentType::Stopped
            && params
                .apex_life_duration
                .is_some_and(|d| element.time_since_growth_stopped > d)
        {
            next = SegmentType::JustDead;
        }
    } else if next.can_elongate() {
        let apex = graph.axis_apex(id);
        if apex != id {
            let apex_type = graph.element(apex)?.segment_type;
            if apex_type.is_stopped() {
                next = apex_type;
            }
        }
    }

    let children = graph.children(id);
    if !children.is_empty()
        && children
            .iter()
            .all(|child| graph.get(*child).is_some_and(|c| c.segment_type.is_dead()))
    {
        next = SegmentType::JustDead;
    }

    Ok(next)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rhizoflux_graph::RootElement;
    use rhizoflux_types::{EdgeType, OrganKind};

    use super::*;

    const DT: f64 = 3600.0;

    fn segment(segment_type: SegmentType, length: f64) -> RootElement {
        RootElement::new(OrganKind::Segment, segment_type, 1e-4, length, 1e5)
    }

    /// base -< mid -< apex, mid -+ lateral.
    fn graph() -> (RootGraph, [VertexId; 4]) {
        let mut g = RootGraph::new();
        let Ok(base) = g.add_root(segment(SegmentType::Support, 0.0)) else {
            panic!("root insertion failed");
        };
        let Ok(mid) = g.add_child(base, EdgeType::Successor, segment(SegmentType::AfterEmergence, 0.01))
        else {
            panic!("mid insertion failed");
        };
        let Ok(apex) = g.add_child(mid, EdgeType::Successor, segment(SegmentType::AfterEmergence, 0.01))
        else {
            panic!("apex insertion failed");
        };
        let Ok(lateral) = g.add_child(mid, EdgeType::Branch, segment(SegmentType::BeforeEmergence, 0.0))
        else {
            panic!("lateral insertion failed");
        };
        (g, [base, mid, apex, lateral])
    }

    fn type_of(g: &RootGraph, id: VertexId) -> Option<SegmentType> {
        g.get(id).map(|e| e.segment_type)
    }

    fn update(g: &mut RootGraph, params: &GrowthParameters) -> LifecycleReport {
        update_lifecycle(g, DT, 20.0, params).unwrap()
    }

    #[test]
    fn primordium_emerges_after_lengthening() {
        let (mut g, [.., lateral]) = graph();
        for (_, e) in g.elements_mut() {
            e.begin_step();
        }
        if let Some(e) = g.get_mut(lateral) {
            e.length = 1e-4;
            e.refresh_geometry();
        }
        let report = update(&mut g, &GrowthParameters::default());
        assert_eq!(report.emerged, vec![lateral]);
        assert_eq!(type_of(&g, lateral), Some(SegmentType::AfterEmergence));
    }

    #[test]
    fn apex_stop_propagates_down_its_axis() {
        let (mut g, [base, mid, apex, lateral]) = graph();
        let params = GrowthParameters {
            apex_growth_duration: Some(DT * 20.0 * 1.5),
            ..GrowthParameters::default()
        };

        let first = update(&mut g, &params);
        assert!(first.stopped.is_empty());

        let second = update(&mut g, &params);
        assert_eq!(type_of(&g, apex), Some(SegmentType::JustStopped));
        assert_eq!(type_of(&g, mid), Some(SegmentType::JustStopped));
        assert_eq!(second.stopped, vec![apex, mid]);
        // A lateral is its own axis; the support never changes.
        assert_eq!(type_of(&g, lateral), Some(SegmentType::BeforeEmergence));
        assert_eq!(type_of(&g, base), Some(SegmentType::Support));

        let _ = update(&mut g, &params);
        assert_eq!(type_of(&g, apex), Some(SegmentType::Stopped));
        assert_eq!(type_of(&g, mid), Some(SegmentType::Stopped));
        assert!(g.get(apex).is_some_and(|e| e.time_since_growth_stopped > 0.0));
    }

    #[test]
    fn parent_dies_when_all_children_are_dead() {
        let (mut g, [base, mid, apex, lateral]) = graph();
        for (id, time) in [(apex, 7200.0), (lateral, 3600.0)] {
            if let Some(e) = g.get_mut(id) {
                e.segment_type = SegmentType::JustDead;
                e.time_since_death = time;
            }
        }
        let report = update(&mut g, &GrowthParameters::default());
        assert_eq!(report.died, vec![mid]);
        assert_eq!(type_of(&g, mid), Some(SegmentType::JustDead));
        assert_eq!(type_of(&g, apex), Some(SegmentType::Dead));
        // Settled children aged by one step before the parent took the minimum.
        assert!(g.get(mid).is_some_and(|e| (e.time_since_death - (3600.0 + DT)).abs() < 1e-9));
        // The base is a support and never dies.
        assert_eq!(type_of(&g, base), Some(SegmentType::Support));
    }

    #[test]
    fn one_living_child_keeps_parent_alive() {
        let (mut g, [_, mid, apex, _]) = graph();
        if let Some(e) = g.get_mut(apex) {
            e.segment_type = SegmentType::Dead;
        }
        let report = update(&mut g, &GrowthParameters::default());
        assert!(report.died.is_empty());
        assert_eq!(type_of(&g, mid), Some(SegmentType::AfterEmergence));
    }

    #[test]
    fn death_is_absorbing() {
        let (mut g, [_, mid, apex, _]) = graph();
        if let Some(e) = g.get_mut(mid) {
            e.segment_type = SegmentType::Dead;
        }
        // Living children do not revive a dead parent, and elongation does not either.
        for _ in 0..3 {
            if let Some(e) = g.get_mut(mid) {
                e.length += 0.001;
            }
            let _ = update(&mut g, &GrowthParameters::default());
            assert_eq!(type_of(&g, mid), Some(SegmentType::Dead));
        }
        assert!(g.get(mid).is_some_and(|e| (e.time_since_death - 3.0 * DT).abs() < 1e-9));
        assert_eq!(type_of(&g, apex), Some(SegmentType::AfterEmergence));
    }

    #[test]
    fn stopped_apex_dies_after_life_duration() {
        let (mut g, [_, mid, apex, _]) = graph();
        if let Some(e) = g.get_mut(apex) {
            e.segment_type = SegmentType::Stopped;
        }
        let params = GrowthParameters {
            apex_life_duration: Some(DT * 1.5),
            ..GrowthParameters::default()
        };
        let _ = update(&mut g, &params);
        assert_eq!(type_of(&g, apex), Some(SegmentType::Stopped));
        let report = update(&mut g, &params);
        assert_eq!(report.died, vec![apex]);
        assert_eq!(type_of(&g, apex), Some(SegmentType::JustDead));
        // The lateral primordium is still alive, so mid is too.
        assert_ne!(type_of(&g, mid), Some(SegmentType::JustDead));
    }

    #[test]
    fn thermal_time_uses_base_temperature() {
        let (mut g, [_, _, apex, _]) = graph();
        let params = GrowthParameters {
            base_temperature: 5.0,
            ..GrowthParameters::default()
        };
        assert!(update_lifecycle(&mut g, DT, 20.0, &params).is_ok());
        assert!(g.get(apex).is_some_and(|e| (e.thermal_time_since_emergence - DT * 15.0).abs() < 1e-6));
        assert!(update_lifecycle(&mut g, DT, 0.0, &params).is_ok());
        assert!(g.get(apex).is_some_and(|e| (e.thermal_time_since_emergence - DT * 15.0).abs() < 1e-6));
        assert!(g.get(apex).is_some_and(|e| (e.time_since_emergence - 2.0 * DT).abs() < 1e-9));
    }
}
