//! Step cycle: the phase table that drives one time step of the simulation.
//!
//! Each step advances the clock, then runs these phases in order:
//!
//! 1. **Step init** -- snapshot geometry and zero the per-step ledgers.
//! 2. **Potential growth** -- unlimited elongation and thickening targets
//!    (skipped when `run.compute_potentials` is off).
//! 3. **Supply scan** -- annotate every elongating element with its
//!    resource window.
//! 4. **Allocation** -- post-order actualization of growth under the run's
//!    [`GrowthPolicy`].
//! 5. **Conservation** -- check every growth episode balances; anomalies
//!    are logged and reported, not fatal.
//! 6. **Lifecycle** -- emergence, stop and death transitions.
//! 7. **Pool balance** -- subtract consumption from the pools through the
//!    coupled ledgers.
//!
//! The phase list is a static table; a [`SimulationState`] selects its
//! phases from it once, at construction. A step is deterministic given the
//! same initial state.

use rhizoflux_graph::{GraphError, RootGraph, create_starting_root};
use rhizoflux_growth::{
    AllocationReport, ConservationAnomaly, ConservationResult, GrowthError, GrowthParameters,
    GrowthPolicy, LifecycleReport, allocate_growth, annotate_all, compute_potentials, policy_for,
    update_lifecycle, verify_conservation,
};
use rhizoflux_types::RunId;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::clock::SimulationClock;
use crate::config::SimulationConfig;
use crate::pools::{PoolBalance, PoolError, PoolReport, allocator_interface};

/// Errors that can occur during step execution.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: crate::clock::ClockError,
    },

    /// A growth phase failed.
    #[error("growth error: {source}")]
    Growth {
        /// The underlying growth error.
        #[from]
        source: GrowthError,
    },

    /// The pool balance failed.
    #[error("pool balance error: {source}")]
    Pool {
        /// The underlying pool error.
        #[from]
        source: PoolError,
    },

    /// The root graph could not be built.
    #[error("graph error: {source}")]
    Graph {
        /// The underlying graph error.
        #[from]
        source: GraphError,
    },
}

/// Phases of a step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPhase {
    /// Snapshot geometry and reset ledgers.
    StepInit,
    /// Unlimited growth targets.
    PotentialGrowth,
    /// Resource windows of elongating elements.
    SupplyScan,
    /// Constrained growth.
    Allocation,
    /// Attribution balance check.
    Conservation,
    /// Segment life cycle.
    Lifecycle,
    /// Pool update from the growth ledgers.
    PoolBalance,
}

/// A phase body.
pub type PhaseFn = fn(&mut SimulationState, &mut StepRecord) -> Result<(), StepError>;

/// Every phase, in execution order.
pub const PHASES: &[(StepPhase, PhaseFn)] = &[
    (StepPhase::StepInit, phase_step_init),
    (StepPhase::PotentialGrowth, phase_potential_growth),
    (StepPhase::SupplyScan, phase_supply_scan),
    (StepPhase::Allocation, phase_allocation),
    (StepPhase::Conservation, phase_conservation),
    (StepPhase::Lifecycle, phase_lifecycle),
    (StepPhase::PoolBalance, phase_pool_balance),
];

/// Reports collected by the phases of one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepRecord {
    /// Elements given a potential above their geometry.
    pub potentials: usize,
    /// Elements whose supply window was scanned.
    pub scanned: usize,
    /// Outcome of the allocation pass.
    pub allocation: AllocationReport,
    /// Unbalanced growth episodes.
    pub anomalies: Vec<ConservationAnomaly>,
    /// Life-cycle transitions.
    pub lifecycle: LifecycleReport,
    /// Outcome of the pool balance.
    pub pools: PoolReport,
}

/// Summary of one completed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSummary {
    /// The run this step belongs to.
    pub run_id: RunId,
    /// The step number that was executed.
    pub step: u64,
    /// Simulated seconds elapsed at the end of the step.
    pub elapsed_seconds: f64,
    /// Number of elements in the graph.
    pub elements: usize,
    /// Elements that grew.
    pub growing: usize,
    /// Elements whose growth was deferred for lack of resource.
    pub deferred: usize,
    /// Elements whose degenerate growth was rolled back.
    pub rolled_back: usize,
    /// Elements that emerged.
    pub emerged: usize,
    /// Elements that stopped growing.
    pub stopped: usize,
    /// Elements that died.
    pub died: usize,
    /// Total root length (m).
    pub total_length: f64,
    /// Total structural mass (g).
    pub total_struct_mass: f64,
    /// Hexose consumed by growth (mol).
    pub hexose_consumed: f64,
    /// Amino acids consumed by growth (mol).
    pub amino_acids_consumed: f64,
    /// Growth respiration (mol C).
    pub growth_respiration: f64,
    /// Hexose missing after the pool balance (mol).
    pub hexose_deficit: f64,
    /// Amino acids missing after the pool balance (mol).
    pub amino_acids_deficit: f64,
    /// Unbalanced growth episodes.
    pub anomalies: Vec<ConservationAnomaly>,
}

/// All mutable state of a run.
#[derive(Debug)]
pub struct SimulationState {
    /// Identifier of the run, carried by every summary.
    pub run_id: RunId,
    /// The root system.
    pub graph: RootGraph,
    /// Step counter and elapsed time.
    pub clock: SimulationClock,
    /// Growth parameters of the run.
    pub growth: GrowthParameters,
    /// Soil temperature (degrees Celsius).
    pub soil_temperature: f64,
    policy: Box<dyn GrowthPolicy>,
    pools: PoolBalance,
    phases: Vec<(StepPhase, PhaseFn)>,
}

impl SimulationState {
    /// Build the state of a new run from the configured starting root.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Graph`] if the seed cannot be built, and the
    /// errors of [`SimulationState::from_graph`].
    pub fn new(config: &SimulationConfig) -> Result<Self, StepError> {
        let (graph, ids) = create_starting_root(&config.starting_root)?;
        debug!(base = %ids.base, apex = %ids.apex, laterals = ids.laterals.len(), "Starting root created");
        Self::from_graph(graph, config)
    }

    /// Build the state of a new run around an existing root graph.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::Clock`] on an invalid time step, and
    /// [`StepError::Pool`] if the pool balance cannot be linked.
    pub fn from_graph(graph: RootGraph, config: &SimulationConfig) -> Result<Self, StepError> {
        let clock = SimulationClock::new(&config.run)?;
        let pools = PoolBalance::link(&allocator_interface(), &config.coupling)?;
        let policy = policy_for(config.growth.policy);
        let phases: Vec<(StepPhase, PhaseFn)> = PHASES
            .iter()
            .filter(|(phase, _)| config.run.compute_potentials || *phase != StepPhase::PotentialGrowth)
            .copied()
            .collect();

        let state = Self {
            run_id: RunId::new(),
            graph,
            clock,
            growth: config.growth.clone(),
            soil_temperature: config.environment.soil_temperature,
            policy,
            pools,
            phases,
        };
        info!(
            run = %state.run_id,
            elements = state.graph.len(),
            policy = state.policy.name(),
            phases = state.phases.len(),
            "Simulation state assembled"
        );
        Ok(state)
    }

    /// The phases this run executes, in order.
    pub fn phases(&self) -> Vec<StepPhase> {
        self.phases.iter().map(|(phase, _)| *phase).collect()
    }

    /// The growth policy of this run.
    pub fn policy(&self) -> &dyn GrowthPolicy {
        self.policy.as_ref()
    }
}

/// Execute one step: advance the clock and run every selected phase.
///
/// # Errors
///
/// Returns [`StepError`] if a phase fails unrecoverably; the graph is then
/// left as the failing phase found it.
pub fn run_step(state: &mut SimulationState) -> Result<StepSummary, StepError> {
    let step = state.clock.advance()?;
    info!(run = %state.run_id, step, elapsed = state.clock.elapsed(), "Step started");

    let mut record = StepRecord::default();
    let phases = state.phases.clone();
    for (phase, run) in phases {
        debug!(step, ?phase, "Phase started");
        run(state, &mut record)?;
    }

    let summary = summarize(state, step, record);
    info!(
        step,
        growing = summary.growing,
        deferred = summary.deferred,
        rolled_back = summary.rolled_back,
        total_length = summary.total_length,
        total_struct_mass = summary.total_struct_mass,
        hexose_consumed = summary.hexose_consumed,
        anomalies = summary.anomalies.len(),
        "Step completed"
    );
    Ok(summary)
}

fn summarize(state: &SimulationState, step: u64, record: StepRecord) -> StepSummary {
    let mut summary = StepSummary {
        run_id: state.run_id,
        step,
        elapsed_seconds: state.clock.elapsed(),
        elements: state.graph.len(),
        growing: record.allocation.growing_count(),
        deferred: record.allocation.deferred.len(),
        rolled_back: record.allocation.rolled_back.len(),
        emerged: record.lifecycle.emerged.len(),
        stopped: record.lifecycle.stopped.len(),
        died: record.lifecycle.died.len(),
        total_length: 0.0,
        total_struct_mass: 0.0,
        hexose_consumed: 0.0,
        amino_acids_consumed: 0.0,
        growth_respiration: 0.0,
        hexose_deficit: record.pools.total_hexose_deficit,
        amino_acids_deficit: record.pools.total_amino_acids_deficit,
        anomalies: record.anomalies,
    };
    for (_, e) in state.graph.elements() {
        summary.total_length += e.length;
        summary.total_struct_mass += e.struct_mass;
        summary.hexose_consumed += e.hexose_consumption_by_growth;
        summary.amino_acids_consumed += e.amino_acids_consumption_by_growth;
        summary.growth_respiration += e.resp_growth;
    }
    summary
}

/// Phase 1: snapshot geometry and zero the ledgers.
#[allow(clippy::unnecessary_wraps)]
fn phase_step_init(state: &mut SimulationState, _record: &mut StepRecord) -> Result<(), StepError> {
    for (_, e) in state.graph.elements_mut() {
        e.begin_step();
    }
    Ok(())
}

/// Phase 2: potential growth.
fn phase_potential_growth(state: &mut SimulationState, record: &mut StepRecord) -> Result<(), StepError> {
    record.potentials = compute_potentials(&mut state.graph, &state.growth, state.clock.time_step())?;
    Ok(())
}

/// Phase 3: supply windows.
fn phase_supply_scan(state: &mut SimulationState, record: &mut StepRecord) -> Result<(), StepError> {
    record.scanned = annotate_all(&mut state.graph, state.growth.growing_zone_factor)?;
    Ok(())
}

/// Phase 4: constrained growth.
fn phase_allocation(state: &mut SimulationState, record: &mut StepRecord) -> Result<(), StepError> {
    record.allocation = allocate_growth(&mut state.graph, &state.growth, state.policy.as_ref())?;
    Ok(())
}

/// Phase 5: conservation check.
#[allow(clippy::unnecessary_wraps)]
fn phase_conservation(state: &mut SimulationState, record: &mut StepRecord) -> Result<(), StepError> {
    if let ConservationResult::Anomaly(anomalies) = verify_conservation(&record.allocation.episodes) {
        for anomaly in &anomalies {
            error!(step = state.clock.step(), %anomaly, "Conservation anomaly");
        }
        record.anomalies = anomalies;
    }
    Ok(())
}

/// Phase 6: life cycle.
fn phase_lifecycle(state: &mut SimulationState, record: &mut StepRecord) -> Result<(), StepError> {
    record.lifecycle = update_lifecycle(
        &mut state.graph,
        state.clock.time_step(),
        state.soil_temperature,
        &state.growth,
    )?;
    Ok(())
}

/// Phase 7: pool balance.
fn phase_pool_balance(state: &mut SimulationState, record: &mut StepRecord) -> Result<(), StepError> {
    record.pools = state.pools.apply(&mut state.graph)?;
    Ok(())
}
