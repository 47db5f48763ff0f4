//! Simulation clock, step cycle, and orchestration for the Rhizoflux simulation.
//!
//! This crate owns the phase table that drives one time step and the loop
//! that runs a whole simulation.
//!
//! # Modules
//!
//! - [`clock`] -- Step counter and elapsed simulated time.
//! - [`config`] -- Configuration loading from `rhizoflux-config.yaml` into
//!   strongly-typed structs.
//! - [`pools`] -- Hexose and amino acid pool balance, coupled to the
//!   allocator ledgers.
//! - [`runner`] -- Bounded, cancellable run loop.
//! - [`scenario`] -- Named configuration overrides.
//! - [`step`] -- The step phase table and [`SimulationState`].
//!
//! [`SimulationState`]: step::SimulationState

pub mod clock;
pub mod config;
pub mod pools;
pub mod runner;
pub mod scenario;
pub mod step;
