//! Inter-model property coupling for the Rhizoflux simulation.
//!
//! Components developed with their own state-variable names exchange data
//! through named fields over the shared root graph. A receiver declares its
//! inputs by category; [`link`] binds them to provider fields either by
//! identical name or through a [`TranslatorTable`] whose entries become
//! read-time [`Assembly`] sums.
//!
//! # Modules
//!
//! - [`assembly`] -- Key-wise converted sums of provider fields.
//! - [`binding`] -- [`Binding`], [`Bindings`] and the [`FieldSource`] seam.
//! - [`error`] -- Error types for linking and reading.
//! - [`translator`] -- [`CoupledModel`], [`ModelInterface`], translator
//!   tables, and [`link`].

pub mod assembly;
pub mod binding;
pub mod error;
pub mod translator;

pub use assembly::{Assembly, sum_converted};
pub use binding::{Binding, Bindings, FieldSource};
pub use error::CouplingError;
pub use translator::{CoupledModel, ModelInterface, TranslatorTable, link};
