//! Error types for the `rhizoflux-graph` crate.
//!
//! All fallible operations in this crate return [`GraphError`].

use rhizoflux_types::{EdgeType, VertexId};

use crate::fields::FieldOwner;

/// Errors that can occur during root graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// An element was not found in the graph.
    #[error("vertex not found: {0}")]
    VertexNotFound(VertexId),

    /// The graph already has a root element.
    #[error("graph already has a root element: {0}")]
    RootAlreadySet(VertexId),

    /// The parent already carries a same-axis successor.
    #[error("vertex {parent} already has a successor ({existing})")]
    DuplicateSuccessor {
        /// The parent element.
        parent: VertexId,
        /// Its existing successor.
        existing: VertexId,
    },

    /// No vertex identifiers are left.
    #[error("vertex identifier space exhausted")]
    IdOverflow,

    /// The named field is not a known element field.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A component tried to write a field it does not own.
    #[error("field {field} is owned by {owner:?}, not {writer:?}")]
    NotOwner {
        /// The field that was written.
        field: String,
        /// The declared owner of the field.
        owner: FieldOwner,
        /// The component attempting the write.
        writer: FieldOwner,
    },

    /// An edge of the given type does not exist.
    #[error("vertex {vertex} has no {edge:?} parent")]
    MissingParent {
        /// The child element.
        vertex: VertexId,
        /// The requested edge type.
        edge: EdgeType,
    },
}
