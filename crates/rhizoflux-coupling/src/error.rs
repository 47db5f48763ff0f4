//! Error types for the `rhizoflux-coupling` crate.

use rhizoflux_graph::GraphError;
use rhizoflux_types::VertexId;

/// Errors raised while linking coupled models or reading linked fields.
///
/// Every variant is fatal for the run: a coupling that cannot be resolved
/// would silently feed wrong inputs to the receiving component.
#[derive(Debug, thiserror::Error)]
pub enum CouplingError {
    /// The receiver declares no inputs under the requested category.
    #[error("model {model} declares no inputs in category {category}")]
    UnknownCategory {
        /// The receiving model.
        model: String,
        /// The requested category.
        category: String,
    },

    /// A receiver input has no entry in the translator table.
    #[error("no translation for input {0}")]
    MissingTranslation(String),

    /// The provider does not expose a field the binding needs.
    #[error("model {provider} does not provide field {field}")]
    NotProvided {
        /// The providing model.
        provider: String,
        /// The missing field.
        field: String,
    },

    /// An assembly constituent lacks a vertex present in the first constituent.
    #[error("field {field} has no value for vertex {vertex} while assembling {target}")]
    MissingKey {
        /// The aliased target name.
        target: String,
        /// The constituent field missing the key.
        field: String,
        /// The missing vertex.
        vertex: VertexId,
    },

    /// An assembly was built with no constituent fields.
    #[error("assembly for {0} has no constituent fields")]
    EmptyAssembly(String),

    /// A name was read that no link bound.
    #[error("input {0} is not bound")]
    Unbound(String),

    /// The translator table could not be read.
    #[error("failed to read translator table: {0}")]
    Io(#[from] std::io::Error),

    /// The translator table is not valid YAML.
    #[error("failed to parse translator table: {0}")]
    Yaml(#[from] serde_yml::Error),

    /// The underlying field store failed.
    #[error(transparent)]
    Graph(#[from] GraphError),
}
