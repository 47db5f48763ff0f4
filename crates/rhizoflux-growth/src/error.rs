//! Error types for the `rhizoflux-growth` crate.

use rhizoflux_graph::GraphError;
use rhizoflux_types::VertexId;

/// Fatal errors raised by the growth phases.
///
/// Degenerate geometry and resource exhaustion are recovered locally and
/// never surface here.
#[derive(Debug, thiserror::Error)]
pub enum GrowthError {
    /// An update produced a NaN or infinite value.
    #[error("non-finite {quantity} on vertex {vertex}: {value}")]
    NonFinite {
        /// The element being updated.
        vertex: VertexId,
        /// Name of the offending quantity.
        quantity: &'static str,
        /// The value produced.
        value: f64,
    },

    /// The root graph rejected an access.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Fail with [`GrowthError::NonFinite`] unless `value` is finite.
pub(crate) fn ensure_finite(
    vertex: VertexId,
    quantity: &'static str,
    value: f64,
) -> Result<f64, GrowthError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GrowthError::NonFinite {
            vertex,
            quantity,
            value,
        })
    }
}
