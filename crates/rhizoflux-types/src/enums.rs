//! Enumeration types for the Rhizoflux simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Segment life-cycle
// ---------------------------------------------------------------------------

/// Life-cycle state of a root element.
///
/// ```text
/// BeforeEmergence -> AfterEmergence -> JustStopped -> Stopped
///                                   \-> JustDead -> Dead
/// ```
///
/// `Support` marks the zero-length placeholders that carry seminal and
/// adventitious roots. They never transition. `Dead` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    /// Zero-length support of a seminal or adventitious root.
    Support,
    /// Primordium that has not emerged from its parent yet.
    BeforeEmergence,
    /// Emerged, growing element.
    AfterEmergence,
    /// Growth stopped during the current step.
    JustStopped,
    /// Growth stopped during an earlier step.
    Stopped,
    /// Died during the current step.
    JustDead,
    /// Died during an earlier step.
    Dead,
}

impl SegmentType {
    /// Whether the element is dead or dying.
    pub const fn is_dead(self) -> bool {
        matches!(self, Self::JustDead | Self::Dead)
    }

    /// Whether growth of the element has stopped.
    pub const fn is_stopped(self) -> bool {
        matches!(self, Self::JustStopped | Self::Stopped)
    }

    /// Whether the type can still change through life-cycle propagation.
    pub const fn is_transitional(self) -> bool {
        !matches!(self, Self::Support | Self::Dead)
    }

    /// Whether an element of this type may elongate.
    pub const fn can_elongate(self) -> bool {
        matches!(self, Self::BeforeEmergence | Self::AfterEmergence)
    }
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// Kind of edge linking an element to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// Same-axis continuation (`<`).
    Successor,
    /// Lateral attachment of a new axis (`+`).
    Branch,
}

impl EdgeType {
    /// The conventional one-character symbol of this edge type.
    pub const fn symbol(self) -> char {
        match self {
            Self::Successor => '<',
            Self::Branch => '+',
        }
    }

    /// Parse an edge type from its one-character symbol.
    pub const fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '<' => Some(Self::Successor),
            '+' => Some(Self::Branch),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Organ kinds
// ---------------------------------------------------------------------------

/// Classifier separating ordinary root segments from nodules.
///
/// Segments are cylinders that elongate and thicken; nodules are spheres
/// that only thicken, drawing part of their resource from their parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganKind {
    /// Cylindrical root segment or apex.
    #[default]
    Segment,
    /// Spherical root nodule.
    Nodule,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_and_stopped_predicates() {
        assert!(SegmentType::Dead.is_dead());
        assert!(SegmentType::JustDead.is_dead());
        assert!(!SegmentType::Stopped.is_dead());
        assert!(SegmentType::JustStopped.is_stopped());
        assert!(!SegmentType::AfterEmergence.is_stopped());
    }

    #[test]
    fn support_and_dead_never_transition() {
        assert!(!SegmentType::Support.is_transitional());
        assert!(!SegmentType::Dead.is_transitional());
        assert!(SegmentType::JustDead.is_transitional());
    }

    #[test]
    fn edge_symbols_roundtrip() {
        for edge in [EdgeType::Successor, EdgeType::Branch] {
            assert_eq!(EdgeType::from_symbol(edge.symbol()), Some(edge));
        }
        assert_eq!(EdgeType::from_symbol('/'), None);
    }

    #[test]
    fn segment_type_serializes_snake_case() {
        let json = serde_json::to_string(&SegmentType::JustStopped).ok();
        assert_eq!(json.as_deref(), Some("\"just_stopped\""));
    }
}
