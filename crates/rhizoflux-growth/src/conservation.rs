//! Conservation check of attributed growth consumption.
//!
//! Every growth episode charges its hexose and amino acid consumption to
//! its suppliers. For each episode E and each resource R the check is:
//!
//! ```text
//! sum(attributed R in E) == consumed R in E     (relative tolerance)
//! ```
//!
//! The split is proportional by construction, so this only fails on
//! numerical trouble or a broken attribution. A violation produces a
//! [`ConservationAnomaly`].

use serde::{Deserialize, Serialize};

use rhizoflux_types::VertexId;

use crate::allocation::{GrowthEpisode, GrowthProcess};

/// Relative tolerance on the attributed totals.
pub const CONSERVATION_TOLERANCE: f64 = 1e-9;

/// Resource whose attribution did not balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// Hexose.
    Hexose,
    /// Amino acids.
    AminoAcids,
}

/// One unbalanced episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservationAnomaly {
    /// The growing element of the episode.
    pub vertex: VertexId,
    /// Elongation or thickening.
    pub process: GrowthProcess,
    /// The resource that did not balance.
    pub resource: Resource,
    /// Total consumed by the episode (mol).
    pub consumed: f64,
    /// Sum of the per-supplier attributions (mol).
    pub attributed: f64,
}

impl core::fmt::Display for ConservationAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:?} of vertex {}: {:?} consumed {} but attributed {}",
            self.process, self.vertex, self.resource, self.consumed, self.attributed
        )
    }
}

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq)]
pub enum ConservationResult {
    /// Every episode balances.
    Balanced,
    /// One or more episodes do not balance.
    Anomaly(Vec<ConservationAnomaly>),
}

fn balances(consumed: f64, attributed: f64) -> bool {
    (consumed - attributed).abs() <= CONSERVATION_TOLERANCE * consumed.abs().max(attributed.abs())
}

/// Verify that every episode's attributions sum to its consumption.
pub fn verify_conservation(episodes: &[GrowthEpisode]) -> ConservationResult {
    let mut anomalies = Vec::new();
    for episode in episodes {
        let hexose: f64 = episode.attributions.iter().map(|a| a.hexose).sum();
        let amino_acids: f64 = episode.attributions.iter().map(|a| a.amino_acids).sum();
        for (resource, consumed, attributed) in [
            (Resource::Hexose, episode.hexose_consumed, hexose),
            (Resource::AminoAcids, episode.amino_acids_consumed, amino_acids),
        ] {
            if !balances(consumed, attributed) {
                anomalies.push(ConservationAnomaly {
                    vertex: episode.vertex,
                    process: episode.process,
                    resource,
                    consumed,
                    attributed,
                });
            }
        }
    }

    if anomalies.is_empty() {
        ConservationResult::Balanced
    } else {
        ConservationResult::Anomaly(anomalies)
    }
}
