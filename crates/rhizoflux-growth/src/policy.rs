//! Growth policies: how available resource limits a volume increase.
//!
//! The default behaviour of [`GrowthPolicy`] is the most-limiting-factor
//! rule. With `rho` the tissue density:
//!
//! ```text
//! volume_max_C = hexose * 6 * yield_growth / (struct_mass_C_content * rho)
//! volume_max_N = amino_acids * r_Nm_AA    / (struct_mass_N_content * rho)
//! permitted    = min(potential, volume_max_C, volume_max_N)
//! ```
//!
//! Implementations override individual hooks; [`CarbonOnlyPolicy`] removes
//! nitrogen from both the limit and the cost.

use serde::{Deserialize, Serialize};

use crate::config::{GrowthParameters, PolicyKind};

/// The factor that bounded a volume increase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitingFactor {
    /// The potential growth itself.
    Potential,
    /// Available hexose.
    Carbon,
    /// Available amino acids.
    Nitrogen,
}

/// Permitted volume increase and what bounded it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeLimit {
    /// Permitted volume increase (m3).
    pub volume: f64,
    /// The binding constraint.
    pub limiting: LimitingFactor,
}

/// Resource limitation and cost of structural growth.
pub trait GrowthPolicy: core::fmt::Debug + Send + Sync {
    /// Short policy name for logs.
    fn name(&self) -> &'static str;

    /// Largest volume `hexose` mol can build.
    fn volume_max_carbon(&self, hexose: f64, tissue_density: f64, p: &GrowthParameters) -> f64 {
        hexose * 6.0 * p.yield_growth / (p.struct_mass_c_content * tissue_density)
    }

    /// Largest volume `amino_acids` mol can build.
    fn volume_max_nitrogen(
        &self,
        amino_acids: f64,
        tissue_density: f64,
        p: &GrowthParameters,
    ) -> f64 {
        amino_acids * p.r_nm_aa / (p.struct_mass_n_content * tissue_density)
    }

    /// Hexose (mol) used to build `volume`, respiration included.
    fn hexose_cost(&self, volume: f64, tissue_density: f64, p: &GrowthParameters) -> f64 {
        volume * tissue_density * p.struct_mass_c_content / (6.0 * p.yield_growth)
    }

    /// Amino acids (mol) used to build `volume`.
    fn amino_acids_cost(&self, volume: f64, tissue_density: f64, p: &GrowthParameters) -> f64 {
        volume * tissue_density * p.struct_mass_n_content / p.r_nm_aa
    }

    /// Most-limiting-factor volume increase.
    fn permitted_volume(
        &self,
        potential: f64,
        hexose: f64,
        amino_acids: f64,
        tissue_density: f64,
        p: &GrowthParameters,
    ) -> VolumeLimit {
        let max_c = self.volume_max_carbon(hexose, tissue_density, p);
        let max_n = self.volume_max_nitrogen(amino_acids, tissue_density, p);
        let mut limit = VolumeLimit {
            volume: potential,
            limiting: LimitingFactor::Potential,
        };
        if max_c < limit.volume {
            limit = VolumeLimit {
                volume: max_c,
                limiting: LimitingFactor::Carbon,
            };
        }
        if max_n < limit.volume {
            limit = VolumeLimit {
                volume: max_n,
                limiting: LimitingFactor::Nitrogen,
            };
        }
        limit
    }
}

/// Hexose and amino acids both limit growth.
#[derive(Debug, Clone, Copy, Default)]
pub struct DualLimitedPolicy;

impl GrowthPolicy for DualLimitedPolicy {
    fn name(&self) -> &'static str {
        "dual_limited"
    }
}

/// Only hexose limits growth; amino acids are neither limiting nor consumed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarbonOnlyPolicy;

impl GrowthPolicy for CarbonOnlyPolicy {
    fn name(&self) -> &'static str {
        "carbon_only"
    }

    fn volume_max_nitrogen(&self, _: f64, _: f64, _: &GrowthParameters) -> f64 {
        f64::INFINITY
    }

    fn amino_acids_cost(&self, _: f64, _: f64, _: &GrowthParameters) -> f64 {
        0.0
    }
}

/// Instantiate the policy selected in configuration.
pub fn policy_for(kind: PolicyKind) -> Box<dyn GrowthPolicy> {
    match kind {
        PolicyKind::DualLimited => Box::new(DualLimitedPolicy),
        PolicyKind::CarbonOnly => Box::new(CarbonOnlyPolicy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DENSITY: f64 = 1e5;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1e-30)
    }

    #[test]
    fn potential_binds_when_resource_is_plentiful() {
        let p = GrowthParameters::default();
        let limit = DualLimitedPolicy.permitted_volume(1e-12, 1.0, 1.0, DENSITY, &p);
        assert_eq!(limit.limiting, LimitingFactor::Potential);
        assert!(close(limit.volume, 1e-12));
    }

    #[test]
    fn scarcest_resource_binds() {
        let p = GrowthParameters::default();
        let policy = DualLimitedPolicy;
        let hexose = 1e-9;
        let amino_acids = 1e-12;
        let limit = policy.permitted_volume(1.0, hexose, amino_acids, DENSITY, &p);
        let max_c = policy.volume_max_carbon(hexose, DENSITY, &p);
        let max_n = policy.volume_max_nitrogen(amino_acids, DENSITY, &p);
        assert!(max_n < max_c);
        assert_eq!(limit.limiting, LimitingFactor::Nitrogen);
        assert!(close(limit.volume, max_n));
        assert!(limit.volume <= max_c && limit.volume <= 1.0);
    }

    #[test]
    fn cost_inverts_carbon_limit() {
        let p = GrowthParameters::default();
        let policy = DualLimitedPolicy;
        let volume = policy.volume_max_carbon(2e-6, DENSITY, &p);
        assert!(close(policy.hexose_cost(volume, DENSITY, &p), 2e-6));
        let volume = policy.volume_max_nitrogen(3e-7, DENSITY, &p);
        assert!(close(policy.amino_acids_cost(volume, DENSITY, &p), 3e-7));
    }

    #[test]
    fn carbon_only_ignores_nitrogen() {
        let p = GrowthParameters::default();
        let policy = policy_for(PolicyKind::CarbonOnly);
        assert_eq!(policy.name(), "carbon_only");
        let limit = policy.permitted_volume(1.0, 1e-9, 0.0, DENSITY, &p);
        assert_eq!(limit.limiting, LimitingFactor::Carbon);
        assert!(policy.amino_acids_cost(1.0, DENSITY, &p).abs() < f64::EPSILON);
    }
}
