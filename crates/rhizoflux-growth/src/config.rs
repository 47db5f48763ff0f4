//! Growth parameters and their defaults.
//!
//! These values correspond to the `growth` section of
//! `rhizoflux-config.yaml`. The [`GrowthParameters`] struct bundles every
//! tunable of the growth phases so that callers (step runner, tests) can
//! override defaults.

use serde::{Deserialize, Serialize};

/// Which growth policy limits the permitted volume increase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Hexose and amino acids both limit growth.
    #[default]
    DualLimited,
    /// Only hexose limits growth; amino acids are not consumed.
    CarbonOnly,
}

/// Parameters of potential growth, allocation and the life cycle.
///
/// Concentrations are per gram of structural mass, lengths in metres and
/// durations in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthParameters {
    /// Growth policy selected for the run (default: `dual_limited`).
    #[serde(default)]
    pub policy: PolicyKind,

    /// Length of the supply window in apex radii (default: 16).
    #[serde(default = "default_growing_zone_factor")]
    pub growing_zone_factor: f64,

    /// Structural carbon produced per unit of hexose carbon consumed (default: 0.8).
    #[serde(default = "default_yield_growth")]
    pub yield_growth: f64,

    /// Mol of C per g of structural mass (default: 0.44 / 12.01).
    #[serde(default = "default_struct_mass_c_content")]
    pub struct_mass_c_content: f64,

    /// Mol of N per g of structural mass (default: 0.013 / 14.01).
    #[serde(default = "default_struct_mass_n_content")]
    pub struct_mass_n_content: f64,

    /// Mol of N per mol of amino acids (default: 1.4).
    #[serde(default = "default_r_nm_aa")]
    pub r_nm_aa: f64,

    /// Use the unregulated ArchiSimple elongation rule (default: true).
    #[serde(default = "default_true")]
    pub archi_simple: bool,

    /// Elongation rate per unit of apex diameter (s-1, default: 1.39e-4).
    #[serde(default = "default_elongation_rate")]
    pub elongation_rate: f64,

    /// Affinity constant of the regulated elongation rule (mol g-1).
    #[serde(default = "default_km_elongation")]
    pub km_elongation: f64,

    /// Relative radial growth rate of living segments (s-1, default: 1e-7).
    #[serde(default = "default_relative_thickening_rate")]
    pub relative_thickening_rate: f64,

    /// Relative radial growth rate of nodules (s-1, default: 5e-7).
    #[serde(default = "default_nodule_thickening_rate")]
    pub nodule_thickening_rate: f64,

    /// Radius above which nodules stop thickening (m, default: 5e-4).
    #[serde(default = "default_nodule_max_radius")]
    pub nodule_max_radius: f64,

    /// Temperature below which no thermal time accumulates (degrees C, default: 0).
    #[serde(default)]
    pub base_temperature: f64,

    /// Thermal time after emergence at which an apex stops growing
    /// (degree-seconds). Unset leaves apex stopping to an external driver.
    #[serde(default)]
    pub apex_growth_duration: Option<f64>,

    /// Time after growth stopped at which an apex dies (s). Unset leaves
    /// apex death to an external driver.
    #[serde(default)]
    pub apex_life_duration: Option<f64>,
}

const fn default_growing_zone_factor() -> f64 {
    16.0
}
const fn default_yield_growth() -> f64 {
    0.8
}
const fn default_struct_mass_c_content() -> f64 {
    0.44 / 12.01
}
const fn default_struct_mass_n_content() -> f64 {
    0.013 / 14.01
}
const fn default_r_nm_aa() -> f64 {
    1.4
}
const fn default_true() -> bool {
    true
}
const fn default_elongation_rate() -> f64 {
    1.39e-4
}
const fn default_km_elongation() -> f64 {
    1250e-6 / 6.0
}
const fn default_relative_thickening_rate() -> f64 {
    1e-7
}
const fn default_nodule_thickening_rate() -> f64 {
    5e-7
}
const fn default_nodule_max_radius() -> f64 {
    5e-4
}

impl Default for GrowthParameters {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            growing_zone_factor: default_growing_zone_factor(),
            yield_growth: default_yield_growth(),
            struct_mass_c_content: default_struct_mass_c_content(),
            struct_mass_n_content: default_struct_mass_n_content(),
            r_nm_aa: default_r_nm_aa(),
            archi_simple: true,
            elongation_rate: default_elongation_rate(),
            km_elongation: default_km_elongation(),
            relative_thickening_rate: default_relative_thickening_rate(),
            nodule_thickening_rate: default_nodule_thickening_rate(),
            nodule_max_radius: default_nodule_max_radius(),
            base_temperature: 0.0,
            apex_growth_duration: None,
            apex_life_duration: None,
        }
    }
}

impl GrowthParameters {
    /// Growth respiration (mol C) released when `hexose` mol are used for growth.
    pub fn growth_respiration(&self, hexose: f64) -> f64 {
        hexose * 6.0 * (1.0 - self.yield_growth)
    }
}
