//! Calculation settings shared by the resolver and the calculator

use cellar_types::ConfigError;
use serde::{Deserialize, Serialize};

use super::correlation::ExtractCorrelation;

/// What to do with a level outside `[0, max_level]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelPolicy {
    /// Report the reading as out of range
    #[default]
    Reject,
    /// Clamp into range and keep going
    Clamp,
}

/// Conventions applied identically to every reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSettings {
    #[serde(default)]
    pub correlation: ExtractCorrelation,

    #[serde(default = "default_plato_min")]
    pub plato_min: f64,

    #[serde(default = "default_plato_max")]
    pub plato_max: f64,

    /// Decimal places kept on volumes (liters)
    #[serde(default = "default_volume_decimals")]
    pub volume_decimals: u32,

    /// Decimal places kept on extract masses (kg)
    #[serde(default = "default_mass_decimals")]
    pub mass_decimals: u32,

    #[serde(default)]
    pub level_policy: LevelPolicy,

    /// Abort the batch on the first failing reading
    #[serde(default)]
    pub strict: bool,

    /// Leave the empty-vessel material out of the grand total
    #[serde(default)]
    pub exclude_empty_material: bool,

    /// Day-over-day volume change (L) flagged as significant
    #[serde(default = "default_significant_change_l")]
    pub significant_change_l: f64,
}

fn default_plato_min() -> f64 {
    0.0
}

fn default_plato_max() -> f64 {
    30.0
}

fn default_volume_decimals() -> u32 {
    2
}

fn default_mass_decimals() -> u32 {
    3
}

fn default_significant_change_l() -> f64 {
    1000.0
}

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            correlation: ExtractCorrelation::default(),
            plato_min: default_plato_min(),
            plato_max: default_plato_max(),
            volume_decimals: default_volume_decimals(),
            mass_decimals: default_mass_decimals(),
            level_policy: LevelPolicy::default(),
            strict: false,
            exclude_empty_material: false,
            significant_change_l: default_significant_change_l(),
        }
    }
}

impl CalculationSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.correlation.is_finite() {
            return Err(ConfigError::InvalidSettings(
                "correlation coefficients must be finite".to_string(),
            ));
        }
        if !self.plato_min.is_finite() || !self.plato_max.is_finite() {
            return Err(ConfigError::InvalidSettings(
                "plato bounds must be finite".to_string(),
            ));
        }
        if self.plato_min < 0.0 || self.plato_min > self.plato_max {
            return Err(ConfigError::InvalidSettings(format!(
                "plato bounds [{}, {}] are not a valid range",
                self.plato_min, self.plato_max
            )));
        }
        if self.volume_decimals > 9 || self.mass_decimals > 9 {
            return Err(ConfigError::InvalidSettings(
                "at most 9 decimal places are supported".to_string(),
            ));
        }
        if !self.significant_change_l.is_finite() || self.significant_change_l < 0.0 {
            return Err(ConfigError::InvalidSettings(
                "significant_change_l must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Round half away from zero to a fixed number of decimals
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
