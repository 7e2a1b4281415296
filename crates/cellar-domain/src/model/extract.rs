//! Per-reading calculation results

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::vessel::VesselClass;

/// Usable liquid volume of a vessel at a given level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeResult {
    /// Registry id of the vessel
    pub vessel_id: String,
    pub vessel_class: VesselClass,
    /// Level used for the computation, after policy and calibration offset
    pub level: f64,
    /// Usable volume in liters, rounded
    pub volume_l: f64,
}

/// Extract mass computed for one reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractResult {
    pub vessel_id: String,
    pub vessel_class: VesselClass,
    pub timestamp: Option<NaiveDateTime>,
    /// Raw material code from the reading
    pub material_code: String,
    /// Normalized material name
    pub material: String,
    pub level: f64,
    pub volume_l: f64,
    pub plato: f64,
    /// f(A), kg of extract per hL
    pub fa_kg_per_hl: f64,
    pub extract_kg: f64,
}

impl ExtractResult {
    pub fn with_timestamp(mut self, timestamp: Option<NaiveDateTime>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
