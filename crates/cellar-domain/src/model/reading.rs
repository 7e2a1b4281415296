use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One measurement event for one vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub vessel_id: String,
    pub timestamp: Option<NaiveDateTime>,
    /// Raw level in the vessel's instrument unit
    pub level: f64,
    /// Gravity in degrees Plato
    pub plato: f64,
    /// Raw material code or text as reported
    pub material_code: String,
}

impl Reading {
    pub fn new(vessel_id: &str, level: f64, plato: f64, material_code: &str) -> Self {
        Self {
            vessel_id: vessel_id.to_string(),
            timestamp: None,
            level,
            plato,
            material_code: material_code.to_string(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}
