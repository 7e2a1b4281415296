//! Vessel reference data
//!
//! A vessel spec is immutable registry data: class, shape with its
//! dimensions, the unit the level instrument reports in, and the calibration
//! offsets applied before the shape formula.

use std::collections::HashMap;

use cellar_types::ConfigError;
use serde::{Deserialize, Serialize};

use crate::repository::VesselRegistry;

/// Vessel family in the cellar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VesselClass {
    /// Fermentation tank
    Fst,
    /// Bright beer tank
    Bbt,
    /// Recovered beer tank
    Rbt,
}

impl VesselClass {
    pub const ALL: [VesselClass; 3] = [VesselClass::Fst, VesselClass::Bbt, VesselClass::Rbt];

    pub fn label(&self) -> &'static str {
        match self {
            VesselClass::Fst => "FST",
            VesselClass::Bbt => "BBT",
            VesselClass::Rbt => "RBT",
        }
    }

    /// Parse a family prefix such as "fst" or "BBT"
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.trim().to_ascii_uppercase().as_str() {
            "FST" => Some(VesselClass::Fst),
            "BBT" => Some(VesselClass::Bbt),
            "RBT" => Some(VesselClass::Rbt),
            _ => None,
        }
    }

    /// Infer the class from a vessel identifier ("FST-01" -> Fst)
    pub fn from_vessel_id(vessel_id: &str) -> Option<Self> {
        let normalized = normalize_vessel_id(vessel_id);
        let prefix: String = normalized
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        Self::from_prefix(&prefix)
    }
}

impl std::fmt::Display for VesselClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Unit of the raw level reading
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelUnit {
    #[default]
    M,
    Cm,
    Mm,
    Percent,
    L,
    Hl,
}

impl LevelUnit {
    pub fn is_length(&self) -> bool {
        matches!(self, LevelUnit::M | LevelUnit::Cm | LevelUnit::Mm)
    }

    pub fn is_volume(&self) -> bool {
        matches!(self, LevelUnit::L | LevelUnit::Hl)
    }

    /// Raw units per meter, for length units
    pub fn units_per_meter(&self) -> Option<f64> {
        match self {
            LevelUnit::M => Some(1.0),
            LevelUnit::Cm => Some(100.0),
            LevelUnit::Mm => Some(1000.0),
            _ => None,
        }
    }

    /// Liters per one raw unit, for volume units
    pub fn liters_per_unit(&self) -> Option<f64> {
        match self {
            LevelUnit::L => Some(1.0),
            LevelUnit::Hl => Some(100.0),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            LevelUnit::M => "m",
            LevelUnit::Cm => "cm",
            LevelUnit::Mm => "mm",
            LevelUnit::Percent => "%",
            LevelUnit::L => "L",
            LevelUnit::Hl => "hL",
        }
    }
}

/// One calibrated point of a strapping table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrappingPoint {
    /// Level in the vessel's level unit
    pub level: f64,
    /// Gross volume at that level
    pub liters: f64,
}

/// Vessel shape with its dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum VesselShape {
    /// Flat-bottom vertical cylinder
    Cylinder { diameter_m: f64, height_m: f64 },
    /// Vertical cylinder on a cone with the apex down; level is measured from the apex
    ConeBottomCylinder {
        diameter_m: f64,
        cone_height_m: f64,
        cylinder_height_m: f64,
    },
    /// Calibrated level-to-volume table
    Strapping { points: Vec<StrappingPoint> },
    /// The instrument already reports a volume
    Volumetric { capacity_l: f64 },
}

impl VesselShape {
    pub fn name(&self) -> &'static str {
        match self {
            VesselShape::Cylinder { .. } => "cylinder",
            VesselShape::ConeBottomCylinder { .. } => "cone_bottom_cylinder",
            VesselShape::Strapping { .. } => "strapping",
            VesselShape::Volumetric { .. } => "volumetric",
        }
    }

    /// Total geometric height in meters, for geometric shapes
    pub fn height_m(&self) -> Option<f64> {
        match self {
            VesselShape::Cylinder { height_m, .. } => Some(*height_m),
            VesselShape::ConeBottomCylinder {
                cone_height_m,
                cylinder_height_m,
                ..
            } => Some(cone_height_m + cylinder_height_m),
            _ => None,
        }
    }
}

/// Static description of a vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselSpec {
    pub id: String,
    pub class: VesselClass,
    #[serde(flatten)]
    pub shape: VesselShape,
    #[serde(default)]
    pub level_unit: LevelUnit,
    /// Highest physically valid reading; defaults to the top of the vessel
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_level: Option<f64>,
    /// Calibration offset added to every raw reading (raw units)
    #[serde(default)]
    pub level_offset: f64,
    /// Volume below the lowest usable level
    #[serde(default)]
    pub dead_volume_l: f64,
}

impl VesselSpec {
    /// Level at the top of the vessel, in the vessel's level unit
    pub fn top_level(&self) -> f64 {
        if self.level_unit == LevelUnit::Percent {
            return 100.0;
        }
        match &self.shape {
            VesselShape::Strapping { points } => points.last().map(|p| p.level).unwrap_or(0.0),
            VesselShape::Volumetric { capacity_l } => self
                .level_unit
                .liters_per_unit()
                .map(|l| capacity_l / l)
                .unwrap_or(0.0),
            shape => match (shape.height_m(), self.level_unit.units_per_meter()) {
                (Some(h), Some(per_m)) => h * per_m,
                _ => 0.0,
            },
        }
    }

    /// Highest accepted raw reading
    pub fn max_level(&self) -> f64 {
        self.max_level.unwrap_or_else(|| self.top_level())
    }

    /// Registry key for this vessel
    pub fn key(&self) -> String {
        normalize_vessel_id(&self.id)
    }

    /// Check dimensions and unit compatibility
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidVessel {
            vessel_id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if let Some(class) = VesselClass::from_vessel_id(&self.id) {
            if class != self.class {
                return Err(invalid("id prefix does not match vessel class"));
            }
        }
        if !self.dead_volume_l.is_finite() || self.dead_volume_l < 0.0 {
            return Err(invalid("dead_volume_l must be a non-negative number"));
        }
        if !self.level_offset.is_finite() {
            return Err(invalid("level_offset must be finite"));
        }

        match &self.shape {
            VesselShape::Cylinder {
                diameter_m,
                height_m,
            } => {
                if !is_positive(*diameter_m) || !is_positive(*height_m) {
                    return Err(invalid("cylinder dimensions must be positive"));
                }
                if !(self.level_unit.is_length() || self.level_unit == LevelUnit::Percent) {
                    return Err(invalid("cylinder needs a length or percent level unit"));
                }
            }
            VesselShape::ConeBottomCylinder {
                diameter_m,
                cone_height_m,
                cylinder_height_m,
            } => {
                if !is_positive(*diameter_m) || !is_positive(*cone_height_m) {
                    return Err(invalid("cone dimensions must be positive"));
                }
                if !cylinder_height_m.is_finite() || *cylinder_height_m < 0.0 {
                    return Err(invalid("cylinder_height_m must be non-negative"));
                }
                if !(self.level_unit.is_length() || self.level_unit == LevelUnit::Percent) {
                    return Err(invalid("cone-bottom vessel needs a length or percent level unit"));
                }
            }
            VesselShape::Strapping { points } => {
                if points.len() < 2 {
                    return Err(invalid("strapping table needs at least two points"));
                }
                if points
                    .iter()
                    .any(|p| !is_non_negative(p.level) || !is_non_negative(p.liters))
                {
                    return Err(invalid("strapping points must be finite and non-negative"));
                }
                for pair in points.windows(2) {
                    if pair[1].level <= pair[0].level {
                        return Err(invalid("strapping levels must be strictly increasing"));
                    }
                    if pair[1].liters < pair[0].liters {
                        return Err(invalid("strapping volumes must not decrease"));
                    }
                }
            }
            VesselShape::Volumetric { capacity_l } => {
                if !is_positive(*capacity_l) {
                    return Err(invalid("capacity_l must be positive"));
                }
                if !(self.level_unit.is_volume() || self.level_unit == LevelUnit::Percent) {
                    return Err(invalid("volumetric vessel needs a volume or percent level unit"));
                }
            }
        }

        if let Some(max) = self.max_level {
            if !is_positive(max) {
                return Err(invalid("max_level must be positive"));
            }
        }

        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Canonical form of a vessel identifier
///
/// Uppercases, drops separators and strips leading zeros from the numeric
/// part, so "FST-01", "fst 1" and "FST1" share the key "FST1".
pub fn normalize_vessel_id(vessel_id: &str) -> String {
    let cleaned: String = vessel_id
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .collect::<String>()
        .to_uppercase();

    let prefix: String = cleaned
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let digits = &cleaned[prefix.len()..];

    if prefix.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return cleaned;
    }

    let trimmed = digits.trim_start_matches('0');
    let number = if trimmed.is_empty() { "0" } else { trimmed };
    format!("{}{}", prefix, number)
}

/// In-memory vessel registry keyed by normalized id
#[derive(Debug, Clone, Default)]
pub struct VesselCatalog {
    vessels: HashMap<String, VesselSpec>,
}

impl VesselCatalog {
    /// Build a catalog, validating every spec and rejecting duplicate ids
    pub fn from_specs(specs: Vec<VesselSpec>) -> Result<Self, ConfigError> {
        let mut vessels = HashMap::with_capacity(specs.len());
        for spec in specs {
            spec.validate()?;
            let key = spec.key();
            if vessels.contains_key(&key) {
                return Err(ConfigError::DuplicateVessel(spec.id));
            }
            vessels.insert(key, spec);
        }
        Ok(Self { vessels })
    }

    pub fn is_empty(&self) -> bool {
        self.vessels.is_empty()
    }
}

impl VesselRegistry for VesselCatalog {
    fn find_vessel(&self, vessel_id: &str) -> Option<&VesselSpec> {
        self.vessels.get(&normalize_vessel_id(vessel_id))
    }

    fn all_vessels(&self) -> Vec<&VesselSpec> {
        let mut all: Vec<&VesselSpec> = self.vessels.values().collect();
        all.sort_by_key(|v| (v.class, v.key()));
        all
    }

    fn count(&self) -> usize {
        self.vessels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cylinder(id: &str) -> VesselSpec {
        VesselSpec {
            id: id.to_string(),
            class: VesselClass::Fst,
            shape: VesselShape::Cylinder {
                diameter_m: 2.0,
                height_m: 4.0,
            },
            level_unit: LevelUnit::M,
            max_level: None,
            level_offset: 0.0,
            dead_volume_l: 50.0,
        }
    }

    #[test]
    fn test_normalize_vessel_id() {
        assert_eq!(normalize_vessel_id("FST-01"), "FST1");
        assert_eq!(normalize_vessel_id("fst 1"), "FST1");
        assert_eq!(normalize_vessel_id("BBT_12"), "BBT12");
        assert_eq!(normalize_vessel_id("RBT00"), "RBT0");
        assert_eq!(normalize_vessel_id("tank-a"), "TANKA");
    }

    #[test]
    fn test_class_from_vessel_id() {
        assert_eq!(VesselClass::from_vessel_id("bbt-3"), Some(VesselClass::Bbt));
        assert_eq!(VesselClass::from_vessel_id("XYZ1"), None);
    }

    #[test]
    fn test_top_level_units() {
        let mut spec = cylinder("FST1");
        assert!((spec.top_level() - 4.0).abs() < 1e-12);
        spec.level_unit = LevelUnit::Cm;
        assert_eq!(spec.top_level(), 400.0);
        spec.level_unit = LevelUnit::Percent;
        assert_eq!(spec.top_level(), 100.0);
        spec.max_level = Some(95.0);
        assert_eq!(spec.max_level(), 95.0);
    }

    #[test]
    fn test_validate_rejects_bad_unit() {
        let mut spec = cylinder("FST1");
        spec.level_unit = LevelUnit::Hl;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_class_mismatch() {
        let mut spec = cylinder("BBT1");
        spec.class = VesselClass::Fst;
        assert!(matches!(
            spec.validate(),
            Err(ConfigError::InvalidVessel { .. })
        ));
    }

    #[test]
    fn test_validate_strapping_order() {
        let spec = VesselSpec {
            id: "BBT1".to_string(),
            class: VesselClass::Bbt,
            shape: VesselShape::Strapping {
                points: vec![
                    StrappingPoint { level: 0.0, liters: 0.0 },
                    StrappingPoint { level: 0.0, liters: 10.0 },
                ],
            },
            level_unit: LevelUnit::Cm,
            max_level: None,
            level_offset: 0.0,
            dead_volume_l: 0.0,
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_strapping_levels() {
        let spec = VesselSpec {
            id: "BBT-05".to_string(),
            class: VesselClass::Bbt,
            shape: VesselShape::Strapping {
                points: vec![
                    StrappingPoint { level: -20.0, liters: 0.0 },
                    StrappingPoint { level: -10.0, liters: 500.0 },
                ],
            },
            level_unit: LevelUnit::Cm,
            max_level: Some(50.0),
            level_offset: 0.0,
            dead_volume_l: 0.0,
        };
        assert!(matches!(
            spec.validate(),
            Err(ConfigError::InvalidVessel { .. })
        ));
        assert!(VesselCatalog::from_specs(vec![spec]).is_err());
    }

    #[test]
    fn test_catalog_lookup_and_duplicates() {
        let catalog = VesselCatalog::from_specs(vec![cylinder("FST-01")]).unwrap();
        assert!(catalog.find_vessel("fst1").is_some());
        assert!(catalog.find_vessel("FST2").is_none());
        assert_eq!(catalog.count(), 1);

        let dup = VesselCatalog::from_specs(vec![cylinder("FST-01"), cylinder("FST1")]);
        assert!(matches!(dup, Err(ConfigError::DuplicateVessel(_))));
    }
}
