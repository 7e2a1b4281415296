//! Level to volume conversion
//!
//! The resolver looks the vessel up in the registry, applies the level
//! policy and the calibration offset, runs the shape formula and finally
//! subtracts the dead volume. Rounding happens once, on the usable volume.

use std::f64::consts::PI;

use cellar_types::ExtractError;
use tracing::{debug, warn};

use crate::model::{
    round_to, CalculationSettings, LevelPolicy, LevelUnit, StrappingPoint, VesselShape,
    VesselSpec, VolumeResult,
};
use crate::repository::VesselRegistry;

/// Converts vessel levels into usable liquid volumes
pub struct VesselGeometryResolver<'a> {
    registry: &'a dyn VesselRegistry,
    policy: LevelPolicy,
    volume_decimals: u32,
}

impl<'a> VesselGeometryResolver<'a> {
    pub fn new(registry: &'a dyn VesselRegistry, settings: &CalculationSettings) -> Self {
        Self {
            registry,
            policy: settings.level_policy,
            volume_decimals: settings.volume_decimals,
        }
    }

    pub fn registry(&self) -> &'a dyn VesselRegistry {
        self.registry
    }

    /// Usable volume of `vessel_id` at the raw `level`
    pub fn resolve(&self, vessel_id: &str, level: f64) -> Result<VolumeResult, ExtractError> {
        let spec = self
            .registry
            .find_vessel(vessel_id)
            .ok_or_else(|| ExtractError::UnknownVessel {
                vessel_id: vessel_id.to_string(),
            })?;

        let level = self.checked_level(spec, level)?;
        let corrected = (level + spec.level_offset).clamp(0.0, spec.top_level().max(0.0));
        let gross = gross_volume_l(spec, corrected);
        let usable = (gross - spec.dead_volume_l).max(0.0);
        let volume_l = round_to(usable, self.volume_decimals);

        debug!(
            vessel = %spec.id,
            level,
            corrected,
            gross,
            volume_l,
            "resolved vessel volume"
        );

        Ok(VolumeResult {
            vessel_id: spec.id.clone(),
            vessel_class: spec.class,
            level,
            volume_l,
        })
    }

    fn checked_level(&self, spec: &VesselSpec, level: f64) -> Result<f64, ExtractError> {
        let max_level = spec.max_level();
        let out_of_range = || ExtractError::OutOfRange {
            vessel_id: spec.id.clone(),
            level,
            max_level,
        };

        if level.is_nan() {
            return Err(out_of_range());
        }
        if (0.0..=max_level).contains(&level) {
            return Ok(level);
        }

        match self.policy {
            LevelPolicy::Reject => Err(out_of_range()),
            LevelPolicy::Clamp => {
                let clamped = level.clamp(0.0, max_level.max(0.0));
                warn!(vessel = %spec.id, level, clamped, "level clamped into range");
                Ok(clamped)
            }
        }
    }
}

/// Gross volume in liters at a corrected level, before dead volume
pub fn gross_volume_l(spec: &VesselSpec, level: f64) -> f64 {
    match &spec.shape {
        VesselShape::Cylinder { diameter_m, .. } => {
            cylinder_volume_l(*diameter_m, level_in_meters(spec, level))
        }
        VesselShape::ConeBottomCylinder {
            diameter_m,
            cone_height_m,
            ..
        } => cone_bottom_volume_l(*diameter_m, *cone_height_m, level_in_meters(spec, level)),
        VesselShape::Strapping { points } => strapping_volume_l(points, level),
        VesselShape::Volumetric { capacity_l } => match spec.level_unit {
            LevelUnit::Percent => capacity_l * level / 100.0,
            unit => level * unit.liters_per_unit().unwrap_or(1.0),
        },
    }
}

fn level_in_meters(spec: &VesselSpec, level: f64) -> f64 {
    match spec.level_unit {
        LevelUnit::Percent => level / 100.0 * spec.shape.height_m().unwrap_or(0.0),
        unit => level / unit.units_per_meter().unwrap_or(1.0),
    }
}

/// Volume of a vertical cylinder filled to `level_m`
pub fn cylinder_volume_l(diameter_m: f64, level_m: f64) -> f64 {
    let radius = diameter_m / 2.0;
    PI * radius * radius * level_m.max(0.0) * 1000.0
}

/// Volume of a cone-bottom cylinder filled to `level_m`, measured from the apex
pub fn cone_bottom_volume_l(diameter_m: f64, cone_height_m: f64, level_m: f64) -> f64 {
    let radius = diameter_m / 2.0;
    let h = level_m.max(0.0);
    let m3 = if h <= cone_height_m {
        // partial cone: radius grows linearly with height
        PI * radius * radius * h * h * h / (3.0 * cone_height_m * cone_height_m)
    } else {
        PI * radius * radius * cone_height_m / 3.0 + PI * radius * radius * (h - cone_height_m)
    };
    m3 * 1000.0
}

/// Piecewise-linear interpolation over a strapping table
///
/// Levels below the first point take the first volume, levels above the
/// last point take the last volume.
pub fn strapping_volume_l(points: &[StrappingPoint], level: f64) -> f64 {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return 0.0,
    };
    if level <= first.level {
        return first.liters;
    }
    if level >= last.level {
        return last.liters;
    }

    for pair in points.windows(2) {
        let (lo, hi) = (&pair[0], &pair[1]);
        if level <= hi.level {
            let t = (level - lo.level) / (hi.level - lo.level);
            return lo.liters + t * (hi.liters - lo.liters);
        }
    }
    last.liters
}
