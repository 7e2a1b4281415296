//! Extract mass calculation
//!
//! extract_kg = volume_l / 100 × f(A), where f(A) is the configured Plato
//! correlation in kg of extract per hL. This is the
//! volume × density × Plato / 100 convention with Plato × SG folded into f(A).

use cellar_types::ExtractError;
use tracing::debug;

use crate::model::{
    round_to, CalculationSettings, ExtractCorrelation, ExtractResult, MaterialCatalog,
    VolumeResult,
};

/// Extract mass for a volume and gravity, before rounding
///
/// Zero volume or zero Plato yields exactly zero; the correlation's small
/// negative constant term never produces a negative mass.
pub fn extract_mass_kg(volume_l: f64, plato: f64, correlation: &ExtractCorrelation) -> f64 {
    if volume_l <= 0.0 || plato <= 0.0 {
        return 0.0;
    }
    let fa = correlation.kg_per_hl(plato);
    (volume_l / 100.0 * fa).max(0.0)
}

/// Applies the Plato correlation to resolved volumes
pub struct ExtractCalculator<'a> {
    materials: &'a MaterialCatalog,
    correlation: ExtractCorrelation,
    plato_min: f64,
    plato_max: f64,
    mass_decimals: u32,
}

impl<'a> ExtractCalculator<'a> {
    pub fn new(materials: &'a MaterialCatalog, settings: &CalculationSettings) -> Self {
        Self {
            materials,
            correlation: settings.correlation,
            plato_min: settings.plato_min,
            plato_max: settings.plato_max,
            mass_decimals: settings.mass_decimals,
        }
    }

    pub fn materials(&self) -> &'a MaterialCatalog {
        self.materials
    }

    /// Correlation used for a normalized material name
    pub fn correlation_for(&self, material: &str) -> ExtractCorrelation {
        self.materials
            .correlation_for(material)
            .unwrap_or(self.correlation)
    }

    pub fn compute_extract(
        &self,
        volume: &VolumeResult,
        plato: f64,
        material_code: &str,
    ) -> Result<ExtractResult, ExtractError> {
        if plato.is_nan() || plato < self.plato_min || plato > self.plato_max {
            return Err(ExtractError::InvalidGravity {
                vessel_id: volume.vessel_id.clone(),
                plato,
                min: self.plato_min,
                max: self.plato_max,
            });
        }

        let material = self.materials.normalize(material_code);
        let correlation = self.correlation_for(&material);
        let fa_kg_per_hl = correlation.kg_per_hl(plato);
        let extract_kg = round_to(
            extract_mass_kg(volume.volume_l, plato, &correlation),
            self.mass_decimals,
        );

        debug!(
            vessel = %volume.vessel_id,
            material = %material,
            volume_l = volume.volume_l,
            plato,
            fa_kg_per_hl,
            extract_kg,
            "computed extract"
        );

        Ok(ExtractResult {
            vessel_id: volume.vessel_id.clone(),
            vessel_class: volume.vessel_class,
            timestamp: None,
            material_code: material_code.to_string(),
            material,
            level: volume.level,
            volume_l: volume.volume_l,
            plato,
            fa_kg_per_hl,
            extract_kg,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VesselClass;

    fn volume(volume_l: f64) -> VolumeResult {
        VolumeResult {
            vessel_id: "FST-01".to_string(),
            vessel_class: VesselClass::Fst,
            level: 3.0,
            volume_l,
        }
    }

    #[test]
    fn test_fst01_scenario() {
        let materials = MaterialCatalog::default();
        let calculator = ExtractCalculator::new(&materials, &CalculationSettings::default());
        let result = calculator
            .compute_extract(&volume(9374.78), 12.0, "7")
            .unwrap();
        // 9374.78 L / 100 × 12.5584631916 kg/hL
        assert_eq!(result.extract_kg, 1177.328);
        assert_eq!(result.material, "ichnusa");
        assert_eq!(result.material_code, "7");
        assert!((result.fa_kg_per_hl - 12.5584631916).abs() < 1e-9);
    }

    #[test]
    fn test_zero_plato_is_zero_mass() {
        let materials = MaterialCatalog::default();
        let calculator = ExtractCalculator::new(&materials, &CalculationSettings::default());
        let result = calculator.compute_extract(&volume(5000.0), 0.0, "8").unwrap();
        assert_eq!(result.extract_kg, 0.0);
    }

    #[test]
    fn test_zero_volume_is_zero_mass() {
        let materials = MaterialCatalog::default();
        let calculator = ExtractCalculator::new(&materials, &CalculationSettings::default());
        let result = calculator.compute_extract(&volume(0.0), 14.2, "8").unwrap();
        assert_eq!(result.extract_kg, 0.0);
    }

    #[test]
    fn test_tiny_plato_never_negative() {
        // f(A) is negative just above zero Plato
        let mass = extract_mass_kg(1000.0, 0.001, &ExtractCorrelation::default());
        assert_eq!(mass, 0.0);
    }

    #[test]
    fn test_invalid_gravity() {
        let materials = MaterialCatalog::default();
        let calculator = ExtractCalculator::new(&materials, &CalculationSettings::default());
        for plato in [-0.5, 30.5, f64::NAN] {
            let err = calculator.compute_extract(&volume(100.0), plato, "7");
            assert!(matches!(err, Err(ExtractError::InvalidGravity { .. })));
        }
    }

    #[test]
    fn test_material_correlation_override() {
        let mut materials = MaterialCatalog::default();
        if let Some(cruda) = materials.materials.iter_mut().find(|m| m.name == "cruda") {
            cruda.correlation = Some(ExtractCorrelation {
                a: 0.0,
                b: 0.0,
                c: 1.0,
                d: 0.0,
            });
        }
        let calculator = ExtractCalculator::new(&materials, &CalculationSettings::default());

        let overridden = calculator.compute_extract(&volume(1000.0), 10.0, "9").unwrap();
        assert_eq!(overridden.extract_kg, 100.0);

        let default = calculator.compute_extract(&volume(1000.0), 10.0, "7").unwrap();
        assert!(default.extract_kg > 100.0);
    }

    #[test]
    fn test_mass_rounding() {
        let materials = MaterialCatalog::default();
        let settings = CalculationSettings {
            mass_decimals: 0,
            ..Default::default()
        };
        let calculator = ExtractCalculator::new(&materials, &settings);
        let result = calculator.compute_extract(&volume(9374.78), 12.0, "7").unwrap();
        assert_eq!(result.extract_kg, 1177.0);
    }
}
