//! Aggregated extract totals

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::extract::ExtractResult;
use super::material::MaterialCatalog;
use super::vessel::VesselClass;

/// Totals for one material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialTotal {
    pub extract_kg: f64,
    pub volume_l: f64,
    /// Sum of f(A) over the readings
    pub fa_sum: f64,
    pub count: usize,
}

/// Totals for one vessel class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassTotal {
    pub extract_kg: f64,
    pub volume_l: f64,
    pub count: usize,
}

/// Most recent reading seen for a vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastReading {
    pub timestamp: Option<NaiveDateTime>,
    pub material: String,
    pub plato: f64,
    pub level: f64,
    pub volume_l: f64,
    pub extract_kg: f64,
}

impl LastReading {
    fn from_result(result: &ExtractResult) -> Self {
        Self {
            timestamp: result.timestamp,
            material: result.material.clone(),
            plato: result.plato,
            level: result.level,
            volume_l: result.volume_l,
            extract_kg: result.extract_kg,
        }
    }

    /// Total order so the pick does not depend on processing order
    fn cmp_recency(&self, other: &LastReading) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.material.cmp(&other.material))
            .then_with(|| self.plato.total_cmp(&other.plato))
            .then_with(|| self.level.total_cmp(&other.level))
            .then_with(|| self.volume_l.total_cmp(&other.volume_l))
            .then_with(|| self.extract_kg.total_cmp(&other.extract_kg))
    }
}

/// Totals for one vessel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VesselTotal {
    pub vessel_class: VesselClass,
    pub extract_kg: f64,
    pub fa_sum: f64,
    pub count: usize,
    pub last: Option<LastReading>,
}

/// Batch totals grouped by material, vessel class and vessel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_kg: f64,
    pub reading_count: usize,
    pub by_material: BTreeMap<String, MaterialTotal>,
    pub by_class: BTreeMap<VesselClass, ClassTotal>,
    pub by_vessel: BTreeMap<String, VesselTotal>,
}

impl BatchSummary {
    /// Fold one result into the totals
    pub fn record(&mut self, result: &ExtractResult) {
        self.total_kg += result.extract_kg;
        self.reading_count += 1;

        let material = self.by_material.entry(result.material.clone()).or_default();
        material.extract_kg += result.extract_kg;
        material.volume_l += result.volume_l;
        material.fa_sum += result.fa_kg_per_hl;
        material.count += 1;

        let class = self.by_class.entry(result.vessel_class).or_default();
        class.extract_kg += result.extract_kg;
        class.volume_l += result.volume_l;
        class.count += 1;

        let vessel = self
            .by_vessel
            .entry(result.vessel_id.clone())
            .or_insert_with(|| VesselTotal {
                vessel_class: result.vessel_class,
                extract_kg: 0.0,
                fa_sum: 0.0,
                count: 0,
                last: None,
            });
        vessel.extract_kg += result.extract_kg;
        vessel.fa_sum += result.fa_kg_per_hl;
        vessel.count += 1;

        let candidate = LastReading::from_result(result);
        let newer = match &vessel.last {
            Some(current) => candidate.cmp_recency(current) == Ordering::Greater,
            None => true,
        };
        if newer {
            vessel.last = Some(candidate);
        }
    }

    /// Grand total without the empty-vessel material
    pub fn total_excluding_empty(&self, materials: &MaterialCatalog) -> f64 {
        self.by_material
            .iter()
            .filter(|(name, _)| !materials.is_empty_material(name))
            .map(|(_, total)| total.extract_kg)
            .sum()
    }

    /// Materials ordered by extract mass, largest first
    pub fn materials_by_mass(&self) -> Vec<(&String, &MaterialTotal)> {
        let mut rows: Vec<_> = self.by_material.iter().collect();
        rows.sort_by(|a, b| b.1.extract_kg.total_cmp(&a.1.extract_kg).then_with(|| a.0.cmp(b.0)));
        rows
    }

    /// Vessels ordered by extract mass, largest first
    pub fn vessels_by_mass(&self) -> Vec<(&String, &VesselTotal)> {
        let mut rows: Vec<_> = self.by_vessel.iter().collect();
        rows.sort_by(|a, b| b.1.extract_kg.total_cmp(&a.1.extract_kg).then_with(|| a.0.cmp(b.0)));
        rows
    }
}
