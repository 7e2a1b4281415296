//! Day-over-day variations per vessel
//!
//! For every vessel the last reading of each day is compared with the last
//! reading of the previous day in the batch. Days on which a vessel has no
//! reading break the chain for that vessel.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::ExtractResult;

/// Direction of a day-over-day change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increase,
    Decrease,
    Steady,
}

impl Trend {
    fn from_delta(delta: f64, threshold: f64) -> Self {
        if delta > threshold {
            Trend::Increase
        } else if delta < -threshold {
            Trend::Decrease
        } else {
            Trend::Steady
        }
    }
}

/// Change of one vessel between two consecutive days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyVariation {
    pub day: NaiveDate,
    pub vessel_id: String,
    pub material: String,
    pub level_prev: f64,
    pub level_curr: f64,
    pub delta_level: f64,
    pub volume_prev_l: f64,
    pub volume_curr_l: f64,
    pub delta_volume_l: f64,
    pub plato_prev: f64,
    pub plato_curr: f64,
    pub kg_prev: f64,
    pub kg_curr: f64,
    pub delta_kg: f64,
    pub trend: Trend,
}

/// Roll-up over a set of variations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariationStats {
    pub count: usize,
    pub total_delta_volume_l: f64,
    pub total_delta_kg: f64,
    pub max_increase_volume_l: f64,
    pub max_decrease_volume_l: f64,
    pub max_increase_kg: f64,
    pub max_decrease_kg: f64,
}

impl VariationStats {
    pub fn from_variations(variations: &[DailyVariation]) -> Self {
        variations.iter().fold(Self::default(), |mut stats, v| {
            stats.count += 1;
            stats.total_delta_volume_l += v.delta_volume_l;
            stats.total_delta_kg += v.delta_kg;
            stats.max_increase_volume_l = stats.max_increase_volume_l.max(v.delta_volume_l);
            stats.max_decrease_volume_l = stats.max_decrease_volume_l.min(v.delta_volume_l);
            stats.max_increase_kg = stats.max_increase_kg.max(v.delta_kg);
            stats.max_decrease_kg = stats.max_decrease_kg.min(v.delta_kg);
            stats
        })
    }
}

fn cmp_recency(a: &ExtractResult, b: &ExtractResult) -> Ordering {
    a.timestamp
        .cmp(&b.timestamp)
        .then_with(|| a.material.cmp(&b.material))
        .then_with(|| a.level.total_cmp(&b.level))
        .then_with(|| a.extract_kg.total_cmp(&b.extract_kg))
}

/// Day-over-day changes for every vessel
///
/// `significant_change_l` is the volume change above which a variation is
/// tagged as an increase or a decrease.
pub fn daily_variations(
    results: &[ExtractResult],
    significant_change_l: f64,
) -> Vec<DailyVariation> {
    let mut last_of_day: BTreeMap<&str, BTreeMap<NaiveDate, &ExtractResult>> = BTreeMap::new();
    let mut all_days: BTreeSet<NaiveDate> = BTreeSet::new();

    for result in results {
        let Some(ts) = result.timestamp else {
            continue;
        };
        let day = ts.date();
        all_days.insert(day);

        let slot = last_of_day
            .entry(result.vessel_id.as_str())
            .or_default()
            .entry(day)
            .or_insert(result);
        if cmp_recency(result, slot) == Ordering::Greater {
            *slot = result;
        }
    }

    let days: Vec<NaiveDate> = all_days.into_iter().collect();
    let mut variations = Vec::new();

    for (vessel_id, by_day) in &last_of_day {
        for pair in days.windows(2) {
            let (Some(prev), Some(curr)) = (by_day.get(&pair[0]), by_day.get(&pair[1])) else {
                continue;
            };
            let delta_volume_l = curr.volume_l - prev.volume_l;
            variations.push(DailyVariation {
                day: pair[1],
                vessel_id: vessel_id.to_string(),
                material: curr.material.clone(),
                level_prev: prev.level,
                level_curr: curr.level,
                delta_level: curr.level - prev.level,
                volume_prev_l: prev.volume_l,
                volume_curr_l: curr.volume_l,
                delta_volume_l,
                plato_prev: prev.plato,
                plato_curr: curr.plato,
                kg_prev: prev.extract_kg,
                kg_curr: curr.extract_kg,
                delta_kg: curr.extract_kg - prev.extract_kg,
                trend: Trend::from_delta(delta_volume_l, significant_change_l),
            });
        }
    }

    variations
}
