//! CSV reports for batch results

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use cellar_domain::service::{BatchOutcome, DailyVariation, ReadingFailure};
use cellar_domain::{BatchSummary, ExtractResult};
use cellar_types::Result;
use serde::Serialize;
use tracing::info;

use super::format_timestamp;

#[derive(Serialize)]
struct VesselRow<'a> {
    vessel: &'a str,
    class: &'a str,
    readings: usize,
    extract_kg: f64,
    avg_fa_kg_per_hl: f64,
    last_timestamp: String,
    last_material: &'a str,
    last_plato: Option<f64>,
    last_level: Option<f64>,
    last_volume_l: Option<f64>,
}

#[derive(Serialize)]
struct MaterialRow<'a> {
    material: &'a str,
    readings: usize,
    volume_l: f64,
    extract_kg: f64,
    avg_fa_kg_per_hl: f64,
    share_pct: f64,
}

#[derive(Serialize)]
struct DetailRow<'a> {
    timestamp: String,
    vessel: &'a str,
    class: &'a str,
    material_code: &'a str,
    material: &'a str,
    level: f64,
    volume_l: f64,
    plato: f64,
    fa_kg_per_hl: f64,
    extract_kg: f64,
}

#[derive(Serialize)]
struct VariationRow<'a> {
    day: String,
    vessel: &'a str,
    material: &'a str,
    level_prev: f64,
    level_curr: f64,
    delta_level: f64,
    volume_prev_l: f64,
    volume_curr_l: f64,
    delta_volume_l: f64,
    plato_prev: f64,
    plato_curr: f64,
    kg_prev: f64,
    kg_curr: f64,
    delta_kg: f64,
    trend: String,
}

#[derive(Serialize)]
struct FailureRow<'a> {
    timestamp: String,
    vessel: &'a str,
    level: f64,
    plato: f64,
    material_code: &'a str,
    kind: &'a str,
    message: String,
}

fn average(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Per-vessel totals, heaviest vessel first
pub fn write_vessel_report<W: Write>(writer: W, summary: &BatchSummary) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (vessel, total) in summary.vessels_by_mass() {
        let last = total.last.as_ref();
        wtr.serialize(VesselRow {
            vessel,
            class: total.vessel_class.label(),
            readings: total.count,
            extract_kg: total.extract_kg,
            avg_fa_kg_per_hl: average(total.fa_sum, total.count),
            last_timestamp: format_timestamp(last.and_then(|l| l.timestamp)),
            last_material: last.map(|l| l.material.as_str()).unwrap_or(""),
            last_plato: last.map(|l| l.plato),
            last_level: last.map(|l| l.level),
            last_volume_l: last.map(|l| l.volume_l),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Per-material totals with their share of the grand total
pub fn write_material_report<W: Write>(writer: W, summary: &BatchSummary) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for (material, total) in summary.materials_by_mass() {
        let share_pct = if summary.total_kg > 0.0 {
            total.extract_kg / summary.total_kg * 100.0
        } else {
            0.0
        };
        wtr.serialize(MaterialRow {
            material,
            readings: total.count,
            volume_l: total.volume_l,
            extract_kg: total.extract_kg,
            avg_fa_kg_per_hl: average(total.fa_sum, total.count),
            share_pct,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// One row per computed reading
pub fn write_detail_report<W: Write>(writer: W, results: &[ExtractResult]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in results {
        wtr.serialize(DetailRow {
            timestamp: format_timestamp(r.timestamp),
            vessel: &r.vessel_id,
            class: r.vessel_class.label(),
            material_code: &r.material_code,
            material: &r.material,
            level: r.level,
            volume_l: r.volume_l,
            plato: r.plato,
            fa_kg_per_hl: r.fa_kg_per_hl,
            extract_kg: r.extract_kg,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_variation_report<W: Write>(writer: W, variations: &[DailyVariation]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for v in variations {
        wtr.serialize(VariationRow {
            day: v.day.format("%Y-%m-%d").to_string(),
            vessel: &v.vessel_id,
            material: &v.material,
            level_prev: v.level_prev,
            level_curr: v.level_curr,
            delta_level: v.delta_level,
            volume_prev_l: v.volume_prev_l,
            volume_curr_l: v.volume_curr_l,
            delta_volume_l: v.delta_volume_l,
            plato_prev: v.plato_prev,
            plato_curr: v.plato_curr,
            kg_prev: v.kg_prev,
            kg_curr: v.kg_curr,
            delta_kg: v.delta_kg,
            trend: format!("{:?}", v.trend).to_lowercase(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Readings that could not be converted, with the reason
pub fn write_failure_report<W: Write>(writer: W, failures: &[ReadingFailure]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for f in failures {
        wtr.serialize(FailureRow {
            timestamp: format_timestamp(f.reading.timestamp),
            vessel: &f.reading.vessel_id,
            level: f.reading.level,
            plato: f.reading.plato,
            material_code: &f.reading.material_code,
            kind: f.error.kind(),
            message: f.error.to_string(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write every CSV report of a batch into `dir`
///
/// The failure report is only written when some reading failed.
pub fn export_all(
    dir: &Path,
    outcome: &BatchOutcome,
    variations: &[DailyVariation],
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let path = dir.join("extract_by_vessel.csv");
    write_vessel_report(File::create(&path)?, &outcome.summary)?;
    written.push(path);

    let path = dir.join("extract_by_material.csv");
    write_material_report(File::create(&path)?, &outcome.summary)?;
    written.push(path);

    let path = dir.join("extract_details.csv");
    write_detail_report(File::create(&path)?, &outcome.results)?;
    written.push(path);

    let path = dir.join("daily_variations.csv");
    write_variation_report(File::create(&path)?, variations)?;
    written.push(path);

    if !outcome.failures.is_empty() {
        let path = dir.join("failed_readings.csv");
        write_failure_report(File::create(&path)?, &outcome.failures)?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "csv reports written");
    Ok(written)
}
