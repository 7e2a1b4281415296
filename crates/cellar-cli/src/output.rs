//! Output formatting module

use std::collections::BTreeMap;

use cellar_domain::service::{BatchOutcome, DailyVariation, VariationStats};
use cellar_domain::{
    BatchSummary, ClassTotal, ExtractCorrelation, MaterialCatalog, MaterialTotal, VesselClass,
    VesselSpec, VesselTotal,
};
use cellar_types::{OutputFormat, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn fmt_time(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn average(sum: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    println!("{}", content);
    Ok(())
}

#[derive(Serialize)]
struct FailureEntry<'a> {
    vessel_id: &'a str,
    timestamp: Option<NaiveDateTime>,
    kind: &'a str,
    message: String,
}

#[derive(Serialize)]
struct AnalysisReport<'a> {
    period_from: Option<NaiveDateTime>,
    period_to: Option<NaiveDateTime>,
    readings_processed: usize,
    readings_failed: usize,
    readings_skipped: usize,
    total_kg: f64,
    total_kg_excluding_empty: f64,
    exclude_empty: bool,
    by_class: &'a BTreeMap<VesselClass, ClassTotal>,
    by_material: &'a BTreeMap<String, MaterialTotal>,
    by_vessel: &'a BTreeMap<String, VesselTotal>,
    failures: Vec<FailureEntry<'a>>,
}

/// Print the result of `analyze`
pub fn output_analysis(
    output_format: OutputFormat,
    outcome: &BatchOutcome,
    materials: &MaterialCatalog,
    exclude_empty: bool,
) -> Result<()> {
    let summary = &outcome.summary;
    let period_from = outcome.results.iter().filter_map(|r| r.timestamp).min();
    let period_to = outcome.results.iter().filter_map(|r| r.timestamp).max();
    let total_excluding_empty = summary.total_excluding_empty(materials);

    if output_format == OutputFormat::Json {
        let report = AnalysisReport {
            period_from,
            period_to,
            readings_processed: summary.reading_count,
            readings_failed: outcome.failures.len(),
            readings_skipped: outcome.skipped,
            total_kg: summary.total_kg,
            total_kg_excluding_empty: total_excluding_empty,
            exclude_empty,
            by_class: &summary.by_class,
            by_material: &summary.by_material,
            by_vessel: &summary.by_vessel,
            failures: outcome
                .failures
                .iter()
                .map(|f| FailureEntry {
                    vessel_id: &f.reading.vessel_id,
                    timestamp: f.reading.timestamp,
                    kind: f.error.kind(),
                    message: f.error.to_string(),
                })
                .collect(),
        };
        return print_json(&report);
    }

    println!("\nExtract Analysis");
    println!("================");
    println!("Period:          {} .. {}", fmt_time(period_from), fmt_time(period_to));
    println!(
        "Readings:        {} processed, {} failed, {} filtered out",
        summary.reading_count,
        outcome.failures.len(),
        outcome.skipped
    );

    println!("\n--- By vessel class ---");
    for (class, total) in &summary.by_class {
        println!(
            "{:<6} {:>14.3} kg {:>14.2} L {:>6} readings",
            class.label(),
            total.extract_kg,
            total.volume_l,
            total.count
        );
    }

    print_material_table(summary, materials);

    println!("\n--- By vessel ---");
    println!(
        "{:<8} {:<5} {:>8} {:>14}  {:<16} {:<16} {:>7} {:>12}",
        "Vessel", "Class", "Readings", "Extract (kg)", "Last reading", "Material", "Plato", "Volume (L)"
    );
    for (vessel, total) in summary.vessels_by_mass() {
        match &total.last {
            Some(last) => println!(
                "{:<8} {:<5} {:>8} {:>14.3}  {:<16} {:<16} {:>7.2} {:>12.2}",
                vessel,
                total.vessel_class.label(),
                total.count,
                total.extract_kg,
                fmt_time(last.timestamp),
                last.material,
                last.plato,
                last.volume_l
            ),
            None => println!(
                "{:<8} {:<5} {:>8} {:>14.3}",
                vessel,
                total.vessel_class.label(),
                total.count,
                total.extract_kg
            ),
        }
    }

    println!();
    if exclude_empty {
        println!("Total extract:   {:.3} kg (empty vessels excluded)", total_excluding_empty);
        println!("Including empty: {:.3} kg", summary.total_kg);
    } else {
        println!("Total extract:   {:.3} kg", summary.total_kg);
        println!("Excluding empty: {:.3} kg", total_excluding_empty);
    }

    if !outcome.failures.is_empty() {
        println!("\nFailed readings:");
        for f in &outcome.failures {
            println!(
                "  {:<8} {:<16} [{}] {}",
                f.reading.vessel_id,
                fmt_time(f.reading.timestamp),
                f.error.kind(),
                f.error
            );
        }
    }

    Ok(())
}

fn print_material_table(summary: &BatchSummary, materials: &MaterialCatalog) {
    println!("\n--- By material ---");
    println!(
        "{:<18} {:>8} {:>14} {:>14} {:>9} {:>7}",
        "Material", "Readings", "Volume (L)", "Extract (kg)", "Avg f(A)", "Share"
    );
    for (material, total) in summary.materials_by_mass() {
        let share = if summary.total_kg > 0.0 {
            total.extract_kg / summary.total_kg * 100.0
        } else {
            0.0
        };
        let marker = if materials.is_empty_material(material) {
            " *"
        } else {
            ""
        };
        println!(
            "{:<18} {:>8} {:>14.2} {:>14.3} {:>9.4} {:>6.1}%{}",
            material,
            total.count,
            total.volume_l,
            total.extract_kg,
            average(total.fa_sum, total.count),
            share,
            marker
        );
    }
}

#[derive(Serialize)]
struct DailyEntry<'a> {
    day: NaiveDate,
    total_kg: f64,
    total_kg_excluding_empty: f64,
    readings: usize,
    by_material: &'a BTreeMap<String, MaterialTotal>,
    by_class: &'a BTreeMap<VesselClass, ClassTotal>,
}

/// Print the result of `daily`
pub fn output_daily(
    output_format: OutputFormat,
    days: &BTreeMap<NaiveDate, BatchSummary>,
    materials: &MaterialCatalog,
    exclude_empty: bool,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        let entries: Vec<DailyEntry> = days
            .iter()
            .map(|(day, summary)| DailyEntry {
                day: *day,
                total_kg: summary.total_kg,
                total_kg_excluding_empty: summary.total_excluding_empty(materials),
                readings: summary.reading_count,
                by_material: &summary.by_material,
                by_class: &summary.by_class,
            })
            .collect();
        return print_json(&entries);
    }

    println!("\nDaily Extract");
    println!("=============");
    if days.is_empty() {
        println!("No timestamped readings.");
        return Ok(());
    }

    println!(
        "{:<12} {:>8} {:>14}  Materials",
        "Day", "Readings", "Extract (kg)"
    );
    for (day, summary) in days {
        let total = if exclude_empty {
            summary.total_excluding_empty(materials)
        } else {
            summary.total_kg
        };
        let breakdown: Vec<String> = summary
            .materials_by_mass()
            .into_iter()
            .filter(|(name, _)| !exclude_empty || !materials.is_empty_material(name))
            .map(|(name, t)| format!("{} {:.1}", name, t.extract_kg))
            .collect();
        println!(
            "{:<12} {:>8} {:>14.3}  {}",
            day.format("%Y-%m-%d"),
            summary.reading_count,
            total,
            breakdown.join(", ")
        );
    }

    Ok(())
}

#[derive(Serialize)]
struct VariationReport<'a> {
    threshold_l: f64,
    stats: &'a VariationStats,
    variations: &'a [DailyVariation],
}

/// Print the result of `variations`
pub fn output_variations(
    output_format: OutputFormat,
    variations: &[DailyVariation],
    stats: &VariationStats,
    threshold_l: f64,
) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(&VariationReport {
            threshold_l,
            stats,
            variations,
        });
    }

    println!("\nDaily Variations (significant change: {:.0} L)", threshold_l);
    println!("==========================================");
    if variations.is_empty() {
        println!("No consecutive days to compare.");
        return Ok(());
    }

    println!(
        "{:<12} {:<8} {:<16} {:>10} {:>12} {:>12} {:>12}  Trend",
        "Day", "Vessel", "Material", "Δ Level", "Volume (L)", "Δ Volume", "Δ Extract"
    );
    for v in variations {
        println!(
            "{:<12} {:<8} {:<16} {:>10.2} {:>12.2} {:>12.2} {:>12.3}  {:?}",
            v.day.format("%Y-%m-%d"),
            v.vessel_id,
            v.material,
            v.delta_level,
            v.volume_curr_l,
            v.delta_volume_l,
            v.delta_kg,
            v.trend
        );
    }

    println!("\n--- Totals ---");
    println!("Variations:        {}", stats.count);
    println!("Net volume change: {:.2} L", stats.total_delta_volume_l);
    println!("Net extract change: {:.3} kg", stats.total_delta_kg);
    println!(
        "Largest increase:  {:.2} L / {:.3} kg",
        stats.max_increase_volume_l, stats.max_increase_kg
    );
    println!(
        "Largest decrease:  {:.2} L / {:.3} kg",
        stats.max_decrease_volume_l, stats.max_decrease_kg
    );

    Ok(())
}

#[derive(Serialize)]
struct FormulaPoint {
    plato: f64,
    fa_kg_per_hl: f64,
}

#[derive(Serialize)]
struct FormulaReport<'a> {
    formula: String,
    coefficients: &'a ExtractCorrelation,
    points: Vec<FormulaPoint>,
}

/// Print the correlation and its value at each Plato
pub fn output_formula(
    output_format: OutputFormat,
    correlation: &ExtractCorrelation,
    plato: &[f64],
) -> Result<()> {
    let points: Vec<FormulaPoint> = plato
        .iter()
        .map(|&p| FormulaPoint {
            plato: p,
            fa_kg_per_hl: correlation.kg_per_hl(p),
        })
        .collect();

    if output_format == OutputFormat::Json {
        return print_json(&FormulaReport {
            formula: correlation.formula(),
            coefficients: correlation,
            points,
        });
    }

    println!("\nExtract Formula");
    println!("===============");
    println!("{}", correlation.formula());
    println!("extract (kg) = volume (L) / 100 × f(A)");
    println!();
    println!("{:>8} {:>14}", "Plato", "f(A) kg/hL");
    for p in &points {
        println!("{:>8.2} {:>14.6}", p.plato, p.fa_kg_per_hl);
    }

    Ok(())
}

/// A registry entry with its capacity
#[derive(Serialize)]
pub struct VesselEntry<'a> {
    #[serde(flatten)]
    pub spec: &'a VesselSpec,
    pub top_level: f64,
    pub usable_capacity_l: f64,
}

/// Print the vessel registry
pub fn output_vessels(output_format: OutputFormat, vessels: &[VesselEntry]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(&vessels);
    }

    println!("\nVessel Registry ({} vessels)", vessels.len());
    println!("==============");
    println!(
        "{:<8} {:<5} {:<22} {:<5} {:>10} {:>10} {:>10} {:>14}",
        "Vessel", "Class", "Shape", "Unit", "Top", "Max", "Dead (L)", "Capacity (L)"
    );
    for v in vessels {
        println!(
            "{:<8} {:<5} {:<22} {:<5} {:>10.2} {:>10.2} {:>10.1} {:>14.2}",
            v.spec.id,
            v.spec.class.label(),
            v.spec.shape.name(),
            v.spec.level_unit.symbol(),
            v.top_level,
            v.spec.max_level(),
            v.spec.dead_volume_l,
            v.usable_capacity_l
        );
    }

    Ok(())
}
