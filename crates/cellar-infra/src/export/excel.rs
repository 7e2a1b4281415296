//! Excel export functionality

use std::path::Path;

use cellar_domain::service::{BatchOutcome, VariationStats};
use cellar_domain::MaterialCatalog;
use cellar_types::{Error, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::format_timestamp;

fn xlsx_err(e: XlsxError) -> Error {
    Error::Excel(e.to_string())
}

/// Export batch results to an Excel workbook
///
/// Sheets: Summary, Vessels, Materials, Details.
pub fn export_to_excel(
    outcome: &BatchOutcome,
    materials: &MaterialCatalog,
    stats: &VariationStats,
    output_path: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();

    let summary_sheet = workbook.add_worksheet();
    write_summary_sheet(summary_sheet, outcome, materials, stats)?;

    let vessels_sheet = workbook.add_worksheet();
    write_vessels_sheet(vessels_sheet, outcome)?;

    let materials_sheet = workbook.add_worksheet();
    write_materials_sheet(materials_sheet, outcome)?;

    let details_sheet = workbook.add_worksheet();
    write_details_sheet(details_sheet, outcome)?;

    workbook.save(output_path).map_err(xlsx_err)?;

    Ok(())
}

fn write_header_row(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    let header_format = Format::new().set_bold();
    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *header, &header_format)
            .map_err(xlsx_err)?;
    }
    Ok(())
}

fn write_summary_sheet(
    sheet: &mut Worksheet,
    outcome: &BatchOutcome,
    materials: &MaterialCatalog,
    stats: &VariationStats,
) -> Result<()> {
    sheet.set_name("Summary").map_err(xlsx_err)?;

    let title_format = Format::new().set_bold();
    sheet
        .write_string_with_format(0, 0, "Cellar Extract Report", &title_format)
        .map_err(xlsx_err)?;

    let summary = &outcome.summary;
    let first = outcome.results.iter().filter_map(|r| r.timestamp).min();
    let last = outcome.results.iter().filter_map(|r| r.timestamp).max();

    let rows: [(&str, f64); 6] = [
        ("Readings processed", summary.reading_count as f64),
        ("Readings failed", outcome.failures.len() as f64),
        ("Readings filtered out", outcome.skipped as f64),
        ("Total extract (kg)", summary.total_kg),
        (
            "Total extract without empty (kg)",
            summary.total_excluding_empty(materials),
        ),
        ("Day-over-day variations", stats.count as f64),
    ];

    sheet.write_string(2, 0, "Period from").map_err(xlsx_err)?;
    sheet
        .write_string(2, 1, format_timestamp(first))
        .map_err(xlsx_err)?;
    sheet.write_string(3, 0, "Period to").map_err(xlsx_err)?;
    sheet
        .write_string(3, 1, format_timestamp(last))
        .map_err(xlsx_err)?;

    let mut row = 5;
    for (label, value) in rows {
        sheet.write_string(row, 0, label).map_err(xlsx_err)?;
        sheet.write_number(row, 1, value).map_err(xlsx_err)?;
        row += 1;
    }

    row += 1;
    sheet
        .write_string_with_format(row, 0, "By vessel class", &title_format)
        .map_err(xlsx_err)?;
    row += 1;
    for (class, total) in &summary.by_class {
        sheet.write_string(row, 0, class.label()).map_err(xlsx_err)?;
        sheet.write_number(row, 1, total.extract_kg).map_err(xlsx_err)?;
        sheet.write_number(row, 2, total.volume_l).map_err(xlsx_err)?;
        sheet
            .write_number(row, 3, total.count as f64)
            .map_err(xlsx_err)?;
        row += 1;
    }

    Ok(())
}

fn write_vessels_sheet(sheet: &mut Worksheet, outcome: &BatchOutcome) -> Result<()> {
    sheet.set_name("Vessels").map_err(xlsx_err)?;
    write_header_row(
        sheet,
        &[
            "Vessel",
            "Class",
            "Readings",
            "Extract (kg)",
            "Last Reading",
            "Last Material",
            "Last Plato",
            "Last Volume (L)",
        ],
    )?;

    for (idx, (vessel, total)) in outcome.summary.vessels_by_mass().into_iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, vessel.as_str()).map_err(xlsx_err)?;
        sheet
            .write_string(row, 1, total.vessel_class.label())
            .map_err(xlsx_err)?;
        sheet
            .write_number(row, 2, total.count as f64)
            .map_err(xlsx_err)?;
        sheet.write_number(row, 3, total.extract_kg).map_err(xlsx_err)?;

        if let Some(last) = &total.last {
            sheet
                .write_string(row, 4, format_timestamp(last.timestamp))
                .map_err(xlsx_err)?;
            sheet
                .write_string(row, 5, last.material.as_str())
                .map_err(xlsx_err)?;
            sheet.write_number(row, 6, last.plato).map_err(xlsx_err)?;
            sheet.write_number(row, 7, last.volume_l).map_err(xlsx_err)?;
        }
    }

    Ok(())
}

fn write_materials_sheet(sheet: &mut Worksheet, outcome: &BatchOutcome) -> Result<()> {
    sheet.set_name("Materials").map_err(xlsx_err)?;
    write_header_row(
        sheet,
        &["Material", "Readings", "Volume (L)", "Extract (kg)", "Share %"],
    )?;

    let total_kg = outcome.summary.total_kg;
    for (idx, (material, total)) in outcome.summary.materials_by_mass().into_iter().enumerate() {
        let row = (idx + 1) as u32;
        let share = if total_kg > 0.0 {
            total.extract_kg / total_kg * 100.0
        } else {
            0.0
        };
        sheet.write_string(row, 0, material.as_str()).map_err(xlsx_err)?;
        sheet
            .write_number(row, 1, total.count as f64)
            .map_err(xlsx_err)?;
        sheet.write_number(row, 2, total.volume_l).map_err(xlsx_err)?;
        sheet.write_number(row, 3, total.extract_kg).map_err(xlsx_err)?;
        sheet.write_number(row, 4, share).map_err(xlsx_err)?;
    }

    Ok(())
}

fn write_details_sheet(sheet: &mut Worksheet, outcome: &BatchOutcome) -> Result<()> {
    sheet.set_name("Details").map_err(xlsx_err)?;
    write_header_row(
        sheet,
        &[
            "Time",
            "Vessel",
            "Material",
            "Level",
            "Volume (L)",
            "Plato",
            "f(A) (kg/hL)",
            "Extract (kg)",
        ],
    )?;

    for (idx, result) in outcome.results.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet
            .write_string(row, 0, format_timestamp(result.timestamp))
            .map_err(xlsx_err)?;
        sheet
            .write_string(row, 1, result.vessel_id.as_str())
            .map_err(xlsx_err)?;
        sheet
            .write_string(row, 2, result.material.as_str())
            .map_err(xlsx_err)?;
        sheet.write_number(row, 3, result.level).map_err(xlsx_err)?;
        sheet.write_number(row, 4, result.volume_l).map_err(xlsx_err)?;
        sheet.write_number(row, 5, result.plato).map_err(xlsx_err)?;
        sheet
            .write_number(row, 6, result.fa_kg_per_hl)
            .map_err(xlsx_err)?;
        sheet.write_number(row, 7, result.extract_kg).map_err(xlsx_err)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellar_domain::service::{BatchProcessor, ReadingFilter};
    use cellar_domain::{
        CalculationSettings, LevelUnit, Reading, VesselCatalog, VesselClass, VesselShape,
        VesselSpec,
    };

    #[test]
    fn test_export_to_excel() {
        let registry = VesselCatalog::from_specs(vec![VesselSpec {
            id: "BBT-01".to_string(),
            class: VesselClass::Bbt,
            shape: VesselShape::Volumetric { capacity_l: 20000.0 },
            level_unit: LevelUnit::Hl,
            max_level: None,
            level_offset: 0.0,
            dead_volume_l: 0.0,
        }])
        .unwrap();
        let materials = MaterialCatalog::default();
        let processor = BatchProcessor::new(&registry, &materials, &CalculationSettings::default());
        let outcome = processor
            .run(
                &[
                    Reading::new("BBT-01", 100.0, 11.0, "8"),
                    Reading::new("BBT-02", 100.0, 11.0, "8"),
                ],
                &ReadingFilter::default(),
            )
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");
        export_to_excel(&outcome, &materials, &VariationStats::default(), &path).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }
}
