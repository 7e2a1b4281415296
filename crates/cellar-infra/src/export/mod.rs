//! Report export

pub mod excel;
pub mod report_csv;

pub use excel::export_to_excel;
pub use report_csv::{
    export_all, write_detail_report, write_failure_report, write_material_report,
    write_variation_report, write_vessel_report,
};

/// Timestamp layout used in every report
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_timestamp(ts: Option<chrono::NaiveDateTime>) -> String {
    ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}
