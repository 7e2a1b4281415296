//! Telemetry CSV loader for cellar vessel readings
//!
//! The cellar supervision system exports one row per timestamp and a group of
//! columns per vessel:
//!
//! Time, FST 1 Average Plato, FST 1 Level, FST 1 Material, BBT 3 Average Gravity, ...
//!
//! Files are UTF-8 (with or without BOM) or Windows-1252, comma or semicolon
//! separated, and may use European decimals.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use cellar_domain::Reading;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use encoding_rs::WINDOWS_1252;
use regex::RegexBuilder;
use thiserror::Error;
use tracing::{debug, warn};

const VESSEL_COLUMN_PATTERN: &str =
    r"^(FST|BBT|RBT)\s*[-_]?\s*(\d+)\s*(Average\s*(?:Plato|Gravity)|Level|Material)$";

const TIME_COLUMN: &str = "time";

#[derive(Error, Debug)]
pub enum CsvLoaderError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid header pattern: {0}")]
    PatternError(#[from] regex::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("No vessel gravity columns found in header")]
    NoVesselColumns,
}

impl From<CsvLoaderError> for cellar_types::Error {
    fn from(err: CsvLoaderError) -> Self {
        cellar_types::Error::CsvLoader(err.to_string())
    }
}

/// Readings extracted from one telemetry file
#[derive(Debug, Clone, Default)]
pub struct TelemetryData {
    pub readings: Vec<Reading>,
    /// Earliest and latest timestamp in the file
    pub time_range: Option<(NaiveDateTime, NaiveDateTime)>,
    /// Vessels that have a gravity column, in header order of first appearance
    pub vessel_ids: Vec<String>,
    /// Data rows read (header excluded)
    pub rows: usize,
}

#[derive(Debug, Default)]
struct VesselColumns {
    vessel_id: String,
    gravity: Option<usize>,
    level: Option<usize>,
    material: Option<usize>,
}

/// Load readings from a telemetry CSV file
pub fn load_readings<P: AsRef<Path>>(path: P) -> Result<TelemetryData, CsvLoaderError> {
    let mut file = File::open(path.as_ref())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let data = parse_readings(&bytes)?;
    debug!(
        path = %path.as_ref().display(),
        rows = data.rows,
        readings = data.readings.len(),
        "telemetry loaded"
    );
    Ok(data)
}

/// Parse readings from raw telemetry CSV bytes
pub fn parse_readings(bytes: &[u8]) -> Result<TelemetryData, CsvLoaderError> {
    let text = decode(bytes);
    let delimiter = detect_delimiter(text.lines().next().unwrap_or(""));

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let time_idx = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(TIME_COLUMN))
        .ok_or_else(|| CsvLoaderError::MissingColumn("Time".to_string()))?;
    let vessels = map_vessel_columns(&headers)?;
    if vessels.is_empty() {
        return Err(CsvLoaderError::NoVesselColumns);
    }

    let mut data = TelemetryData {
        vessel_ids: vessels.iter().map(|v| v.vessel_id.clone()).collect(),
        ..TelemetryData::default()
    };

    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let row_num = row_idx + 2; // header is row 1
        data.rows += 1;

        let time_cell = record.get(time_idx).unwrap_or("");
        let timestamp = parse_timestamp(time_cell);
        if timestamp.is_none() && !time_cell.is_empty() {
            warn!(row = row_num, value = time_cell, "unrecognized timestamp");
        }
        if let Some(ts) = timestamp {
            data.time_range = Some(match data.time_range {
                Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
                None => (ts, ts),
            });
        }

        for vessel in &vessels {
            let Some(plato) = cell(&record, vessel.gravity).and_then(parse_decimal) else {
                continue;
            };

            let level = match cell(&record, vessel.level) {
                Some(raw) => parse_decimal(raw).unwrap_or_else(|| {
                    warn!(row = row_num, vessel = %vessel.vessel_id, value = raw, "non-numeric level read as 0");
                    0.0
                }),
                None => 0.0,
            };
            let material = cell(&record, vessel.material).unwrap_or("");

            data.readings.push(Reading {
                vessel_id: vessel.vessel_id.clone(),
                timestamp,
                level,
                plato,
                material_code: material.to_string(),
            });
        }
    }

    Ok(data)
}

/// Non-empty cell content at an optional column
fn cell<'r>(record: &'r csv::StringRecord, idx: Option<usize>) -> Option<&'r str> {
    idx.and_then(|i| record.get(i)).filter(|s| !s.is_empty())
}

fn map_vessel_columns(headers: &csv::StringRecord) -> Result<Vec<VesselColumns>, CsvLoaderError> {
    let pattern = RegexBuilder::new(VESSEL_COLUMN_PATTERN)
        .case_insensitive(true)
        .build()?;

    let mut order: Vec<(String, u32)> = Vec::new();
    let mut groups: BTreeMap<(String, u32), VesselColumns> = BTreeMap::new();

    for (idx, header) in headers.iter().enumerate() {
        let Some(caps) = pattern.captures(header.trim()) else {
            continue;
        };
        let prefix = caps[1].to_ascii_uppercase();
        let Ok(number) = caps[2].parse::<u32>() else {
            continue;
        };
        let field = caps[3].to_ascii_lowercase();

        let key = (prefix.clone(), number);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        let group = groups.entry(key).or_insert_with(|| VesselColumns {
            vessel_id: format!("{}-{:02}", prefix, number),
            ..VesselColumns::default()
        });

        if field.starts_with("average") {
            group.gravity = Some(idx);
        } else if field == "level" {
            group.level = Some(idx);
        } else {
            group.material = Some(idx);
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .filter(|group| group.gravity.is_some())
        .collect())
}

fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            warn!("telemetry file is not valid UTF-8, decoding as Windows-1252");
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

fn detect_delimiter(header_line: &str) -> u8 {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Parse a decimal in plain or European notation
///
/// "12.5", "12,5", "1.234,56" and "1,234.56" are all accepted. The right-most
/// separator is taken as the decimal point.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let s: String = raw.trim().chars().filter(|c| !c.is_whitespace()).collect();
    if s.is_empty() {
        return None;
    }

    let normalized = match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        (Some(_), None) => s.replace(',', "."),
        _ => s,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a telemetry or command-line timestamp
///
/// Dates without a time are read as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: [&str; 7] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"];

    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ts);
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.naive_local());
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ts(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_decimal_variants() {
        assert_eq!(parse_decimal("12.5"), Some(12.5));
        assert_eq!(parse_decimal("12,5"), Some(12.5));
        assert_eq!(parse_decimal("1.234,56"), Some(1234.56));
        assert_eq!(parse_decimal("1,234.56"), Some(1234.56));
        assert_eq!(parse_decimal(" -3 "), Some(-3.0));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("n/a"), None);
        assert_eq!(parse_decimal("NaN"), None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = ts(2024, 3, 1, 6, 30);
        assert_eq!(parse_timestamp("2024-03-01 06:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 06:30"), Some(expected));
        assert_eq!(parse_timestamp("01/03/2024 06:30:00"), Some(expected));
        assert_eq!(parse_timestamp("01/03/2024 06:30"), Some(expected));
        assert_eq!(parse_timestamp("2024/03/01 06:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T06:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01"), Some(ts(2024, 3, 1, 0, 0)));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn test_wide_format() {
        let csv = "\
Time,FST 1 Average Plato,FST 1 Level,FST 1 Material,bbt2 average gravity,BBT2 Level,Ambient Temp
2024-03-01 06:00:00,12.0,3.0,7,10.5,45,18
2024-03-01 12:00:00,,3.1,7,10.4,,19
2024-03-02 06:00:00,11.8,2.9,7.0,n/a,40,17
";
        let data = parse_readings(csv.as_bytes()).unwrap();

        assert_eq!(data.rows, 3);
        assert_eq!(data.vessel_ids, vec!["FST-01", "BBT-02"]);
        assert_eq!(data.readings.len(), 4);

        let first = &data.readings[0];
        assert_eq!(first.vessel_id, "FST-01");
        assert_eq!(first.timestamp, Some(ts(2024, 3, 1, 6, 0)));
        assert_eq!(first.level, 3.0);
        assert_eq!(first.plato, 12.0);
        assert_eq!(first.material_code, "7");

        // empty level reads as zero, missing material column gives an empty code
        let bbt_noon = &data.readings[2];
        assert_eq!(bbt_noon.vessel_id, "BBT-02");
        assert_eq!(bbt_noon.level, 0.0);
        assert_eq!(bbt_noon.material_code, "");

        assert_eq!(
            data.time_range,
            Some((ts(2024, 3, 1, 6, 0), ts(2024, 3, 2, 6, 0)))
        );
    }

    #[test]
    fn test_semicolon_european_decimals() {
        let csv = "Time;FST 3 Average Plato;FST 3 Level;FST 3 Material\n\
                   01/03/2024 06:00;12,5;2,75;ichnusa\n";
        let data = parse_readings(csv.as_bytes()).unwrap();

        assert_eq!(data.readings.len(), 1);
        assert_eq!(data.readings[0].vessel_id, "FST-03");
        assert_eq!(data.readings[0].plato, 12.5);
        assert_eq!(data.readings[0].level, 2.75);
        assert_eq!(data.readings[0].material_code, "ichnusa");
    }

    #[test]
    fn test_bom_and_windows_1252() {
        let mut bytes = b"\xEF\xBB\xBFTime,RBT 1 Average Plato,RBT 1 Material\n".to_vec();
        bytes.extend_from_slice(b"2024-03-01 06:00:00,8.0,Recovered\n");
        let data = parse_readings(&bytes).unwrap();
        assert_eq!(data.readings.len(), 1);
        assert_eq!(data.readings[0].vessel_id, "RBT-01");

        // 0xE0 is "à" in Windows-1252 and invalid on its own in UTF-8
        let mut latin = b"Time,FST 1 Average Plato,FST 1 Material\n".to_vec();
        latin.extend_from_slice(b"2024-03-01 06:00:00,12.0,birra chiara \xE0\n");
        let data = parse_readings(&latin).unwrap();
        assert_eq!(data.readings[0].material_code, "birra chiara à");
    }

    #[test]
    fn test_missing_time_column() {
        let err = parse_readings(b"Stamp,FST 1 Average Plato\n2024-03-01,12\n").unwrap_err();
        assert!(matches!(err, CsvLoaderError::MissingColumn(_)));
    }

    #[test]
    fn test_no_vessel_columns() {
        let err = parse_readings(b"Time,FST 1 Level\n2024-03-01,2\n").unwrap_err();
        assert!(matches!(err, CsvLoaderError::NoVesselColumns));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Time,FST 1 Average Plato,FST 1 Level,FST 1 Material").unwrap();
        writeln!(file, "2024-03-01 06:00:00,12,3,7").unwrap();

        let data = load_readings(file.path()).unwrap();
        assert_eq!(data.readings.len(), 1);
        assert_eq!(data.readings[0].plato, 12.0);
    }
}
