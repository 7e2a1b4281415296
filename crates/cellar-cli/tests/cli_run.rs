//! End-to-end runs of the cellar-extract binary
//!
//! Each test writes a small vessel registry, a telemetry export and a config
//! file into a temp dir and checks the JSON written to stdout.

use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

const VESSELS: &str = r#"
[[vessels]]
id = "FST-01"
class = "FST"
shape = "cylinder"
diameter_m = 2.0
height_m = 4.0
dead_volume_l = 50.0

[[vessels]]
id = "BBT-02"
class = "BBT"
shape = "volumetric"
capacity_l = 20000.0
level_unit = "hl"
"#;

const READINGS: &str = "\
Time,FST 1 Average Plato,FST 1 Level,FST 1 Material,BBT 2 Average Plato,BBT 2 Level,BBT 2 Material,FST 9 Average Plato,FST 9 Level
2024-03-01 06:00:00,12.0,3.0,7,11.0,100,8,12.0,1.0
2024-03-02 06:00:00,12.0,2.0,7,0,0,0,,
";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vessels.toml"), VESSELS).unwrap();
        std::fs::write(dir.path().join("readings.csv"), READINGS).unwrap();
        std::fs::write(dir.path().join("config.toml"), "").unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_cellar-extract"))
            .args(args)
            .arg("--config")
            .arg(self.path("config.toml"))
            .env_remove("RUST_LOG")
            .output()
            .unwrap()
    }

    fn batch_args(&self, command: &str) -> Vec<String> {
        vec![
            command.to_string(),
            "--readings".to_string(),
            self.path("readings.csv").display().to_string(),
            "--vessels".to_string(),
            self.path("vessels.toml").display().to_string(),
            "--format".to_string(),
            "json".to_string(),
        ]
    }

    fn run_json(&self, args: &[String]) -> Value {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = self.run(&args);
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

fn approx(value: &Value, expected: f64) -> bool {
    value
        .as_f64()
        .map(|v| (v - expected).abs() < 1e-9)
        .unwrap_or(false)
}

#[test]
fn analyze_reports_totals_and_failures() {
    let fx = Fixture::new();
    let report = fx.run_json(&fx.batch_args("analyze"));

    // FST-01 day 1: 9374.78 L at 12 °P, day 2: 6233.19 L at 12 °P
    assert!(approx(&report["by_vessel"]["FST-01"]["count"], 2.0));
    assert!(approx(&report["by_material"]["ichnusa"]["count"], 2.0));
    assert!(approx(&report["by_class"]["BBT"]["count"], 2.0));
    assert_eq!(report["readings_processed"], 4);
    assert_eq!(report["readings_failed"], 1);
    assert_eq!(report["failures"][0]["kind"], "unknown_vessel");
    assert_eq!(report["failures"][0]["vessel_id"], "FST-09");

    let total = report["total_kg"].as_f64().unwrap();
    let without_empty = report["total_kg_excluding_empty"].as_f64().unwrap();
    assert!(total > 1177.328);
    // the drained BBT carries the "vuoto" material and zero extract
    assert!((total - without_empty).abs() < 1e-9);
    assert!(report["by_material"]["vuoto"].is_object());
}

#[test]
fn analyze_time_window_and_class_filter() {
    let fx = Fixture::new();
    let mut args = fx.batch_args("analyze");
    args.extend(
        ["--to", "2024-03-01", "--no-bbt"]
            .iter()
            .map(|s| s.to_string()),
    );
    let report = fx.run_json(&args);

    assert_eq!(report["readings_processed"], 1);
    assert!(approx(&report["total_kg"], 1177.328));
    assert_eq!(report["readings_skipped"], 3);
}

#[test]
fn strict_mode_fails_on_unknown_vessel() {
    let fx = Fixture::new();
    let mut args = fx.batch_args("analyze");
    args.push("--strict".to_string());
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let output = fx.run(&args);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("Unknown vessel"));
}

#[test]
fn analyze_exports_reports() {
    let fx = Fixture::new();
    let mut args = fx.batch_args("analyze");
    let export_dir = fx.path("out");
    let xlsx = fx.path("report.xlsx");
    args.extend([
        "--export-dir".to_string(),
        export_dir.display().to_string(),
        "--xlsx".to_string(),
        xlsx.display().to_string(),
    ]);
    fx.run_json(&args);

    for name in [
        "extract_by_vessel.csv",
        "extract_by_material.csv",
        "extract_details.csv",
        "daily_variations.csv",
        "failed_readings.csv",
    ] {
        assert!(export_dir.join(name).exists(), "missing {}", name);
    }
    assert!(xlsx.exists());
}

#[test]
fn daily_and_variations() {
    let fx = Fixture::new();

    let days = fx.run_json(&fx.batch_args("daily"));
    let days = days.as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["day"], "2024-03-01");

    let report = fx.run_json(&fx.batch_args("variations"));
    let variations = report["variations"].as_array().unwrap();
    assert_eq!(variations.len(), 2);
    for v in variations {
        assert_eq!(v["trend"], "decrease");
    }
    assert!(approx(&report["threshold_l"], 1000.0));
}

#[test]
fn formula_and_vessels() {
    let fx = Fixture::new();

    let output = fx.run(&["formula", "12", "--format", "json"]);
    assert!(output.status.success());
    let formula: Value = serde_json::from_slice(&output.stdout).unwrap();
    let fa = formula["points"][0]["fa_kg_per_hl"].as_f64().unwrap();
    assert!((fa - 12.5584631916).abs() < 1e-9);

    let vessels_path = fx.path("vessels.toml");
    let output = fx.run(&[
        "vessels",
        "--vessels",
        vessels_path.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert!(output.status.success());
    let vessels: Value = serde_json::from_slice(&output.stdout).unwrap();
    let vessels = vessels.as_array().unwrap();
    assert_eq!(vessels.len(), 2);
    assert_eq!(vessels[0]["id"], "FST-01");
    assert_eq!(vessels[0]["shape"], "cylinder");
    assert!(approx(&vessels[1]["usable_capacity_l"], 20000.0));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let fx = Fixture::new();
    let fresh = fx.path("fresh.toml");
    let fresh_str = fresh.to_str().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_cellar-extract"))
        .args(["config", "--init", "--config", fresh_str])
        .output()
        .unwrap();
    assert!(output.status.success());
    let written = std::fs::read_to_string(&fresh).unwrap();
    assert!(written.contains("[calculation]"));
    assert!(written.contains("[[materials]]"));

    let again = Command::new(env!("CARGO_BIN_EXE_cellar-extract"))
        .args(["config", "--init", "--config", fresh_str])
        .output()
        .unwrap();
    assert_eq!(again.status.code(), Some(1));
    assert!(fresh.exists());
}
