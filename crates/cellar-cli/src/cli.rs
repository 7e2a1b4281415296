//! CLI definition using clap

use std::path::PathBuf;

use cellar_infra::parse_timestamp;
use cellar_types::OutputFormat;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cellar-extract")]
#[command(version)]
#[command(about = "Extract mass estimation for brewery cellar vessels")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.config/cellar-extract/config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

/// Inputs shared by the batch commands
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Telemetry CSV export
    #[arg(long, short = 'r')]
    pub readings: PathBuf,

    /// Vessel registry TOML. Uses config `vessels_file` if not specified.
    #[arg(long)]
    pub vessels: Option<PathBuf>,

    /// Keep readings at or after this time (e.g. "2024-03-01 06:00")
    #[arg(long, value_parser = parse_from_arg)]
    pub from: Option<NaiveDateTime>,

    /// Keep readings at or before this time; a bare date means end of day
    #[arg(long, value_parser = parse_to_arg)]
    pub to: Option<NaiveDateTime>,

    /// Leave out fermentation tanks
    #[arg(long)]
    pub no_fst: bool,

    /// Leave out bright beer tanks
    #[arg(long)]
    pub no_bbt: bool,

    /// Leave out recovered beer tanks
    #[arg(long)]
    pub no_rbt: bool,

    /// Stop at the first reading that cannot be converted
    #[arg(long)]
    pub strict: bool,

    /// Clamp out-of-range levels instead of rejecting them
    #[arg(long)]
    pub clamp: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute extract mass for every reading and aggregate it
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Leave the empty-vessel material out of the grand total
        #[arg(long)]
        exclude_empty: bool,

        /// Write CSV reports into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Write an Excel workbook to this path
        #[arg(long)]
        xlsx: Option<PathBuf>,
    },

    /// Totals per calendar day
    Daily {
        #[command(flatten)]
        input: InputArgs,

        /// Leave the empty-vessel material out of the daily totals
        #[arg(long)]
        exclude_empty: bool,
    },

    /// Day-over-day changes per vessel
    Variations {
        #[command(flatten)]
        input: InputArgs,

        /// Volume change in liters flagged as significant. Uses config value if not specified.
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Show the Plato correlation and evaluate it
    Formula {
        /// Plato values to evaluate
        plato: Vec<f64>,
    },

    /// List the vessel registry
    Vessels {
        /// Vessel registry TOML. Uses config `vessels_file` if not specified.
        #[arg(long)]
        vessels: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Write a default configuration file if none exists
        #[arg(long)]
        init: bool,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}

fn parse_from_arg(s: &str) -> Result<NaiveDateTime, String> {
    parse_timestamp(s).ok_or_else(|| format!("unrecognized date/time '{}'", s))
}

fn parse_to_arg(s: &str) -> Result<NaiveDateTime, String> {
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s.trim(), fmt) {
            if let Some(end) = date.and_hms_opt(23, 59, 59) {
                return Ok(end);
            }
        }
    }
    parse_from_arg(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_args() {
        let cli = Cli::try_parse_from([
            "cellar-extract",
            "analyze",
            "--readings",
            "data.csv",
            "--vessels",
            "vessels.toml",
            "--from",
            "2024-03-01 06:00",
            "--to",
            "2024-03-02",
            "--no-rbt",
            "--strict",
            "--exclude-empty",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Analyze {
                input,
                exclude_empty,
                export_dir,
                xlsx,
            } => {
                assert_eq!(input.readings, PathBuf::from("data.csv"));
                assert_eq!(input.vessels, Some(PathBuf::from("vessels.toml")));
                assert_eq!(
                    input.from,
                    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(6, 0, 0)
                );
                assert_eq!(
                    input.to,
                    NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(23, 59, 59)
                );
                assert!(input.no_rbt && !input.no_fst && !input.no_bbt);
                assert!(input.strict);
                assert!(!input.clamp);
                assert!(exclude_empty);
                assert!(export_dir.is_none());
                assert!(xlsx.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_timestamp_rejected() {
        let err = Cli::try_parse_from([
            "cellar-extract",
            "daily",
            "--readings",
            "data.csv",
            "--from",
            "last tuesday",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("unrecognized date/time"));
    }

    #[test]
    fn test_readings_required() {
        assert!(Cli::try_parse_from(["cellar-extract", "variations"]).is_err());
    }

    #[test]
    fn test_formula_values_and_global_flags() {
        let cli =
            Cli::try_parse_from(["cellar-extract", "formula", "12", "15.5", "-v", "-c", "x.toml"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        match cli.command {
            Commands::Formula { plato } => assert_eq!(plato, vec![12.0, 15.5]),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_config_flags() {
        let cli = Cli::try_parse_from(["cellar-extract", "config", "--init"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                show: false,
                init: true,
                reset: false
            }
        ));
    }
}
