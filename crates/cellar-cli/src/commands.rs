//! Command handlers

use std::path::{Path, PathBuf};

use cellar_domain::service::{
    daily_summaries, daily_variations, BatchOutcome, BatchProcessor, ReadingFilter,
    VariationStats, VesselGeometryResolver,
};
use cellar_domain::{
    CalculationSettings, LevelPolicy, MaterialCatalog, VesselCatalog, VesselClass, VesselRegistry,
};
use cellar_infra::export::{export_all, export_to_excel};
use cellar_infra::{load_readings, Config, TelemetryData, VesselRegistryLoader};
use cellar_types::{ConfigError, Error, OutputFormat, Result};
use tracing::{debug, info};

use crate::cli::{Cli, Commands, InputArgs};
use crate::output::{
    output_analysis, output_daily, output_formula, output_variations, output_vessels, VesselEntry,
};

const DEFAULT_FORMULA_POINTS: [f64; 6] = [0.0, 5.0, 10.0, 12.0, 15.0, 20.0];

/// Execute CLI command
pub fn execute(cli: Cli) -> Result<()> {
    // config --init/--reset must work before a config file exists
    if let Commands::Config { show, init, reset } = &cli.command {
        return cmd_config(cli.config.as_deref(), *show, *init, *reset);
    }

    let config = Config::load(cli.config.as_deref())?;
    let output_format = cli.format.unwrap_or(config.output_format);

    match &cli.command {
        Commands::Analyze {
            input,
            exclude_empty,
            export_dir,
            xlsx,
        } => cmd_analyze(
            &config,
            input,
            *exclude_empty,
            export_dir.as_deref(),
            xlsx.as_deref(),
            output_format,
        ),

        Commands::Daily {
            input,
            exclude_empty,
        } => cmd_daily(&config, input, *exclude_empty, output_format),

        Commands::Variations { input, threshold } => {
            cmd_variations(&config, input, *threshold, output_format)
        }

        Commands::Formula { plato } => cmd_formula(&config, plato, output_format),

        Commands::Vessels { vessels } => cmd_vessels(&config, vessels.as_deref(), output_format),

        Commands::Config { .. } => Ok(()),
    }
}

/// Everything a batch command needs, loaded from disk
struct BatchInputs {
    registry: VesselCatalog,
    materials: MaterialCatalog,
    settings: CalculationSettings,
    telemetry: TelemetryData,
    filter: ReadingFilter,
}

impl BatchInputs {
    fn load(config: &Config, input: &InputArgs) -> Result<Self> {
        if let (Some(from), Some(to)) = (input.from, input.to) {
            if from > to {
                return Err(ConfigError::InvalidSettings(format!(
                    "--from {} is after --to {}",
                    from, to
                ))
                .into());
            }
        }

        let mut settings = config.calculation.clone();
        if input.strict {
            settings.strict = true;
        }
        if input.clamp {
            settings.level_policy = LevelPolicy::Clamp;
        }

        let registry = load_registry(config, input.vessels.as_deref())?;
        let telemetry = load_readings(&input.readings)?;
        info!(
            readings = telemetry.readings.len(),
            vessels = telemetry.vessel_ids.len(),
            "telemetry loaded from {}",
            input.readings.display()
        );

        let mut filter = ReadingFilter::default().with_window(input.from, input.to);
        for (skip, class) in [
            (input.no_fst, VesselClass::Fst),
            (input.no_bbt, VesselClass::Bbt),
            (input.no_rbt, VesselClass::Rbt),
        ] {
            if skip {
                filter = filter.without_class(class);
            }
        }

        Ok(Self {
            registry,
            materials: config.material_catalog(),
            settings,
            telemetry,
            filter,
        })
    }

    fn run(&self) -> Result<BatchOutcome> {
        let processor = BatchProcessor::new(&self.registry, &self.materials, &self.settings);
        Ok(processor.run(&self.telemetry.readings, &self.filter)?)
    }
}

fn vessels_path(config: &Config, vessels: Option<&Path>) -> Result<PathBuf> {
    vessels
        .map(Path::to_path_buf)
        .or_else(|| config.vessels_file.clone())
        .ok_or_else(|| {
            ConfigError::InvalidSettings(
                "no vessel registry: pass --vessels or set vessels_file in the config".to_string(),
            )
            .into()
        })
}

fn load_registry(config: &Config, vessels: Option<&Path>) -> Result<VesselCatalog> {
    let path = vessels_path(config, vessels)?;
    let registry = VesselRegistryLoader::load_from_file(&path)?;
    if registry.is_empty() {
        return Err(Error::Config(ConfigError::InvalidVessel {
            vessel_id: "-".to_string(),
            reason: format!("{} defines no vessels", path.display()),
        }));
    }
    Ok(registry)
}

fn cmd_analyze(
    config: &Config,
    input: &InputArgs,
    exclude_empty: bool,
    export_dir: Option<&Path>,
    xlsx: Option<&Path>,
    output_format: OutputFormat,
) -> Result<()> {
    let inputs = BatchInputs::load(config, input)?;
    let outcome = inputs.run()?;
    let exclude_empty = exclude_empty || inputs.settings.exclude_empty_material;

    output_analysis(output_format, &outcome, &inputs.materials, exclude_empty)?;

    if export_dir.is_some() || xlsx.is_some() {
        let variations = daily_variations(&outcome.results, inputs.settings.significant_change_l);

        if let Some(dir) = export_dir {
            let written = export_all(dir, &outcome, &variations)?;
            for path in &written {
                eprintln!("Wrote {}", path.display());
            }
        }

        if let Some(path) = xlsx {
            let stats = VariationStats::from_variations(&variations);
            export_to_excel(&outcome, &inputs.materials, &stats, path)?;
            eprintln!("Wrote {}", path.display());
        }
    }

    Ok(())
}

fn cmd_daily(
    config: &Config,
    input: &InputArgs,
    exclude_empty: bool,
    output_format: OutputFormat,
) -> Result<()> {
    let inputs = BatchInputs::load(config, input)?;
    let outcome = inputs.run()?;
    let days = daily_summaries(&outcome.results);
    debug!(days = days.len(), "daily summaries built");

    output_daily(
        output_format,
        &days,
        &inputs.materials,
        exclude_empty || inputs.settings.exclude_empty_material,
    )
}

fn cmd_variations(
    config: &Config,
    input: &InputArgs,
    threshold: Option<f64>,
    output_format: OutputFormat,
) -> Result<()> {
    let threshold = threshold.unwrap_or(config.calculation.significant_change_l);
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ConfigError::InvalidSettings(format!(
            "threshold must be a non-negative number of liters, got {}",
            threshold
        ))
        .into());
    }

    let inputs = BatchInputs::load(config, input)?;
    let outcome = inputs.run()?;
    let variations = daily_variations(&outcome.results, threshold);
    let stats = VariationStats::from_variations(&variations);

    output_variations(output_format, &variations, &stats, threshold)
}

fn cmd_formula(config: &Config, plato: &[f64], output_format: OutputFormat) -> Result<()> {
    let points = if plato.is_empty() {
        &DEFAULT_FORMULA_POINTS[..]
    } else {
        plato
    };
    output_formula(output_format, &config.calculation.correlation, points)
}

fn cmd_vessels(config: &Config, vessels: Option<&Path>, output_format: OutputFormat) -> Result<()> {
    let registry = load_registry(config, vessels)?;
    let resolver = VesselGeometryResolver::new(&registry, &config.calculation);

    let mut entries = Vec::with_capacity(registry.count());
    for spec in registry.all_vessels() {
        let full = resolver.resolve(&spec.id, spec.max_level())?;
        entries.push(VesselEntry {
            spec,
            top_level: spec.top_level(),
            usable_capacity_l: full.volume_l,
        });
    }

    output_vessels(output_format, &entries)
}

fn cmd_config(path: Option<&Path>, show: bool, init: bool, reset: bool) -> Result<()> {
    if reset {
        let written = Config::default().save(path)?;
        println!("Configuration reset to defaults: {}", written.display());
        return Ok(());
    }

    if init {
        let target = match path {
            Some(p) => p.to_path_buf(),
            None => Config::config_path()?,
        };
        if target.exists() {
            return Err(ConfigError::SaveError(format!(
                "{} already exists (use --reset to overwrite)",
                target.display()
            ))
            .into());
        }
        let written = Config::default().save(Some(&target))?;
        println!("Configuration written: {}", written.display());
        if !show {
            return Ok(());
        }
    }

    let config = Config::load(path)?;
    println!("{}", config);
    Ok(())
}
