//! Configuration management for cellar-extract
//!
//! Config stored at: ~/.config/cellar-extract/config.toml

use std::path::{Path, PathBuf};

use cellar_domain::{CalculationSettings, MaterialCatalog, MaterialSpec};
use cellar_types::{ConfigError, Error, OutputFormat, Result};
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Default output format (table, json)
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Path of the vessel registry used when `--vessels` is not given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vessels_file: Option<PathBuf>,

    /// Conventions applied to every reading
    #[serde(default)]
    pub calculation: CalculationSettings,

    /// Material code table
    #[serde(default = "default_materials")]
    pub materials: Vec<MaterialSpec>,
}

fn default_materials() -> Vec<MaterialSpec> {
    MaterialCatalog::default().materials
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            vessels_file: None,
            calculation: CalculationSettings::default(),
            materials: default_materials(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("cellar-extract");
        Ok(config_dir)
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load config from `path`, or from the default location
    ///
    /// An explicit path must exist. A missing default file yields the
    /// built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(Error::FileNotFound(explicit.display().to_string()));
                }
                explicit.to_path_buf()
            }
            None => {
                let default_path = Self::config_path()?;
                if !default_path.exists() {
                    return Ok(Config::default());
                }
                default_path
            }
        };

        let content = std::fs::read_to_string(&path)?;
        Self::load_from_str(&content)
    }

    /// Parse and validate a TOML config
    pub fn load_from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| {
            ConfigError::ParseError(format!("Failed to parse config TOML: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.calculation.validate()?;

        for (idx, material) in self.materials.iter().enumerate() {
            if material.code.trim().is_empty() || material.name.trim().is_empty() {
                return Err(ConfigError::InvalidSettings(format!(
                    "material #{} needs both a code and a name",
                    idx + 1
                ))
                .into());
            }
            if let Some(correlation) = &material.correlation {
                if !correlation.is_finite() {
                    return Err(ConfigError::InvalidSettings(format!(
                        "correlation for material {} must be finite",
                        material.name
                    ))
                    .into());
                }
            }
            if self.materials[..idx].iter().any(|m| m.code == material.code) {
                return Err(ConfigError::InvalidSettings(format!(
                    "material code {} is listed twice",
                    material.code
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Save config to `path`, or to the default location
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveError(e.to_string()).into())
    }

    /// Material catalog built from the configured table
    pub fn material_catalog(&self) -> MaterialCatalog {
        MaterialCatalog::new(self.materials.clone())
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let calc = &self.calculation;

        writeln!(f, "Cellar Extract Configuration")?;
        writeln!(f, "============================")?;
        writeln!(f)?;
        writeln!(f, "Output format:    {}", self.output_format)?;
        writeln!(
            f,
            "Vessels file:     {}",
            self.vessels_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(not set)".to_string())
        )?;
        writeln!(f, "Correlation:      {}", calc.correlation.formula())?;
        writeln!(f, "Plato range:      [{}, {}]", calc.plato_min, calc.plato_max)?;
        writeln!(
            f,
            "Rounding:         volume {} dp, mass {} dp",
            calc.volume_decimals, calc.mass_decimals
        )?;
        writeln!(f, "Level policy:     {:?}", calc.level_policy)?;
        writeln!(f, "Strict:           {}", calc.strict)?;
        writeln!(f, "Exclude empty:    {}", calc.exclude_empty_material)?;
        writeln!(f, "Significant diff: {} L", calc.significant_change_l)?;
        writeln!(f)?;
        writeln!(f, "Materials:")?;
        for material in &self.materials {
            let mut notes = Vec::new();
            if material.empty {
                notes.push("empty".to_string());
            }
            if material.correlation.is_some() {
                notes.push("own correlation".to_string());
            }
            if notes.is_empty() {
                writeln!(f, "  {:>4}  {}", material.code, material.name)?;
            } else {
                writeln!(
                    f,
                    "  {:>4}  {} ({})",
                    material.code,
                    material.name,
                    notes.join(", ")
                )?;
            }
        }

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:      {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellar_domain::LevelPolicy;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::load_from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.materials.len(), 11);
        assert_eq!(config.calculation.mass_decimals, 3);
    }

    #[test]
    fn test_partial_calculation_section() {
        let config = Config::load_from_str(
            r#"
output_format = "json"

[calculation]
level_policy = "clamp"
significant_change_l = 500.0
"#,
        )
        .unwrap();

        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.calculation.level_policy, LevelPolicy::Clamp);
        assert_eq!(config.calculation.significant_change_l, 500.0);
        assert_eq!(config.calculation.plato_max, 30.0);
    }

    #[test]
    fn test_custom_materials_replace_defaults() {
        let config = Config::load_from_str(
            r#"
[[materials]]
code = "7"
name = "lager"
aliases = ["lager", "bionda"]

[[materials]]
code = "0"
name = "empty"
empty = true

[[materials]]
code = "50"
name = "stout"
correlation = { a = 0.0, b = 0.0, c = 1.0, d = 0.0 }
"#,
        )
        .unwrap();

        let catalog = config.material_catalog();
        assert_eq!(catalog.normalize("7.0"), "lager");
        assert_eq!(catalog.normalize("Bionda chiara"), "lager");
        assert!(catalog.is_empty_material("empty"));
        assert_eq!(catalog.correlation_for("stout").unwrap().c, 1.0);
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let err = Config::load_from_str(
            r#"
[calculation]
plato_min = 20.0
plato_max = 10.0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("plato bounds"));
    }

    #[test]
    fn test_rejects_duplicate_material_code() {
        let err = Config::load_from_str(
            r#"
[[materials]]
code = "7"
name = "a"

[[materials]]
code = "7"
name = "b"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("listed twice"));
    }

    #[test]
    fn test_parse_error() {
        let err = Config::load_from_str("calculation = 3").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.calculation.strict = true;
        config.vessels_file = Some(PathBuf::from("/srv/cellar/vessels.toml"));

        let written = config.save(Some(&path)).unwrap();
        assert_eq!(written, path);

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
