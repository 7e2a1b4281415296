//! Vessel registry loader from TOML
//!
//! ```toml
//! [[vessels]]
//! id = "FST-01"
//! class = "FST"
//! shape = "cylinder"
//! diameter_m = 2.0
//! height_m = 4.0
//! level_unit = "m"
//! dead_volume_l = 50.0
//! ```

use std::fs;
use std::path::Path;

use cellar_domain::{VesselCatalog, VesselRegistry, VesselSpec};
use cellar_types::{ConfigError, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Container for parsing vessels.toml
#[derive(Debug, Serialize, Deserialize)]
struct VesselRegistryFile {
    #[serde(default)]
    vessels: Vec<VesselSpec>,
}

/// Reads and writes the vessel registry file
pub struct VesselRegistryLoader;

impl VesselRegistryLoader {
    /// Load and validate a vessel registry from a TOML file
    pub fn load_from_file(path: &Path) -> Result<VesselCatalog> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(ConfigError::ParseError(format!(
                "Failed to read vessel registry file: {}",
                e
            )))
        })?;

        let catalog = Self::load_from_str(&content)?;
        debug!(path = %path.display(), vessels = catalog.count(), "vessel registry loaded");
        Ok(catalog)
    }

    /// Load and validate a vessel registry from a TOML string
    pub fn load_from_str(toml_content: &str) -> Result<VesselCatalog> {
        let file: VesselRegistryFile = toml::from_str(toml_content).map_err(|e| {
            Error::Config(ConfigError::ParseError(format!(
                "Failed to parse vessel registry TOML: {}",
                e
            )))
        })?;

        Ok(VesselCatalog::from_specs(file.vessels)?)
    }

    /// Serialize vessel specs back to registry TOML
    pub fn to_toml(vessels: &[VesselSpec]) -> Result<String> {
        let file = VesselRegistryFile {
            vessels: vessels.to_vec(),
        };
        toml::to_string_pretty(&file)
            .map_err(|e| Error::Config(ConfigError::SaveError(e.to_string())))
    }
}
