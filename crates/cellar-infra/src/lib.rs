//! Infrastructure layer for cellar-extract
//!
//! Configuration files, the TOML vessel registry, the telemetry CSV loader
//! and report export.

pub mod config;
pub mod export;
pub mod telemetry_csv;
pub mod vessel_registry_loader;

pub use config::Config;
pub use telemetry_csv::{load_readings, parse_timestamp, CsvLoaderError, TelemetryData};
pub use vessel_registry_loader::VesselRegistryLoader;
