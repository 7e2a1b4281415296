//! Error types for cellar-extract

use thiserror::Error;

/// Per-reading calculation errors
///
/// These are raised by the geometry resolver and the extract calculator for a
/// single reading. A batch collects them next to the successful results unless
/// strict mode is enabled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("Unknown vessel: {vessel_id}")]
    UnknownVessel { vessel_id: String },

    #[error("Level {level} out of range [0, {max_level}] for vessel {vessel_id}")]
    OutOfRange {
        vessel_id: String,
        level: f64,
        max_level: f64,
    },

    #[error("Plato {plato} outside [{min}, {max}] for vessel {vessel_id}")]
    InvalidGravity {
        vessel_id: String,
        plato: f64,
        min: f64,
        max: f64,
    },
}

impl ExtractError {
    /// Short machine-friendly kind label used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::UnknownVessel { .. } => "unknown_vessel",
            ExtractError::OutOfRange { .. } => "out_of_range",
            ExtractError::InvalidGravity { .. } => "invalid_gravity",
        }
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Invalid vessel {vessel_id}: {reason}")]
    InvalidVessel { vessel_id: String, reason: String },

    #[error("Duplicate vessel id: {0}")]
    DuplicateVessel(String),

    #[error("Invalid calculation settings: {0}")]
    InvalidSettings(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Calculation error: {0}")]
    Extract(#[from] ExtractError),

    #[error("CSV loader error: {0}")]
    CsvLoader(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Excel export error: {0}")]
    Excel(String),
}

pub type Result<T> = std::result::Result<T, Error>;
