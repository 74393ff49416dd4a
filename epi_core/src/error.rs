//! Error types for the epi_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for epi_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Exposure-response model parameters are unusable
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Population and concentration sequences are not index-aligned
    #[error(
        "Length mismatch: {populations} population weights but {concentrations} concentrations"
    )]
    LengthMismatch {
        populations: usize,
        concentrations: usize,
    },

    /// Caller-supplied data is malformed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
