//! Error types for the regimen_core library.
//!
//! The reconstruction, timeline and comparison functions are total and never
//! return these; they cover ledger mutation, persistence, config and export.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for regimen_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
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

    /// A ledger mutation was rejected
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
