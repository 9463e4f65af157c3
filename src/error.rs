//! Error types for the outcome model

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors surfaced by ingestion, training and probability lookups
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// Nothing usable to train on or aggregate
    #[error("No data: {0}")]
    NoData(String),

    /// A rate file or model bundle has not been generated yet
    #[error("Artifact not found: {} (run `pa-model train` first)", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Training error: {0}")]
    Training(String),
}

impl ModelError {
    /// True when the error only means "not generated yet"
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::ArtifactNotFound(_))
    }
}
