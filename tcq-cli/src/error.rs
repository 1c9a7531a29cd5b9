//! Error types for the CLI.

use crate::config::ConfigError;
use tcq_client::{ApiError, SearchExecutionError};
use tcq_core::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Search(#[from] SearchExecutionError),
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to initialize logging: {0}")]
    Telemetry(String),
}

impl CliError {
    /// Process exit code: 2 for bad input or configuration, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Config(_) | CliError::Validation(_) => 2,
            _ => 1,
        }
    }
}
