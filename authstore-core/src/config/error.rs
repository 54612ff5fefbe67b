//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cannot encode configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// An environment variable held an unusable value
    #[error("{var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationFailed(String),
}
