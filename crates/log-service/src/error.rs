//! Error types for the log service

use std::path::PathBuf;

use proven_logger::SinkError;
use thiserror::Error;

/// Problems reading the logging configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("{}: {source}", path.display())]
    Io {
        /// The configuration file
        path: PathBuf,
        /// The underlying error
        source: std::io::Error,
    },

    /// The file is not valid TOML for a logging configuration
    #[error(transparent)]
    Parse(#[from] toml::de::Error),

    /// A value is out of bounds
    #[error("{0}")]
    Invalid(String),
}

/// Failures opening the log service
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration is unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The log destination could not be opened
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Result type for opening the log service
pub type Result<T> = std::result::Result<T, Error>;
