//! Errors at the command line edge

use proven_log_service::ConfigError;
use thiserror::Error;

/// Why the server did not start.
///
/// The display text is what gets printed to stderr.
#[derive(Debug, Error)]
pub enum Error {
    /// No configuration file argument was given
    #[error("No configuration file specified")]
    MissingConfig,

    /// The configuration file could not be read or is invalid
    #[error("Reading configuration failed: {0}")]
    Config(#[from] ConfigError),

    /// The log destination could not be opened
    #[error("Failed to open output log file: {0}")]
    OpenLog(#[source] proven_log_service::Error),

    /// A tracing subscriber was already installed
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// A `log` logger was already installed
    #[error("failed to install log bridge: {0}")]
    LogBridge(#[from] log::SetLoggerError),

    /// Waiting for a termination signal failed
    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[source] std::io::Error),
}

/// Result type for the bootstrap
pub type Result<T> = std::result::Result<T, Error>;
