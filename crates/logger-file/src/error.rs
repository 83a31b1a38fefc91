//! Errors building a rotation policy

/// Result type for rotation policy construction
pub type Result<T> = std::result::Result<T, Error>;

/// A rotation policy could not be built
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A policy parameter is out of range
    #[error("invalid rotation policy: {0}")]
    InvalidPolicy(String),
}
