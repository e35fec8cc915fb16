//! Error types for `AeroRelay` core library.

use thiserror::Error;

/// Result type alias using `AeroRelay` Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `AeroRelay` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
