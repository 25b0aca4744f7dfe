//! Crate error types

use thiserror::Error;

/// Result alias for server-level operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop the server from starting or running
#[derive(Debug, Error)]
pub enum Error {
    /// Socket or other I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be turned into a runnable server
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
