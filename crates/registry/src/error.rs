//! Registry error types.

use thiserror::Error;

/// Errors from tag verification and entry persistence.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid public key: {0}")]
    InvalidKey(String),

    #[error("invalid entry: {0}")]
    InvalidEntry(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Core(#[from] cairn_core::Error),
}

/// Result type for registry operations.
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
