//! Store error types.

use thiserror::Error;

/// Errors from datastores, the object store and DAG traversal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("path out of range: selector {selector} of {links} links")]
    PathOutOfRange { selector: u64, links: usize },

    #[error("not a DAG node: {0}")]
    NotADag(String),

    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] cairn_core::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
