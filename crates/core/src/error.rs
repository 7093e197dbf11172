//! Error types for the core data model.

use thiserror::Error;

/// Core codec error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("invalid varint: {0}")]
    InvalidVarint(String),

    #[error("invalid node: {0}")]
    InvalidNode(String),

    #[error("unknown wire type: {0}")]
    UnknownWireType(u64),

    #[error("invalid record: {0}")]
    InvalidRecord(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
