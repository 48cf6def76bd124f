//! Error types for the document cache.

use thiserror::Error;

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Storage failures of the document cache.
///
/// Callers treat every variant as recoverable: a failed write means the next
/// lookup misses and the page is fetched again.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Failed to create the cache directory.
    #[error("failed to create cache directory: {0}")]
    CreateDirectory(String),

    /// Failed to read a cache record or list the cache directory.
    #[error("failed to read cache record: {0}")]
    ReadFile(String),

    /// Failed to write or replace a cache record.
    #[error("failed to write cache record: {0}")]
    WriteFile(String),

    /// Failed to delete a cache record.
    #[error("failed to delete cache record: {0}")]
    DeleteFile(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The fingerprint is not a well-formed cache key.
    #[error("invalid fingerprint: {0}")]
    InvalidFingerprint(String),
}
