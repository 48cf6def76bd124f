//! Error types for the source catalog.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogLoadError>;

/// The catalog could not be loaded. Fatal at startup.
#[derive(Error, Debug)]
pub enum CatalogLoadError {
    /// Failed to read the catalog file.
    #[error("failed to read catalog: {0}")]
    Read(#[from] std::io::Error),

    /// The catalog is not valid TOML or does not match the schema.
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),

    /// An entry failed validation.
    #[error("invalid catalog entry #{index}: {reason}")]
    Invalid { index: usize, reason: String },

    /// Two entries share a URL.
    #[error("duplicate catalog url: {0}")]
    DuplicateUrl(String),
}
