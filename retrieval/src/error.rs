//! Error types for the orchestrator.

use thiserror::Error;

/// Result type alias for orchestrator setup.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Startup failures. Per-request problems never surface here; they are
/// recorded in the [`AnswerContext`](crate::AnswerContext).
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Configuration could not be read or is out of range.
    #[error("configuration error: {0}")]
    Config(String),

    /// The source catalog is malformed.
    #[error("catalog error: {0}")]
    Catalog(#[from] docground_catalog::CatalogLoadError),

    /// The cache directory could not be opened.
    #[error("cache error: {0}")]
    Cache(#[from] docground_doc_cache::CacheError),

    /// The search client could not be built.
    #[error("search client error: {0}")]
    Search(#[from] docground_search::SearchApiError),

    /// The page client could not be built.
    #[error("page client error: {0}")]
    Extraction(#[from] docground_extract::ExtractionError),
}
