//! Error types for the documentation search API.

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchApiError>;

/// A call to the documentation search API failed.
///
/// The engine recovers from every variant by continuing with zero API
/// results; catalog matches can still satisfy the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchApiError {
    /// The request did not complete within the configured timeout.
    #[error("search request timed out")]
    Timeout,

    /// The API answered with a non-success status.
    #[error("search API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection or protocol failure.
    #[error("search request failed: {0}")]
    Transport(String),

    /// The response body was not the expected JSON.
    #[error("invalid search response: {0}")]
    Decode(String),

    /// The HTTP client could not be constructed.
    #[error("search client configuration error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for SearchApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else if err.is_builder() {
            Self::Client(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
