//! Error types for page extraction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// A single page could not be turned into content.
///
/// Failures are per document; callers record them next to the source
/// instead of aborting the batch.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionError {
    /// The fetch did not complete within the configured timeout.
    #[error("page fetch timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("page fetch returned HTTP {status}")]
    Status { status: u16 },

    /// Connection or protocol failure.
    #[error("page fetch failed: {message}")]
    Transport { message: String },

    /// The page parsed but yielded no paragraphs, lists, tables or code.
    /// Headings alone are not groundable content.
    #[error("page has no extractable content")]
    EmptyContent,

    /// The URL is not an absolute http(s) URL.
    #[error("invalid page URL: {url}")]
    InvalidUrl { url: String },

    /// The HTTP client could not be constructed.
    #[error("page client configuration error: {message}")]
    Client { message: String },
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::Status {
                status: status.as_u16(),
            }
        } else if err.is_builder() {
            Self::Client {
                message: err.to_string(),
            }
        } else {
            Self::Transport {
                message: err.to_string(),
            }
        }
    }
}
