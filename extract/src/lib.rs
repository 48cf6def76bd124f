//! # Content Extraction
//!
//! Turns documentation pages into [`ExtractedContent`]: an outline of
//! sections holding paragraphs, lists, tables and code blocks.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                     ContentExtractor                       │
//! ├────────────────────────────────────────────────────────────┤
//! │  url ─► DocumentCache::get ──hit──────────────────► content│
//! │             │ miss                                         │
//! │             ▼                                              │
//! │        PageFetcher ─► parse_html ─► DocumentCache::put ─►  │
//! └────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod parser;

pub use docground_doc_cache::ExtractedContent;
pub use error::{ExtractionError, Result};
pub use extractor::{ContentExtractor, ExtractionSource, FULL_MODE};
pub use fetcher::{FetchedPage, HttpPageFetcher, PageFetcher, validate_url};
pub use parser::{ParseOptions, parse_html};
