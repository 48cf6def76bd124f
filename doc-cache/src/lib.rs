//! # Document Cache
//!
//! Durable, file-backed cache of extracted documentation pages.
//!
//! ## Features
//!
//! - **TTL expiry**: entries are valid for a per-entry number of hours and
//!   read as absent afterwards
//! - **Atomic writes**: temp file + rename per fingerprint
//! - **Lazy eviction**: expired or corrupt records are removed by the read
//!   that finds them
//! - **Maintenance**: explicit purge, purge-expired, clear and statistics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Document Cache                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  (url, mode) ──► Fingerprint ──► <cache_dir>/<fp>.json          │
//! │                                        │                        │
//! │                                        ▼                        │
//! │                 CacheEntry { ExtractedContent, fetched_at, ttl } │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod content;
pub mod error;
pub mod fingerprint;

pub use cache::{CacheEntry, CacheStats, DocumentCache};
pub use content::{Block, ExtractedContent, Heading, Section};
pub use error::{CacheError, Result};
pub use fingerprint::Fingerprint;

/// Default time-to-live for cached pages, in hours.
pub const DEFAULT_TTL_HOURS: u32 = 24;
