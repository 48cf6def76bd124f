//! # Source Catalog
//!
//! Static list of institutional documentation sources. A source is pulled
//! into the results of any query that mentions one of its trigger keywords,
//! regardless of how the search API ranks it: institutional pages are
//! authoritative by policy.
//!
//! The catalog is loaded once at startup, from a TOML file or the built-in
//! list, and never mutated afterwards. A catalog that fails to load is a
//! startup error.

pub mod catalog;
pub mod error;

pub use catalog::{CatalogMatch, SourceCatalog, SourceCatalogEntry, normalize_text};
pub use error::{CatalogLoadError, Result};
