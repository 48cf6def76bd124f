//! # Documentation Search
//!
//! Finds and ranks candidate sources for a user query.
//!
//! ## Features
//!
//! - **Search API**: pluggable [`SearchProvider`], with a reqwest-backed
//!   provider for the Microsoft Learn search endpoint
//! - **Query expansion**: configurable rules add product vocabulary to the
//!   upstream query, with a plain-query fallback when that fails
//! - **Catalog merge**: institutional sources triggered by keywords join the
//!   candidate set even when the API is down
//! - **Ranking**: a pure [`Scorer`] strategy; the default [`WeightedScorer`]
//!   combines term overlap, authority, title shape, intent and recency
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      RetrievalEngine                          │
//! ├───────────────────────────────────────────────────────────────┤
//! │  query ─► QueryExpander ─► SearchProvider ──┐                 │
//! │    │                          (fallback)    ├─► merge/dedup   │
//! │    └────► SourceCatalog::match_triggers ────┘        │        │
//! │                                                      ▼        │
//! │                          Scorer ─► stable sort ─► top n (1-5) │
//! └───────────────────────────────────────────────────────────────┘
//! ```

pub mod document;
pub mod engine;
pub mod error;
pub mod expand;
pub mod provider;
pub mod scorer;

pub use document::{Origin, RetrievedDocument};
pub use engine::{
    EngineOptions, MAX_API_TOP, MAX_SOURCES, RetrievalEngine, RetrievalEngineBuilder, SearchReport,
    clamp_source_count,
};
pub use error::{Result, SearchApiError};
pub use expand::{ExpansionRule, QueryExpander, default_rules};
pub use provider::{
    LearnSearchProvider, SearchApiConfig, SearchHit, SearchProvider, SearchRequest,
    parse_timestamp,
};
pub use scorer::{RankingConfig, Scorer, ScoringContext, WeightedScorer};
