//! # Retrieval Orchestrator
//!
//! Turns a user question into grounding context for an answer generator:
//!
//! - **Search**: ranked sources from the documentation search API merged
//!   with triggered institutional catalog sources
//! - **Extraction**: structured page content, cached on disk with a TTL
//! - **Context**: per-source outcomes plus an explicit "no sources found"
//!   state, renderable as numbered prompt sources
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Orchestrator                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  QueryContext ──► RetrievalEngine::search ──► [doc1 .. docN]    │
//! │                                                   │             │
//! │                     ┌─────────────┬───────────────┤ join_all    │
//! │                     ▼             ▼               ▼             │
//! │                  snippet    catalog summary  ContentExtractor   │
//! │                     │             │          (DocumentCache)    │
//! │                     └─────────────┴───────────────┤             │
//! │                                                   ▼             │
//! │                        AnswerContext { sources, contents }      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docground_retrieval::{Orchestrator, QueryContext, RetrievalConfig};
//!
//! let config = RetrievalConfig::load_or_default(None)?;
//! let orchestrator = Orchestrator::from_config(&config).await?;
//!
//! let context = QueryContext::from_settings(
//!     "How does UNC implement Copilot for research?",
//!     &config.defaults,
//!     &config.cache,
//!     orchestrator.catalog(),
//! );
//! let answer = orchestrator.answer_context(&context).await;
//! println!("{}", answer.render_prompt_context());
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod render;

pub use config::{
    CacheConfig, CatalogConfig, ExtractConfig, GenerationConfig, RequestDefaults,
    RetrievalConfig, SearchConfig,
};
pub use context::QueryContext;
pub use error::{Result, RetrievalError};
pub use orchestrator::{AnswerContext, AnswerStatus, ContentOutcome, Orchestrator, Provenance};
pub use render::{RenderLimits, render_prompt_context};

// Re-export from dependencies for convenience
pub use docground_catalog::{SourceCatalog, SourceCatalogEntry};
pub use docground_doc_cache::{CacheStats, DocumentCache, ExtractedContent};
pub use docground_extract::{ContentExtractor, ExtractionError};
pub use docground_search::{Origin, RetrievalEngine, RetrievedDocument, SearchApiError};
