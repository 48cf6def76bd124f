//! Query orchestration: one search, then one content resolution per source.

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use docground_catalog::SourceCatalog;
use docground_doc_cache::{DocumentCache, ExtractedContent};
use docground_extract::{ContentExtractor, ExtractionError, ExtractionSource, HttpPageFetcher};
use docground_search::{LearnSearchProvider, RetrievalEngine, RetrievedDocument};

use crate::config::RetrievalConfig;
use crate::context::QueryContext;
use crate::error::Result;

/// How a source's content was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Fetched and parsed for this request.
    Fetched,
    /// Served from the document cache.
    Cached,
    /// Stored summary of a catalog source.
    CatalogSummary,
    /// The search snippet only (full content extraction off).
    Snippet,
}

/// Per-source content result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContentOutcome {
    Extracted {
        content: ExtractedContent,
        provenance: Provenance,
    },
    Failed {
        error: ExtractionError,
    },
}

impl ContentOutcome {
    /// The content, if extraction succeeded.
    pub fn content(&self) -> Option<&ExtractedContent> {
        match self {
            Self::Extracted { content, .. } => Some(content),
            Self::Failed { .. } => None,
        }
    }

    /// The error, if extraction failed.
    pub fn error(&self) -> Option<&ExtractionError> {
        match self {
            Self::Extracted { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }
}

/// Overall grounding state of an answer context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnswerStatus {
    /// Neither the API nor the catalog produced a source.
    NoSourcesFound,
    /// At least one source has usable content.
    Grounded { usable: usize, failed: usize },
    /// Sources were found but none could be extracted.
    Ungrounded { failed: usize },
}

/// Sources and their contents, handed to the answer generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerContext {
    /// The query this context answers.
    pub query: String,

    /// Ranked sources.
    pub sources: Vec<RetrievedDocument>,

    /// Content per source URL, in rank order.
    pub contents: IndexMap<String, ContentOutcome>,

    /// Search API failure, when the API contributed nothing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_error: Option<String>,
}

impl AnswerContext {
    /// Grounding state.
    pub fn status(&self) -> AnswerStatus {
        if self.sources.is_empty() {
            return AnswerStatus::NoSourcesFound;
        }
        let usable = self.grounding_sources().count();
        let failed = self.sources.len() - usable;
        if usable == 0 {
            AnswerStatus::Ungrounded { failed }
        } else {
            AnswerStatus::Grounded { usable, failed }
        }
    }

    /// Sources with usable content, in rank order.
    pub fn grounding_sources(
        &self,
    ) -> impl Iterator<Item = (&RetrievedDocument, &ExtractedContent)> {
        self.sources.iter().filter_map(|doc| {
            self.contents
                .get(&doc.url)
                .and_then(ContentOutcome::content)
                .map(|content| (doc, content))
        })
    }

    /// Sources whose content could not be obtained, in rank order.
    pub fn failed_sources(&self) -> impl Iterator<Item = (&RetrievedDocument, &ExtractionError)> {
        self.sources.iter().filter_map(|doc| {
            self.contents
                .get(&doc.url)
                .and_then(ContentOutcome::error)
                .map(|error| (doc, error))
        })
    }
}

/// Ties the engine and the extractor together.
pub struct Orchestrator {
    engine: RetrievalEngine,
    extractor: ContentExtractor,
    catalog: Arc<SourceCatalog>,
    fetch_catalog_pages: bool,
}

impl Orchestrator {
    /// Create an orchestrator from its parts.
    pub fn new(engine: RetrievalEngine, extractor: ContentExtractor) -> Self {
        let catalog = engine.catalog().clone();
        Self {
            engine,
            extractor,
            catalog,
            fetch_catalog_pages: false,
        }
    }

    /// Fetch catalog pages instead of using their summaries.
    pub fn with_fetch_catalog_pages(mut self, enabled: bool) -> Self {
        self.fetch_catalog_pages = enabled;
        self
    }

    /// Build everything from configuration. Fails on an invalid catalog,
    /// an unusable cache directory, or HTTP client construction errors.
    pub async fn from_config(config: &RetrievalConfig) -> Result<Self> {
        config.validate()?;

        let catalog = config.catalog.load_catalog()?;
        info!("Loaded {} catalog sources", catalog.len());

        let provider = LearnSearchProvider::new(config.search.api.clone())?;
        let engine = RetrievalEngine::builder(Arc::new(provider))
            .with_catalog(Arc::new(catalog))
            .with_ranking(config.ranking.clone())
            .with_expander(config.search.expander())
            .with_category(config.search.api.category.clone())
            .with_overfetch_factor(config.search.api.overfetch_factor)
            .build();

        let fetcher = HttpPageFetcher::new(config.extract.timeout(), &config.extract.user_agent)?;
        let mut extractor =
            ContentExtractor::new(Arc::new(fetcher)).with_options(config.extract.parse_options());
        if config.cache.enabled {
            extractor = extractor.with_cache(open_cache(&config.cache.dir).await?);
        }

        Ok(Self::new(engine, extractor)
            .with_fetch_catalog_pages(config.catalog.fetch_catalog_pages))
    }

    pub fn engine(&self) -> &RetrievalEngine {
        &self.engine
    }

    pub fn extractor(&self) -> &ContentExtractor {
        &self.extractor
    }

    pub fn catalog(&self) -> &SourceCatalog {
        &self.catalog
    }

    /// Build the grounding context for a query.
    ///
    /// Never fails: a failed search yields fewer sources and a failed
    /// extraction is recorded against its source.
    pub async fn answer_context(&self, context: &QueryContext) -> AnswerContext {
        let report = self
            .engine
            .search_detailed(&context.raw_query, context.requested_sources)
            .await;

        let outcomes = join_all(
            report
                .documents
                .iter()
                .map(|doc| self.resolve_content(doc, context)),
        )
        .await;

        let contents: IndexMap<String, ContentOutcome> = report
            .documents
            .iter()
            .map(|doc| doc.url.clone())
            .zip(outcomes)
            .collect();

        let answer = AnswerContext {
            query: context.raw_query.clone(),
            sources: report.documents,
            contents,
            search_error: report.api_error.as_ref().map(ToString::to_string),
        };
        info!("Answer context ready: {:?}", answer.status());
        answer
    }

    async fn resolve_content(
        &self,
        doc: &RetrievedDocument,
        context: &QueryContext,
    ) -> ContentOutcome {
        if !context.extract_full_content {
            return text_outcome(doc, &doc.snippet, Provenance::Snippet);
        }

        if doc.is_catalog() && !self.fetch_catalog_pages {
            let summary = self
                .catalog
                .get(&doc.url)
                .and_then(|entry| entry.summary.as_deref());
            if let Some(summary) = summary {
                debug!("Using catalog summary for {}", doc.url);
                return text_outcome(doc, summary, Provenance::CatalogSummary);
            }
        }

        match self
            .extractor
            .extract_detailed(&doc.url, context.caching_enabled, context.cache_ttl_hours)
            .await
        {
            Ok((content, source)) => ContentOutcome::Extracted {
                content,
                provenance: match source {
                    ExtractionSource::Cache => Provenance::Cached,
                    ExtractionSource::Network => Provenance::Fetched,
                },
            },
            Err(error) => {
                warn!("Extraction failed for {}: {error}", doc.url);
                ContentOutcome::Failed { error }
            }
        }
    }
}

/// Open the document cache and evict whatever expired since the last run.
async fn open_cache(dir: &Path) -> Result<DocumentCache> {
    let cache = DocumentCache::new(dir).await?;
    match cache.purge_expired().await {
        Ok(removed) => debug!("Startup purge removed {removed} expired cache entries"),
        Err(e) => warn!("Startup cache purge failed: {e}"),
    }
    Ok(cache)
}

/// Content built from stored text. Text with no paragraphs is not grounding.
fn text_outcome(doc: &RetrievedDocument, text: &str, provenance: Provenance) -> ContentOutcome {
    let content = ExtractedContent::from_text(&doc.url, &doc.title, text);
    if content.is_empty() {
        debug!("No usable {provenance:?} text for {}", doc.url);
        return ContentOutcome::Failed {
            error: ExtractionError::EmptyContent,
        };
    }
    ContentOutcome::Extracted {
        content,
        provenance,
    }
}
