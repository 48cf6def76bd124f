//! Retrieval-and-ranking engine.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::sync::Arc;

use ordered_float::OrderedFloat;
use tracing::{debug, info, warn};

use docground_catalog::SourceCatalog;
use docground_utils_clock::SharedClock;
use docground_utils_url::normalize_url;

use crate::document::RetrievedDocument;
use crate::error::SearchApiError;
use crate::expand::QueryExpander;
use crate::provider::{SearchHit, SearchProvider, SearchRequest};
use crate::scorer::{RankingConfig, Scorer, ScoringContext, WeightedScorer};

/// Upper bound on sources returned for one query.
pub const MAX_SOURCES: usize = 5;

/// Clamp a requested source count to `1..=MAX_SOURCES`.
pub fn clamp_source_count(requested: usize) -> usize {
    requested.clamp(1, MAX_SOURCES)
}

/// Upper bound on results requested from the API in one call.
pub const MAX_API_TOP: usize = 50;

/// Engine tuning that is not part of the scoring strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    /// Results requested from the API per desired source.
    pub overfetch_factor: usize,

    /// Category filter for the primary query.
    pub category: Option<String>,

    /// Minimum query term length passed to the scoring context.
    pub min_term_chars: usize,

    /// API candidates scoring below this are dropped.
    pub min_api_score: Option<f64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            overfetch_factor: 3,
            category: Some("Documentation".to_string()),
            min_term_chars: RankingConfig::default().min_term_chars,
            min_api_score: None,
        }
    }
}

/// Outcome of one search, including what happened upstream.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    /// Ranked documents, at most the clamped desired count.
    pub documents: Vec<RetrievedDocument>,

    /// Hits returned by the API before merging.
    pub api_hits: usize,

    /// Catalog entries triggered by the query.
    pub catalog_matches: usize,

    /// Last API error, if the API produced no answer.
    pub api_error: Option<SearchApiError>,

    /// Whether the unexpanded fallback query was issued.
    pub fallback_used: bool,
}

/// Merges search API results with triggered catalog sources and ranks them.
pub struct RetrievalEngine {
    provider: Arc<dyn SearchProvider>,
    catalog: Arc<SourceCatalog>,
    scorer: Arc<dyn Scorer>,
    expander: QueryExpander,
    clock: SharedClock,
    options: EngineOptions,
}

impl RetrievalEngine {
    /// Create a builder around a search provider.
    pub fn builder(provider: Arc<dyn SearchProvider>) -> RetrievalEngineBuilder {
        RetrievalEngineBuilder::new(provider)
    }

    /// The catalog consulted for trigger matches.
    pub fn catalog(&self) -> &Arc<SourceCatalog> {
        &self.catalog
    }

    /// Ranked sources for `query`, at most `desired` (clamped to 1..=5).
    ///
    /// Never fails: an unavailable API leaves only catalog sources, and an
    /// empty result is a valid answer.
    pub async fn search(&self, query: &str, desired: usize) -> Vec<RetrievedDocument> {
        self.search_detailed(query, desired).await.documents
    }

    /// Like [`search`](Self::search) but also reports upstream status.
    pub async fn search_detailed(&self, query: &str, desired: usize) -> SearchReport {
        let desired = clamp_source_count(desired);
        let api = self.query_api(query, desired).await;
        let matches = self.catalog.match_triggers(query);
        let catalog_matches = matches.len();
        let api_hits = api.hits.len();

        let catalog_urls: HashSet<String> = matches
            .iter()
            .map(|m| normalize_url(&m.entry.url))
            .collect();
        let mut seen = HashSet::new();
        let mut candidates: Vec<RetrievedDocument> = Vec::with_capacity(api_hits + catalog_matches);

        for hit in api.hits {
            let key = normalize_url(&hit.url);
            if catalog_urls.contains(&key) || !seen.insert(key) {
                continue;
            }
            candidates.push(hit.into());
        }
        for matched in matches {
            if seen.insert(normalize_url(&matched.entry.url)) {
                candidates.push(matched.into());
            }
        }

        let context = ScoringContext::new(query, self.options.min_term_chars, self.clock.now());
        for doc in &mut candidates {
            doc.relevance_score = self.scorer.score(doc, &context);
        }
        if let Some(min) = self.options.min_api_score {
            candidates.retain(|doc| doc.is_catalog() || doc.relevance_score >= min);
        }

        // Stable: equal scores keep discovery order, API before catalog.
        candidates.sort_by_key(|doc| Reverse(OrderedFloat(doc.relevance_score)));
        candidates.truncate(desired);

        for doc in &candidates {
            debug!(
                "Ranked {:?} {} ({:.1})",
                doc.origin, doc.url, doc.relevance_score
            );
        }
        info!(
            "Selected {} sources ({} API hits, {} catalog matches)",
            candidates.len(),
            api_hits,
            catalog_matches
        );

        SearchReport {
            documents: candidates,
            api_hits,
            catalog_matches,
            api_error: api.error,
            fallback_used: api.fallback_used,
        }
    }

    async fn query_api(&self, query: &str, desired: usize) -> ApiOutcome {
        let raw = query.trim();
        if raw.is_empty() {
            return ApiOutcome::default();
        }

        let top = desired
            .saturating_mul(self.options.overfetch_factor.max(1))
            .min(MAX_API_TOP);
        let mut primary = SearchRequest::new(self.expander.expand(raw), top);
        if let Some(category) = &self.options.category {
            primary = primary.with_category(category.clone());
        }

        let err = match self.provider.search(&primary).await {
            Ok(hits) => {
                return ApiOutcome {
                    hits,
                    ..ApiOutcome::default()
                };
            }
            Err(err) => err,
        };
        warn!(
            "{} search failed ({err}), retrying with the plain query",
            self.provider.name()
        );

        match self.provider.search(&SearchRequest::new(raw, top)).await {
            Ok(hits) => ApiOutcome {
                hits,
                error: None,
                fallback_used: true,
            },
            Err(err) => {
                warn!(
                    "{} fallback search failed ({err}), continuing with catalog sources only",
                    self.provider.name()
                );
                ApiOutcome {
                    hits: Vec::new(),
                    error: Some(err),
                    fallback_used: true,
                }
            }
        }
    }
}

#[derive(Default)]
struct ApiOutcome {
    hits: Vec<SearchHit>,
    error: Option<SearchApiError>,
    fallback_used: bool,
}

/// Builder for [`RetrievalEngine`].
pub struct RetrievalEngineBuilder {
    provider: Arc<dyn SearchProvider>,
    catalog: Arc<SourceCatalog>,
    scorer: Arc<dyn Scorer>,
    expander: QueryExpander,
    clock: SharedClock,
    options: EngineOptions,
}

impl RetrievalEngineBuilder {
    /// Create a builder with an empty catalog and default ranking.
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self {
            provider,
            catalog: Arc::new(SourceCatalog::empty()),
            scorer: Arc::new(WeightedScorer::default()),
            expander: QueryExpander::default(),
            clock: docground_utils_clock::system(),
            options: EngineOptions::default(),
        }
    }

    /// Set the institutional catalog.
    pub fn with_catalog(mut self, catalog: Arc<SourceCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Use a [`WeightedScorer`] with these weights.
    pub fn with_ranking(mut self, ranking: RankingConfig) -> Self {
        self.options.min_term_chars = ranking.min_term_chars;
        self.options.min_api_score = ranking.min_api_score;
        self.scorer = Arc::new(WeightedScorer::new(ranking));
        self
    }

    /// Use a custom scoring strategy.
    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Set the query expander.
    pub fn with_expander(mut self, expander: QueryExpander) -> Self {
        self.expander = expander;
        self
    }

    /// Set the clock used for recency.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Set the API over-fetch factor.
    pub fn with_overfetch_factor(mut self, factor: usize) -> Self {
        self.options.overfetch_factor = factor.max(1);
        self
    }

    /// Set or clear the category filter of the primary query.
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.options.category = category;
        self
    }

    /// Build the engine.
    pub fn build(self) -> RetrievalEngine {
        RetrievalEngine {
            provider: self.provider,
            catalog: self.catalog,
            scorer: self.scorer,
            expander: self.expander,
            clock: self.clock,
            options: self.options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Origin;
    use crate::error::Result;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use docground_utils_clock::ManualClock;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    const UNC_CATALOG: &str = r#"
        [[source]]
        organization = "UNC-Chapel Hill"
        title = "Microsoft Copilot at UNC"
        url = "https://its.unc.edu/copilot/"
        triggers = ["unc", "chapel hill"]
        summary = "Copilot with data protection is available to UNC faculty, staff and students."

        [[source]]
        organization = "UNC-Chapel Hill"
        title = "Generative AI guidance for research"
        url = "https://research.unc.edu/ai-guidance/"
        triggers = ["unc"]

        [[source]]
        organization = "NIH"
        title = "NIH guidance on generative AI in peer review"
        url = "https://grants.nih.gov/ai-peer-review"
        triggers = ["nih"]
    "#;

    /// Provider returning canned answers and recording requests.
    struct FakeProvider {
        responses: Mutex<Vec<Result<Vec<SearchHit>>>>,
        requests: Mutex<Vec<SearchRequest>>,
    }

    impl FakeProvider {
        fn new(responses: Vec<Result<Vec<SearchHit>>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<SearchRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchProvider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
            self.requests.lock().unwrap().push(request.clone());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(Vec::new())
            } else {
                responses.remove(0)
            }
        }
    }

    fn hit(title: &str, url: &str, snippet: &str) -> SearchHit {
        SearchHit {
            url: url.to_string(),
            title: title.to_string(),
            snippet: snippet.to_string(),
            last_modified: None,
        }
    }

    fn three_hits() -> Vec<SearchHit> {
        vec![
            hit(
                "Microsoft 365 Copilot overview",
                "https://learn.microsoft.com/en-us/copilot/microsoft-365/overview",
                "Copilot security and compliance for research",
            ),
            hit(
                "Deploy Copilot",
                "https://learn.microsoft.com/en-us/copilot/microsoft-365/deploy",
                "Implement Copilot in your organization",
            ),
            hit(
                "Copilot privacy",
                "https://learn.microsoft.com/en-us/copilot/privacy",
                "Enterprise data protection",
            ),
        ]
    }

    fn engine(provider: Arc<FakeProvider>) -> RetrievalEngine {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        ));
        RetrievalEngine::builder(provider)
            .with_catalog(Arc::new(SourceCatalog::from_toml_str(UNC_CATALOG).unwrap()))
            .with_clock(clock)
            .build()
    }

    #[tokio::test]
    async fn test_unc_query_keeps_catalog_sources() {
        let provider = FakeProvider::new(vec![Ok(three_hits())]);
        let docs = engine(provider.clone())
            .search("How does UNC implement Copilot for research?", 3)
            .await;

        assert_eq!(docs.len(), 3);
        assert!(docs.iter().any(RetrievedDocument::is_catalog));
        assert_eq!(
            docs.iter().filter(|d| d.is_catalog()).count(),
            2,
            "both triggered UNC entries outrank API hits"
        );

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].top, 9);
        assert_eq!(requests[0].category.as_deref(), Some("Documentation"));
    }

    #[tokio::test]
    async fn test_results_bounded_by_desired_count() {
        for desired in 1..=5 {
            let provider = FakeProvider::new(vec![Ok(three_hits())]);
            let docs = engine(provider).search("UNC copilot", desired).await;
            assert!(docs.len() <= desired);
            assert_eq!(docs.len(), desired.min(5));
        }

        let provider = FakeProvider::new(vec![Ok(three_hits())]);
        assert_eq!(engine(provider).search("copilot", 0).await.len(), 1);
    }

    #[tokio::test]
    async fn test_ranking_is_deterministic() {
        let first = engine(FakeProvider::new(vec![Ok(three_hits())]))
            .search("How does UNC deploy Copilot?", 5)
            .await;
        let second = engine(FakeProvider::new(vec![Ok(three_hits())]))
            .search("How does UNC deploy Copilot?", 5)
            .await;
        assert_eq!(first, second);

        let scores: Vec<f64> = first.iter().map(|d| d.relevance_score).collect();
        let mut sorted = scores.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(scores, sorted);
    }

    #[tokio::test]
    async fn test_api_failure_falls_back_then_catalog_only() {
        let provider = FakeProvider::new(vec![
            Err(SearchApiError::Timeout),
            Err(SearchApiError::Timeout),
        ]);
        let report = engine(provider.clone())
            .search_detailed("NIH peer review rules", 3)
            .await;

        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0].origin, Origin::Catalog);
        assert_eq!(report.api_error, Some(SearchApiError::Timeout));
        assert!(report.fallback_used);

        let requests = provider.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].query, "NIH peer review rules");
        assert_eq!(requests[1].category, None);
    }

    #[tokio::test]
    async fn test_fallback_success_uses_hits() {
        let provider = FakeProvider::new(vec![
            Err(SearchApiError::Status {
                status: 500,
                body: String::new(),
            }),
            Ok(three_hits()),
        ]);
        let report = engine(provider).search_detailed("copilot agents", 2).await;
        assert_eq!(report.documents.len(), 2);
        assert_eq!(report.api_hits, 3);
        assert_eq!(report.api_error, None);
        assert!(report.fallback_used);
    }

    #[tokio::test]
    async fn test_timeout_without_triggers_is_empty() {
        let provider = FakeProvider::new(vec![
            Err(SearchApiError::Timeout),
            Err(SearchApiError::Timeout),
        ]);
        let docs = engine(provider).search("What is a Copilot agent?", 5).await;
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_urls_collapse() {
        let mut hits = three_hits();
        hits.push(hit(
            "Copilot at UNC (mirror)",
            "https://its.unc.edu/copilot",
            "",
        ));
        hits.push(hit(
            "Copilot privacy again",
            "https://learn.microsoft.com/en-us/copilot/privacy/#faq",
            "",
        ));
        let provider = FakeProvider::new(vec![Ok(hits)]);
        let docs = engine(provider).search("UNC Copilot", 5).await;

        let unc: Vec<_> = docs
            .iter()
            .filter(|d| d.url.starts_with("https://its.unc.edu"))
            .collect();
        assert_eq!(unc.len(), 1);
        assert_eq!(unc[0].origin, Origin::Catalog);
        assert_eq!(
            docs.iter()
                .filter(|d| d.url.contains("/copilot/privacy"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_equal_scores_keep_api_first() {
        struct Flat;
        impl Scorer for Flat {
            fn score(&self, _: &RetrievedDocument, _: &ScoringContext) -> f64 {
                1.0
            }
        }

        let provider = FakeProvider::new(vec![Ok(vec![hit("A", "https://a.example/", "")])]);
        let docs = RetrievalEngine::builder(provider)
            .with_catalog(Arc::new(SourceCatalog::from_toml_str(UNC_CATALOG).unwrap()))
            .with_scorer(Arc::new(Flat))
            .build()
            .search("nih", 5)
            .await;

        let origins: Vec<Origin> = docs.iter().map(|d| d.origin).collect();
        assert_eq!(origins, vec![Origin::Api, Origin::Catalog]);
    }

    #[tokio::test]
    async fn test_min_api_score_filters_api_only() {
        let provider = FakeProvider::new(vec![Ok(vec![hit(
            "Unrelated",
            "https://example.org/x",
            "",
        )])]);
        let docs = RetrievalEngine::builder(provider)
            .with_catalog(Arc::new(SourceCatalog::from_toml_str(UNC_CATALOG).unwrap()))
            .with_ranking(RankingConfig::default().with_min_api_score(10.0))
            .build()
            .search("nih", 5)
            .await;
        assert_eq!(docs.len(), 1);
        assert!(docs[0].is_catalog());
    }

    #[tokio::test]
    async fn test_default_ranking_drops_weak_api_hits() {
        let mut hits = three_hits();
        hits.push(hit("Release notes", "https://example.org/notes", ""));
        let provider = FakeProvider::new(vec![Ok(hits)]);
        let docs = RetrievalEngine::builder(provider)
            .with_ranking(RankingConfig::default())
            .build()
            .search("copilot privacy", 5)
            .await;

        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(|d| !d.url.contains("example.org")));
    }

    #[tokio::test]
    async fn test_overfetch_request_size_is_capped() {
        let provider = FakeProvider::new(vec![Ok(Vec::new())]);
        RetrievalEngine::builder(provider.clone())
            .with_overfetch_factor(usize::MAX)
            .build()
            .search("copilot agents", 5)
            .await;
        assert_eq!(provider.requests()[0].top, MAX_API_TOP);
    }

    #[test]
    fn test_clamp_source_count() {
        assert_eq!(clamp_source_count(0), 1);
        assert_eq!(clamp_source_count(3), 3);
        assert_eq!(clamp_source_count(50), 5);
    }
}
