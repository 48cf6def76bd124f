//! Relevance scoring strategies.
//!
//! Scoring is a pure function of a candidate and the request context. The
//! clock reading lives in the context so recency is reproducible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docground_utils_url::{host_in_domain, host_of};

use crate::document::{Origin, RetrievedDocument};

/// Per-query inputs shared by every candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringContext {
    /// Lowercased raw query.
    pub query_lower: String,

    /// Significant query terms.
    pub terms: Vec<String>,

    /// Time used for recency.
    pub now: DateTime<Utc>,
}

impl ScoringContext {
    /// Build a context; terms shorter than `min_term_chars` are ignored.
    pub fn new(query: &str, min_term_chars: usize, now: DateTime<Utc>) -> Self {
        let query_lower = query.to_lowercase();
        let terms = query_lower
            .split_whitespace()
            .map(|term| term.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|term| term.chars().count() >= min_term_chars)
            .map(str::to_string)
            .collect();
        Self {
            query_lower,
            terms,
            now,
        }
    }
}

/// A relevance scoring strategy.
pub trait Scorer: Send + Sync {
    /// Score one candidate. Must be deterministic.
    fn score(&self, document: &RetrievedDocument, context: &ScoringContext) -> f64;
}

/// Weights for [`WeightedScorer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Minimum length of a query term that counts for overlap.
    pub min_term_chars: usize,
    pub title_term_weight: f64,
    pub snippet_term_weight: f64,

    pub priority_keywords: Vec<String>,
    pub priority_title_weight: f64,
    pub priority_snippet_weight: f64,
    pub priority_url_weight: f64,

    /// URL path fragments of first-party documentation areas.
    pub authoritative_paths: Vec<String>,
    pub authoritative_path_weight: f64,

    /// Hosts (and their subdomains) treated as official documentation.
    pub official_domains: Vec<String>,
    pub official_domain_weight: f64,

    pub overview_terms: Vec<String>,
    pub overview_weight: f64,

    /// Terms marking content as unstable or outdated.
    pub caution_terms: Vec<String>,
    pub caution_penalty: f64,

    pub intent_query_terms: Vec<String>,
    pub intent_title_terms: Vec<String>,
    pub intent_weight: f64,

    /// Maximum bonus for a page modified right now.
    pub recency_weight: f64,
    /// Age at which the recency bonus reaches zero.
    pub recency_horizon_days: f64,

    /// Base score of triggered catalog sources.
    pub catalog_floor: f64,

    /// API candidates scoring below this are dropped. `None` keeps every
    /// candidate.
    pub min_api_score: Option<f64>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| (*v).to_string()).collect()
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_term_chars: 4,
            title_term_weight: 7.0,
            snippet_term_weight: 3.0,
            priority_keywords: strings(&[
                "copilot",
                "enterprise data protection",
                "microsoft 365",
                "security",
                "compliance",
            ]),
            priority_title_weight: 10.0,
            priority_snippet_weight: 5.0,
            priority_url_weight: 3.0,
            authoritative_paths: strings(&[
                "/copilot/",
                "/microsoft-365/",
                "/microsoft-copilot/",
                "/microsoft-copilot-service/",
                "/purview/",
                "/security/",
                "/compliance/",
            ]),
            authoritative_path_weight: 8.0,
            official_domains: strings(&["microsoft.com"]),
            official_domain_weight: 6.0,
            overview_terms: strings(&["overview", "introduction", "getting started", "what is"]),
            overview_weight: 4.0,
            caution_terms: strings(&["preview", "deprecated", "legacy"]),
            caution_penalty: 5.0,
            intent_query_terms: strings(&[
                "admin",
                "deploy",
                "implement",
                "manage",
                "leadership",
                "executive",
            ]),
            intent_title_terms: strings(&["admin", "administrator", "deployment", "manage"]),
            intent_weight: 6.0,
            recency_weight: 5.0,
            recency_horizon_days: 365.0,
            catalog_floor: 1000.0,
            min_api_score: Some(10.0),
        }
    }
}

impl RankingConfig {
    /// Set the API score threshold.
    pub fn with_min_api_score(mut self, min: f64) -> Self {
        self.min_api_score = Some(min);
        self
    }

    /// Disable the recency bonus.
    pub fn without_recency(mut self) -> Self {
        self.recency_weight = 0.0;
        self
    }
}

/// Additive multi-factor scorer.
#[derive(Debug, Clone, Default)]
pub struct WeightedScorer {
    config: RankingConfig,
}

impl WeightedScorer {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    fn overlap(&self, title: &str, snippet: &str, context: &ScoringContext) -> f64 {
        context.terms.iter().fold(0.0, |score, term| {
            let mut score = score;
            if title.contains(term.as_str()) {
                score += self.config.title_term_weight;
            }
            if snippet.contains(term.as_str()) {
                score += self.config.snippet_term_weight;
            }
            score
        })
    }

    fn priority(&self, title: &str, snippet: &str, url: &str) -> f64 {
        let c = &self.config;
        c.priority_keywords.iter().fold(0.0, |mut score, keyword| {
            let keyword = keyword.to_lowercase();
            if title.contains(&keyword) {
                score += c.priority_title_weight;
            }
            if snippet.contains(&keyword) {
                score += c.priority_snippet_weight;
            }
            if url.contains(&keyword.replace(' ', "-")) {
                score += c.priority_url_weight;
            }
            score
        })
    }

    fn authority(&self, url: &str) -> f64 {
        let c = &self.config;
        let mut score = 0.0;
        if c.authoritative_paths.iter().any(|p| url.contains(&p.to_lowercase())) {
            score += c.authoritative_path_weight;
        }
        let official = host_of(url)
            .is_some_and(|host| c.official_domains.iter().any(|d| host_in_domain(&host, d)));
        if official {
            score += c.official_domain_weight;
        }
        score
    }

    fn shape(&self, title: &str, snippet: &str, context: &ScoringContext) -> f64 {
        let c = &self.config;
        let any_in = |terms: &[String], text: &str| terms.iter().any(|t| text.contains(t.as_str()));

        let mut score = 0.0;
        if any_in(&c.overview_terms, title) {
            score += c.overview_weight;
        }
        if any_in(&c.caution_terms, title) || any_in(&c.caution_terms, snippet) {
            score -= c.caution_penalty;
        }
        if any_in(&c.intent_query_terms, &context.query_lower)
            && any_in(&c.intent_title_terms, title)
        {
            score += c.intent_weight;
        }
        score
    }

    fn recency(&self, document: &RetrievedDocument, context: &ScoringContext) -> f64 {
        let c = &self.config;
        let Some(modified) = document.last_modified else {
            return 0.0;
        };
        if c.recency_weight <= 0.0 || c.recency_horizon_days <= 0.0 {
            return 0.0;
        }
        let age_days = (context.now - modified).num_seconds().max(0) as f64 / 86_400.0;
        c.recency_weight * (1.0 - age_days / c.recency_horizon_days).max(0.0)
    }
}

impl Scorer for WeightedScorer {
    fn score(&self, document: &RetrievedDocument, context: &ScoringContext) -> f64 {
        let title = document.title.to_lowercase();
        let snippet = document.snippet.to_lowercase();
        let overlap = self.overlap(&title, &snippet, context);

        match document.origin {
            Origin::Catalog => self.config.catalog_floor + overlap,
            Origin::Api => {
                let url = document.url.to_lowercase();
                overlap
                    + self.priority(&title, &snippet, &url)
                    + self.authority(&url)
                    + self.shape(&title, &snippet, context)
                    + self.recency(document, context)
            }
        }
    }
}
