//! Ranked documents produced by the engine.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use docground_catalog::CatalogMatch;

use crate::provider::SearchHit;

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Returned by the documentation search API.
    Api,
    /// Pulled in by an institutional trigger keyword.
    Catalog,
}

/// A candidate source for answering a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    /// Absolute page URL.
    pub url: String,

    /// Page title.
    pub title: String,

    /// Short description shown with the source.
    pub snippet: String,

    /// Score assigned by the ranking strategy.
    pub relevance_score: f64,

    /// Discovery channel.
    pub origin: Origin,

    /// Publishing organization, for catalog sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,

    /// Last modification time reported by the search API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    /// Trigger keywords that pulled a catalog source in.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub matched_triggers: BTreeSet<String>,
}

impl RetrievedDocument {
    /// Whether the document came from the institutional catalog.
    pub fn is_catalog(&self) -> bool {
        self.origin == Origin::Catalog
    }
}

impl From<SearchHit> for RetrievedDocument {
    fn from(hit: SearchHit) -> Self {
        Self {
            url: hit.url,
            title: hit.title,
            snippet: hit.snippet,
            relevance_score: 0.0,
            origin: Origin::Api,
            organization: None,
            last_modified: hit.last_modified,
            matched_triggers: BTreeSet::new(),
        }
    }
}

impl From<CatalogMatch<'_>> for RetrievedDocument {
    fn from(matched: CatalogMatch<'_>) -> Self {
        let entry = matched.entry;
        let snippet = entry
            .summary
            .as_deref()
            .map(first_sentence)
            .unwrap_or_else(|| format!("Institutional guidance from {}.", entry.organization));
        Self {
            url: entry.url.clone(),
            title: entry.title.clone(),
            snippet,
            relevance_score: 0.0,
            origin: Origin::Catalog,
            organization: Some(entry.organization.clone()),
            last_modified: None,
            matched_triggers: matched.triggers,
        }
    }
}

fn first_sentence(text: &str) -> String {
    let text = text.trim();
    match text.find(". ") {
        Some(end) => text[..=end].to_string(),
        None => text.to_string(),
    }
}
