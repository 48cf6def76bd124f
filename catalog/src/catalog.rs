//! Catalog loading and trigger matching.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::error::{CatalogLoadError, Result};

const BUILTIN_CATALOG: &str = include_str!("../data/institutional.toml");

/// An institutional documentation source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCatalogEntry {
    /// Publishing organization.
    pub organization: String,

    /// Page title.
    pub title: String,

    /// Page URL.
    pub url: String,

    /// Keywords whose presence in a query pulls this source in.
    #[serde(rename = "triggers")]
    pub trigger_keywords: BTreeSet<String>,

    /// Vetted text of the page, usable as content without fetching it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// A catalog entry selected for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogMatch<'a> {
    /// The matched entry.
    pub entry: &'a SourceCatalogEntry,

    /// Trigger keywords that fired, normalized.
    pub triggers: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default, rename = "source")]
    sources: Vec<SourceCatalogEntry>,
}

/// Immutable list of institutional sources, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    entries: Vec<SourceCatalogEntry>,

    /// Normalized triggers, parallel to `entries`.
    triggers: Vec<Vec<String>>,
}

impl SourceCatalog {
    /// The catalog shipped with this crate.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG)
    }

    /// A catalog with no entries.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&body)?;
        info!(
            "Loaded {} catalog sources from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse and validate a catalog from TOML text.
    pub fn from_toml_str(body: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(body)?;
        Self::from_entries(file.sources)
    }

    /// Build a catalog from entries, validating each.
    pub fn from_entries(entries: Vec<SourceCatalogEntry>) -> Result<Self> {
        let mut seen_urls = HashSet::new();
        let mut triggers = Vec::with_capacity(entries.len());

        for (index, entry) in entries.iter().enumerate() {
            let invalid = |reason: &str| CatalogLoadError::Invalid {
                index,
                reason: reason.to_string(),
            };

            if entry.title.trim().is_empty() {
                return Err(invalid("empty title"));
            }
            if entry.organization.trim().is_empty() {
                return Err(invalid("empty organization"));
            }
            match Url::parse(entry.url.trim()) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => return Err(invalid(&format!("not an http(s) url: {}", entry.url))),
            }
            if !seen_urls.insert(entry.url.trim().to_string()) {
                return Err(CatalogLoadError::DuplicateUrl(entry.url.clone()));
            }

            let normalized: Vec<String> = entry
                .trigger_keywords
                .iter()
                .map(|k| normalize_text(k))
                .filter(|k| !k.is_empty())
                .collect();
            if normalized.is_empty() {
                return Err(invalid("no trigger keywords"));
            }
            triggers.push(normalized);
        }

        Ok(Self { entries, triggers })
    }

    /// All entries, in catalog order.
    pub fn entries(&self) -> &[SourceCatalogEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find an entry by URL.
    pub fn get(&self, url: &str) -> Option<&SourceCatalogEntry> {
        let url = url.trim();
        self.entries.iter().find(|e| e.url.trim() == url)
    }

    /// Entries whose triggers appear in `query`, in catalog order.
    ///
    /// Matching is case-insensitive and on whole words: the query and each
    /// trigger are normalized to lowercase alphanumeric words, and a trigger
    /// matches when its word sequence occurs in the query's.
    pub fn match_triggers(&self, query: &str) -> Vec<CatalogMatch<'_>> {
        let haystack = format!(" {} ", normalize_text(query));

        let matches: Vec<CatalogMatch<'_>> = self
            .entries
            .iter()
            .zip(&self.triggers)
            .filter_map(|(entry, keywords)| {
                let fired: BTreeSet<String> = keywords
                    .iter()
                    .filter(|k| haystack.contains(&format!(" {k} ")))
                    .cloned()
                    .collect();
                (!fired.is_empty()).then_some(CatalogMatch {
                    entry,
                    triggers: fired,
                })
            })
            .collect();

        debug!("{} catalog sources triggered", matches.len());
        matches
    }

    /// The union of trigger keywords that fire for `query`.
    pub fn triggered_keywords(&self, query: &str) -> BTreeSet<String> {
        self.match_triggers(query)
            .into_iter()
            .flat_map(|m| m.triggers)
            .collect()
    }
}

/// Lowercase, replace anything that is not alphanumeric with a space, and
/// collapse runs of whitespace.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
