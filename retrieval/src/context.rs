//! Per-request settings.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use docground_catalog::SourceCatalog;
use docground_search::clamp_source_count;

use crate::config::{CacheConfig, RequestDefaults, TTL_HOURS_RANGE};

/// Settings for answering one query. Built per request and never shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    /// The user's question, unmodified.
    pub raw_query: String,

    /// Catalog triggers present in the query.
    pub matched_triggers: BTreeSet<String>,

    /// Sources to return, 1..=5.
    pub requested_sources: usize,

    /// Fetch full pages; otherwise only snippets are used.
    pub extract_full_content: bool,

    /// Read and write the document cache.
    pub caching_enabled: bool,

    /// Lifetime of cache entries written by this request, 1..=168.
    pub cache_ttl_hours: u32,
}

impl QueryContext {
    /// A context with default settings and no trigger information.
    pub fn new(query: impl Into<String>) -> Self {
        let defaults = RequestDefaults::default();
        let cache = CacheConfig::default();
        Self {
            raw_query: query.into(),
            matched_triggers: BTreeSet::new(),
            requested_sources: defaults.num_sources,
            extract_full_content: defaults.extract_full_content,
            caching_enabled: cache.enabled,
            cache_ttl_hours: cache.ttl_hours,
        }
    }

    /// A context from configured defaults, with triggers resolved against `catalog`.
    pub fn from_settings(
        query: impl Into<String>,
        defaults: &RequestDefaults,
        cache: &CacheConfig,
        catalog: &SourceCatalog,
    ) -> Self {
        let query = query.into();
        let matched_triggers = catalog.triggered_keywords(&query);
        Self::new(query)
            .with_sources(defaults.num_sources)
            .with_full_content(defaults.extract_full_content)
            .with_caching(cache.enabled)
            .with_cache_ttl_hours(cache.ttl_hours)
            .with_triggers(matched_triggers)
    }

    /// Set the source count, clamped to 1..=5.
    pub fn with_sources(mut self, count: usize) -> Self {
        self.requested_sources = clamp_source_count(count);
        self
    }

    pub fn with_full_content(mut self, enabled: bool) -> Self {
        self.extract_full_content = enabled;
        self
    }

    pub fn with_caching(mut self, enabled: bool) -> Self {
        self.caching_enabled = enabled;
        self
    }

    /// Set the cache lifetime, clamped to 1..=168 hours.
    pub fn with_cache_ttl_hours(mut self, hours: u32) -> Self {
        self.cache_ttl_hours = hours.clamp(*TTL_HOURS_RANGE.start(), *TTL_HOURS_RANGE.end());
        self
    }

    pub fn with_triggers(mut self, triggers: BTreeSet<String>) -> Self {
        self.matched_triggers = triggers;
        self
    }
}
