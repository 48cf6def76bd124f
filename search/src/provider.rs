//! Documentation search providers.
//!
//! A provider turns a query into an ordered list of candidate pages. The
//! engine treats it as a black box that either answers or fails.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use docground_utils_url::resolve_url;

use crate::error::{Result, SearchApiError};

/// Request sent to a search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Query text.
    pub query: String,

    /// Number of results to ask for.
    pub top: usize,

    /// Restrict to a content category (provider-specific).
    pub category: Option<String>,
}

impl SearchRequest {
    /// Create a new search request.
    pub fn new(query: impl Into<String>, top: usize) -> Self {
        Self {
            query: query.into(),
            top,
            category: None,
        }
    }

    /// Restrict the request to a category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// One result returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Absolute page URL.
    pub url: String,

    /// Page title.
    pub title: String,

    /// Short description of the page.
    pub snippet: String,

    /// Last modification time, when the API reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Trait for documentation search backends.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Run a search.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>>;
}

/// Settings for [`LearnSearchProvider`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchApiConfig {
    /// Base URL of the search API; requests go to `{base_url}/api/search`.
    pub base_url: String,

    /// Base URL used to resolve relative result links.
    pub content_base_url: String,

    /// Result locale.
    pub locale: String,

    /// Category used for the primary (expanded) query.
    pub category: Option<String>,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// How many results to request per desired source.
    pub overfetch_factor: usize,

    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for SearchApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://learn.microsoft.com".to_string(),
            content_base_url: "https://learn.microsoft.com".to_string(),
            locale: "en-us".to_string(),
            category: Some("Documentation".to_string()),
            timeout_secs: 10,
            overfetch_factor: 3,
            user_agent: concat!("docground/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SearchApiConfig {
    /// Point both the API and link resolution at `base_url`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.content_base_url = base_url.clone();
        self.base_url = base_url;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }
}

/// Provider for the Microsoft Learn documentation search API.
pub struct LearnSearchProvider {
    /// HTTP client with the configured timeout.
    client: reqwest::Client,

    /// Provider settings.
    config: SearchApiConfig,
}

impl LearnSearchProvider {
    /// Create a provider from settings.
    pub fn new(config: SearchApiConfig) -> Result<Self> {
        Self::with_timeout(config.clone(), Duration::from_secs(config.timeout_secs))
    }

    /// Create a provider with an explicit timeout, overriding `timeout_secs`.
    pub fn with_timeout(config: SearchApiConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SearchApiError::Client(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Provider settings.
    pub fn config(&self) -> &SearchApiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/api/search", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl SearchProvider for LearnSearchProvider {
    fn name(&self) -> &str {
        "learn"
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        debug!("Searching for {:?} (top {})", request.query, request.top);

        let mut params = vec![
            ("search", request.query.clone()),
            ("locale", self.config.locale.clone()),
            ("$top", request.top.to_string()),
        ];
        if let Some(category) = &request.category {
            params.push(("category", category.clone()));
        }

        let response = self
            .client
            .get(self.endpoint())
            .header("Accept", "application/json")
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: LearnSearchResponse =
            serde_json::from_str(&body).map_err(|e| SearchApiError::Decode(e.to_string()))?;

        let hits: Vec<SearchHit> = parsed
            .results
            .into_iter()
            .filter_map(|item| item.into_hit(&self.config.content_base_url))
            .collect();

        info!("Search API returned {} results", hits.len());
        Ok(hits)
    }
}

/// Learn search API response format.
#[derive(Debug, Deserialize)]
struct LearnSearchResponse {
    #[serde(default)]
    results: Vec<LearnSearchResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LearnSearchResult {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "last_modified", alias = "lastModified")]
    last_updated_date: Option<String>,
}

impl LearnSearchResult {
    fn into_hit(self, content_base_url: &str) -> Option<SearchHit> {
        let url = resolve_url(content_base_url, self.url.as_deref()?)?;
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());
        Some(SearchHit {
            url,
            title,
            snippet: self.description.unwrap_or_default().trim().to_string(),
            last_modified: self.last_updated_date.as_deref().and_then(parse_timestamp),
        })
    }
}

/// Parse an RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| NaiveDateTime::and_utc(&dt))
}
