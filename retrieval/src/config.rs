//! Configuration for the orchestrator, read from TOML.
//!
//! Every section and field is optional; missing values take the defaults
//! below.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use docground_catalog::SourceCatalog;
use docground_doc_cache::DEFAULT_TTL_HOURS;
use docground_extract::ParseOptions;
use docground_search::{
    ExpansionRule, MAX_SOURCES, QueryExpander, RankingConfig, SearchApiConfig, default_rules,
};

use crate::error::{Result, RetrievalError};

/// Allowed cache lifetimes, in hours.
pub const TTL_HOURS_RANGE: RangeInclusive<u32> = 1..=168;

/// Allowed number of sources per query.
pub const SOURCES_RANGE: RangeInclusive<usize> = 1..=MAX_SOURCES;

const TEMPERATURE_RANGE: RangeInclusive<f32> = 0.0..=1.0;
const MAX_TOKENS_RANGE: RangeInclusive<u32> = 64..=4096;
const OVERFETCH_RANGE: RangeInclusive<usize> = 1..=10;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Search API settings.
    pub search: SearchConfig,

    /// Ranking weights.
    pub ranking: RankingConfig,

    /// Page fetch and parse settings.
    pub extract: ExtractConfig,

    /// Document cache settings.
    pub cache: CacheConfig,

    /// Source catalog settings.
    pub catalog: CatalogConfig,

    /// Per-request defaults.
    pub defaults: RequestDefaults,

    /// Passed through to the answer generator.
    pub generation: GenerationConfig,
}

impl RetrievalConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(body: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(body).map_err(|e| RetrievalError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let body = std::fs::read_to_string(path)
            .map_err(|e| RetrievalError::Config(format!("{}: {e}", path.display())))?;
        let config: Self = toml::from_str(&body)
            .map_err(|e| RetrievalError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location, `<config_dir>/docground/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("docground").join("config.toml"))
    }

    /// Load `path` if given, else the default file if it exists, else defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::load(path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(RetrievalError::Config(msg));

        if !TTL_HOURS_RANGE.contains(&self.cache.ttl_hours) {
            return invalid(format!(
                "cache.ttl_hours must be within 1..=168, got {}",
                self.cache.ttl_hours
            ));
        }
        if !SOURCES_RANGE.contains(&self.defaults.num_sources) {
            return invalid(format!(
                "defaults.num_sources must be within 1..={MAX_SOURCES}, got {}",
                self.defaults.num_sources
            ));
        }
        if !TEMPERATURE_RANGE.contains(&self.generation.temperature) {
            return invalid(format!(
                "generation.temperature must be within 0.0..=1.0, got {}",
                self.generation.temperature
            ));
        }
        if !MAX_TOKENS_RANGE.contains(&self.generation.max_tokens) {
            return invalid(format!(
                "generation.max_tokens must be within 64..=4096, got {}",
                self.generation.max_tokens
            ));
        }
        if self.search.api.timeout_secs == 0 || self.extract.timeout_secs == 0 {
            return invalid("timeouts must be at least one second".to_string());
        }
        if !OVERFETCH_RANGE.contains(&self.search.api.overfetch_factor) {
            return invalid(format!(
                "search.overfetch_factor must be within 1..=10, got {}",
                self.search.api.overfetch_factor
            ));
        }
        Ok(())
    }

    /// Set the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache.dir = dir.into();
        self
    }

    /// Point the search API (and link resolution) at `base_url`.
    pub fn with_search_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.search.api = self.search.api.with_base_url(base_url);
        self
    }

    /// Set the ranking weights.
    pub fn with_ranking(mut self, ranking: RankingConfig) -> Self {
        self.ranking = ranking;
        self
    }
}

/// `[search]`: the search API plus query expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    #[serde(flatten)]
    pub api: SearchApiConfig,

    /// Rules applied to the query sent to the API.
    pub expansion_rules: Vec<ExpansionRule>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api: SearchApiConfig::default(),
            expansion_rules: default_rules(),
        }
    }
}

impl SearchConfig {
    pub fn expander(&self) -> QueryExpander {
        QueryExpander::new(self.expansion_rules.clone())
    }
}

/// `[extract]`: page fetching and parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Page fetch timeout in seconds.
    pub timeout_secs: u64,

    /// User agent sent with page fetches.
    pub user_agent: String,

    /// Paragraphs shorter than this are dropped.
    pub min_paragraph_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: concat!("docground/", env!("CARGO_PKG_VERSION")).to_string(),
            min_paragraph_chars: ParseOptions::default().min_paragraph_chars,
        }
    }
}

impl ExtractConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            min_paragraph_chars: self.min_paragraph_chars,
        }
    }
}

/// `[cache]`: the on-disk document cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory.
    pub dir: PathBuf,

    /// Whether requests use the cache by default.
    pub enabled: bool,

    /// Default lifetime of new entries.
    pub ttl_hours: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("docground"),
            enabled: true,
            ttl_hours: DEFAULT_TTL_HOURS,
        }
    }
}

/// `[catalog]`: institutional sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog file; the built-in catalog is used when unset.
    pub path: Option<PathBuf>,

    /// Fetch catalog pages instead of using their stored summaries.
    pub fetch_catalog_pages: bool,
}

impl CatalogConfig {
    /// Load the configured catalog file, or the built-in catalog.
    pub fn load_catalog(&self) -> Result<SourceCatalog> {
        let catalog = match &self.path {
            Some(path) => SourceCatalog::load(path)?,
            None => SourceCatalog::builtin()?,
        };
        Ok(catalog)
    }
}

/// `[defaults]`: request settings the caller did not override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    /// Sources per answer.
    pub num_sources: usize,

    /// Fetch and parse full pages rather than using snippets.
    pub extract_full_content: bool,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            num_sources: MAX_SOURCES,
            extract_full_content: true,
        }
    }
}

/// `[generation]`: settings for the downstream answer generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 1500,
        }
    }
}
