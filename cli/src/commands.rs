//! Command implementations. Each returns the text printed to stdout.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use docground_retrieval::{
    AnswerContext, AnswerStatus, DocumentCache, Orchestrator, QueryContext, RetrievalConfig,
    SourceCatalog,
};

use crate::{AskArgs, CacheAction, CatalogAction, OutputFormat};

pub fn load_config(path: Option<&Path>) -> Result<RetrievalConfig> {
    RetrievalConfig::load_or_default(path).context("failed to load configuration")
}

pub async fn ask(config: &RetrievalConfig, args: &AskArgs) -> Result<String> {
    let orchestrator = Orchestrator::from_config(config).await?;

    let mut context = QueryContext::from_settings(
        args.query.as_str(),
        &config.defaults,
        &config.cache,
        orchestrator.catalog(),
    );
    if let Some(sources) = args.sources {
        context = context.with_sources(usize::from(sources));
    }
    if args.no_full_content {
        context = context.with_full_content(false);
    }
    if args.no_cache {
        context = context.with_caching(false);
    }
    if let Some(hours) = args.ttl_hours {
        context = context.with_cache_ttl_hours(hours);
    }
    if !context.matched_triggers.is_empty() {
        info!("Query triggers: {:?}", context.matched_triggers);
    }

    let answer = orchestrator.answer_context(&context).await;
    match args.format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&answer)?),
        OutputFormat::Prompt => Ok(prompt_output(&answer)),
    }
}

fn prompt_output(answer: &AnswerContext) -> String {
    match answer.status() {
        AnswerStatus::NoSourcesFound => match &answer.search_error {
            Some(error) => format!("No sources found ({error})."),
            None => "No sources found.".to_string(),
        },
        _ => answer.render_prompt_context(),
    }
}

pub async fn cache(config: &RetrievalConfig, action: CacheAction) -> Result<String> {
    let cache = DocumentCache::new(&config.cache.dir)
        .await
        .with_context(|| format!("failed to open cache at {}", config.cache.dir.display()))?;

    let output = match action {
        CacheAction::Stats => serde_json::to_string_pretty(&cache.stats().await?)?,
        CacheAction::PurgeExpired => {
            let removed = cache.purge_expired().await?;
            format!("Purged {removed} expired entries")
        }
        CacheAction::Clear => {
            let removed = cache.clear().await?;
            format!("Removed {removed} entries")
        }
    };
    Ok(output)
}

pub fn catalog(config: &RetrievalConfig, action: &CatalogAction) -> Result<String> {
    let catalog = config.catalog.load_catalog()?;
    Ok(match action {
        CatalogAction::List => list_catalog(&catalog),
        CatalogAction::Match { query } => match_catalog(&catalog, query),
    })
}

fn list_catalog(catalog: &SourceCatalog) -> String {
    let mut out = String::new();
    for entry in catalog.entries() {
        let triggers: Vec<&str> = entry.trigger_keywords.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{} ({})", entry.title, entry.organization);
        let _ = writeln!(out, "  {}", entry.url);
        let _ = writeln!(out, "  triggers: {}", triggers.join(", "));
    }
    out.trim_end().to_string()
}

fn match_catalog(catalog: &SourceCatalog, query: &str) -> String {
    let matches = catalog.match_triggers(query);
    if matches.is_empty() {
        return "No catalog sources triggered.".to_string();
    }
    let mut out = String::new();
    for found in matches {
        let triggers: Vec<&str> = found.triggers.iter().map(String::as_str).collect();
        let _ = writeln!(out, "{} [{}]", found.entry.title, triggers.join(", "));
        let _ = writeln!(out, "  {}", found.entry.url);
    }
    out.trim_end().to_string()
}
