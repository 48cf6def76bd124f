//! End-to-end tests for answer context assembly.
//!
//! A wiremock server stands in for both the documentation search API and
//! the documentation pages; the cache lives in a temp directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use docground_extract::HttpPageFetcher;
use docground_retrieval::{
    AnswerStatus, ContentExtractor, ContentOutcome, DocumentCache, ExtractedContent,
    ExtractionError, Orchestrator, Origin, Provenance, QueryContext, RetrievalConfig,
    RetrievalEngine, SourceCatalog,
};
use docground_doc_cache::Fingerprint;
use docground_search::{LearnSearchProvider, SearchApiConfig};
use docground_utils_clock::ManualClock;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const UNC_QUERY: &str = "How does UNC implement Copilot for research?";

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn unc_catalog(base: &str) -> String {
    format!(
        r#"
[[source]]
organization = "UNC-Chapel Hill"
title = "Microsoft Copilot at UNC"
url = "{base}/unc/copilot"
triggers = ["unc", "chapel hill"]
summary = "Copilot with data protection is available to UNC faculty, staff and students."

[[source]]
organization = "UNC-Chapel Hill"
title = "Research computing and AI"
url = "{base}/unc/research"
triggers = ["unc"]
"#
    )
}

async fn mount_search(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate, calls: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(calls)
        .mount(server)
        .await;
}

fn html(name: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html")
        .set_body_string(fixture(name))
}

#[tokio::test]
async fn test_unc_query_end_to_end() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        serde_json::json!({
            "results": [
                {
                    "title": "Implement Copilot for research teams",
                    "url": "/docs/implement",
                    "description": "Research deployment guidance"
                },
                { "title": "Release notes", "url": "/docs/notes", "description": "" },
                { "title": "Glossary", "url": "/docs/glossary", "description": "" }
            ]
        }),
    )
    .await;
    mount_page(&server, "/unc/research", html("research-computing.html"), 1).await;
    mount_page(&server, "/unc/copilot", ResponseTemplate::new(200), 0).await;
    mount_page(&server, "/docs/implement", ResponseTemplate::new(500), 1).await;

    let temp = TempDir::new().unwrap();
    let catalog_path = temp.path().join("catalog.toml");
    std::fs::write(&catalog_path, unc_catalog(&server.uri())).unwrap();

    let mut config = RetrievalConfig::default()
        .with_search_base_url(server.uri())
        .with_cache_dir(temp.path().join("cache"));
    config.catalog.path = Some(catalog_path);

    let orchestrator = Orchestrator::from_config(&config).await.unwrap();
    let context = QueryContext::from_settings(
        UNC_QUERY,
        &config.defaults,
        &config.cache,
        orchestrator.catalog(),
    )
    .with_sources(3);
    assert!(context.matched_triggers.contains("unc"));

    let answer = orchestrator.answer_context(&context).await;

    assert_eq!(answer.sources.len(), 3);
    let origins: Vec<Origin> = answer.sources.iter().map(|d| d.origin).collect();
    assert_eq!(origins, vec![Origin::Catalog, Origin::Catalog, Origin::Api]);
    assert_eq!(
        answer.sources[2].url,
        format!("{}/docs/implement", server.uri())
    );

    let outcomes: Vec<&ContentOutcome> = answer.contents.values().collect();
    assert!(matches!(
        outcomes[0],
        ContentOutcome::Extracted {
            provenance: Provenance::CatalogSummary,
            ..
        }
    ));
    match outcomes[1] {
        ContentOutcome::Extracted {
            content,
            provenance,
        } => {
            assert_eq!(*provenance, Provenance::Fetched);
            assert_eq!(content.title.as_deref(), Some("Generative AI for research"));
            assert_eq!(content.sections.len(), 3);
        }
        other => panic!("expected extracted content, got {other:?}"),
    }
    assert_eq!(
        outcomes[2],
        &ContentOutcome::Failed {
            error: ExtractionError::Status { status: 500 }
        }
    );

    assert_eq!(
        answer.status(),
        AnswerStatus::Grounded {
            usable: 2,
            failed: 1
        }
    );

    let prompt = answer.render_prompt_context();
    assert!(prompt.starts_with("SOURCE [1]: Microsoft Copilot at UNC"));
    assert!(prompt.contains("SOURCE [2]: Research computing and AI"));
    assert!(prompt.contains("- Do not enter Tier 2 or Tier 3 data"));
    assert!(prompt.contains("Team | Contact"));
    assert!(prompt.contains("SOURCE [3]: Implement Copilot for research teams"));
    assert!(prompt.contains("Content unavailable: page fetch returned HTTP 500"));
}

#[tokio::test]
async fn test_search_timeout_without_triggers_reports_no_sources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "results": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let provider = LearnSearchProvider::with_timeout(
        SearchApiConfig::default().with_base_url(server.uri()),
        Duration::from_millis(100),
    )
    .unwrap();
    let engine = RetrievalEngine::builder(Arc::new(provider))
        .with_catalog(Arc::new(SourceCatalog::builtin().unwrap()))
        .build();
    let fetcher = HttpPageFetcher::new(Duration::from_secs(1), "docground-test").unwrap();
    let orchestrator = Orchestrator::new(engine, ContentExtractor::new(Arc::new(fetcher)));

    let answer = orchestrator
        .answer_context(&QueryContext::new("What is a Copilot agent?"))
        .await;

    assert!(answer.sources.is_empty());
    assert!(answer.contents.is_empty());
    assert_eq!(answer.status(), AnswerStatus::NoSourcesFound);
    assert_eq!(answer.search_error.as_deref(), Some("search request timed out"));
    assert_eq!(answer.render_prompt_context(), "");
}

struct CachedSetup {
    _server: MockServer,
    clock: Arc<ManualClock>,
    cache: DocumentCache,
    orchestrator: Orchestrator,
    _temp: TempDir,
}

async fn cached_setup(page_calls: u64) -> CachedSetup {
    let server = MockServer::start().await;
    mount_search(
        &server,
        serde_json::json!({
            "results": [{
                "title": "Microsoft 365 Copilot overview",
                "url": "/docs/overview",
                "description": "What Copilot is"
            }]
        }),
    )
    .await;
    mount_page(&server, "/docs/overview", html("copilot-overview.html"), page_calls).await;

    let temp = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2025, 5, 1, 8, 0, 0).unwrap(),
    ));
    let cache = DocumentCache::new(temp.path())
        .await
        .unwrap()
        .with_clock(clock.clone());

    let provider =
        LearnSearchProvider::new(SearchApiConfig::default().with_base_url(server.uri())).unwrap();
    let engine = RetrievalEngine::builder(Arc::new(provider))
        .with_clock(clock.clone())
        .build();
    let fetcher = HttpPageFetcher::new(Duration::from_secs(5), "docground-test").unwrap();
    let extractor = ContentExtractor::new(Arc::new(fetcher)).with_cache(cache.clone());

    CachedSetup {
        _server: server,
        clock,
        cache,
        orchestrator: Orchestrator::new(engine, extractor),
        _temp: temp,
    }
}

fn provenance(answer: &docground_retrieval::AnswerContext) -> Option<Provenance> {
    match answer.contents.values().next() {
        Some(ContentOutcome::Extracted { provenance, .. }) => Some(*provenance),
        _ => None,
    }
}

#[tokio::test]
async fn test_cache_ttl_expiry_triggers_refetch() {
    let setup = cached_setup(2).await;
    let context = QueryContext::new("copilot overview").with_cache_ttl_hours(1);

    let first = setup.orchestrator.answer_context(&context).await;
    assert_eq!(provenance(&first), Some(Provenance::Fetched));

    setup.clock.advance(ChronoDuration::minutes(59));
    let second = setup.orchestrator.answer_context(&context).await;
    assert_eq!(provenance(&second), Some(Provenance::Cached));
    assert_eq!(
        first.contents.values().next().and_then(ContentOutcome::content),
        second.contents.values().next().and_then(ContentOutcome::content)
    );

    setup.clock.advance(ChronoDuration::minutes(2));
    let third = setup.orchestrator.answer_context(&context).await;
    assert_eq!(provenance(&third), Some(Provenance::Fetched));

    let stats = setup.cache.stats().await.unwrap();
    assert_eq!(stats.entries, 1);
}

#[tokio::test]
async fn test_caching_disabled_leaves_cache_untouched() {
    let setup = cached_setup(2).await;
    let context = QueryContext::new("copilot overview").with_caching(false);

    for _ in 0..2 {
        let answer = setup.orchestrator.answer_context(&context).await;
        assert_eq!(provenance(&answer), Some(Provenance::Fetched));
    }
    assert_eq!(setup.cache.stats().await.unwrap().entries, 0);
}

#[tokio::test]
async fn test_snippet_mode_fetches_nothing() {
    let setup = cached_setup(0).await;
    let context = QueryContext::new("copilot overview").with_full_content(false);

    let answer = setup.orchestrator.answer_context(&context).await;
    assert_eq!(provenance(&answer), Some(Provenance::Snippet));

    let (doc, content) = answer.grounding_sources().next().unwrap();
    assert_eq!(doc.title, "Microsoft 365 Copilot overview");
    assert_eq!(content.blocks().count(), 1);
    assert_eq!(setup.cache.stats().await.unwrap().entries, 0);
}

#[tokio::test]
async fn test_snippet_mode_with_blank_description_is_ungrounded() {
    let server = MockServer::start().await;
    mount_search(
        &server,
        serde_json::json!({
            "results": [{ "title": "Copilot", "url": "/docs/a", "description": "" }]
        }),
    )
    .await;
    let provider =
        LearnSearchProvider::new(SearchApiConfig::default().with_base_url(server.uri())).unwrap();
    let engine = RetrievalEngine::builder(Arc::new(provider)).build();
    let fetcher = HttpPageFetcher::new(Duration::from_secs(5), "docground-test").unwrap();
    let orchestrator = Orchestrator::new(engine, ContentExtractor::new(Arc::new(fetcher)));

    let answer = orchestrator
        .answer_context(&QueryContext::new("copilot").with_full_content(false))
        .await;

    assert_eq!(answer.sources.len(), 1);
    assert_eq!(
        answer.contents.values().next(),
        Some(&ContentOutcome::Failed {
            error: ExtractionError::EmptyContent
        })
    );
    assert_eq!(answer.grounding_sources().count(), 0);
    assert_eq!(answer.status(), AnswerStatus::Ungrounded { failed: 1 });
}

#[tokio::test]
async fn test_startup_purges_expired_cache_records() {
    let temp = TempDir::new().unwrap();
    let cache_dir = temp.path().join("cache");

    let past = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
    ));
    let seeded = DocumentCache::new(&cache_dir)
        .await
        .unwrap()
        .with_clock(past);
    let stale_url = "https://learn.example.com/stale";
    seeded
        .put(
            &Fingerprint::of(stale_url, "full"),
            stale_url,
            ExtractedContent::from_text(stale_url, "Stale", "Old page body."),
            1,
        )
        .await
        .unwrap();

    let live = DocumentCache::new(&cache_dir).await.unwrap();
    let fresh_url = "https://learn.example.com/fresh";
    live.put(
        &Fingerprint::of(fresh_url, "full"),
        fresh_url,
        ExtractedContent::from_text(fresh_url, "Fresh", "Current page body."),
        24,
    )
    .await
    .unwrap();
    assert_eq!(live.stats().await.unwrap().entries, 2);

    let config = RetrievalConfig::default().with_cache_dir(cache_dir.clone());
    let orchestrator = Orchestrator::from_config(&config).await.unwrap();

    let stats = live.stats().await.unwrap();
    assert_eq!(stats.entries, 1);
    assert_eq!(stats.expired, 0);
    assert!(orchestrator.extractor().is_cached(fresh_url).await);
}
