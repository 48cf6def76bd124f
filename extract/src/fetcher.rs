//! Page fetching.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::error::{ExtractionError, Result};

/// A fetched page body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: String,

    /// Markup returned by the server.
    pub body: String,
}

/// Trait for page fetch backends.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url`, failing on timeouts, transport errors and non-2xx.
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// Check that `raw` is an absolute http(s) URL.
pub fn validate_url(raw: &str) -> Result<Url> {
    let invalid = || ExtractionError::InvalidUrl {
        url: raw.to_string(),
    };
    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() {
        Ok(url)
    } else {
        Err(invalid())
    }
}

/// reqwest-backed fetcher with a bounded timeout.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    /// Default page fetch timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

    /// Create a fetcher.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ExtractionError::Client {
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let url = validate_url(url)?;
        debug!("Fetching {url}");

        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml")
            .send()
            .await?
            .error_for_status()?;

        let final_url = response.url().to_string();
        let body = response.text().await?;
        Ok(FetchedPage {
            url: final_url,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://learn.microsoft.com/a").is_ok());
        assert!(validate_url(" http://example.org ").is_ok());
        for bad in ["", "/relative/path", "ftp://example.org/x", "mailto:a@b.c"] {
            assert!(
                matches!(validate_url(bad), Err(ExtractionError::InvalidUrl { .. })),
                "{bad}"
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_success_and_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>hello</p>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(Duration::from_secs(5), "docground-test").unwrap();
        let page = fetcher.fetch(&format!("{}/ok", server.uri())).await.unwrap();
        assert_eq!(page.body, "<p>hello</p>");

        let err = fetcher
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err, ExtractionError::Status { status: 404 });
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let fetcher = HttpPageFetcher::new(Duration::from_millis(100), "docground-test").unwrap();
        let err = fetcher.fetch(&server.uri()).await.unwrap_err();
        assert_eq!(err, ExtractionError::Timeout);
    }
}
