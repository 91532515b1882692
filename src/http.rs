//! HTTP fetcher for provider metadata lookups.
//!
//! The pipeline only ever needs "GET this URL, give me the body as text",
//! so that is the whole [`HttpFetch`] contract. Hosts with their own HTTP
//! stack implement the trait; everyone else uses [`HttpClient`], a pooled
//! reqwest client with conservative timeouts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::EmbedError;

/// Minimal text-fetch capability consumed by `pre_embed` hooks.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// Fetch a URL and return the response body as a string.
    async fn fetch_text(&self, url: &str) -> Result<String, EmbedError>;
}

/// Pooled HTTP client.
///
/// Metadata lookups block the render, so timeouts are short and redirects
/// are capped. TLS via rustls, compression auto-negotiated.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, EmbedError> {
        let client = Client::builder()
            .user_agent(concat!("embedkit/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for HttpClient {
    async fn fetch_text(&self, url: &str) -> Result<String, EmbedError> {
        debug!(url, "fetching metadata page");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| EmbedError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbedError::Fetch {
                url: url.to_string(),
                reason: format!("status {status}"),
            });
        }

        response.text().await.map_err(|e| EmbedError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Fetcher that always fails. Useful for offline rendering and tests that
/// exercise the no-metadata fallback path.
pub struct NullFetcher;

#[async_trait]
impl HttpFetch for NullFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, EmbedError> {
        Err(EmbedError::Fetch {
            url: url.to_string(),
            reason: "fetching disabled".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds() {
        assert!(HttpClient::new().is_ok());
    }

    #[tokio::test]
    async fn null_fetcher_always_errors() {
        let err = NullFetcher.fetch_text("https://example.com").await.unwrap_err();
        assert!(err.to_string().contains("example.com"));
    }
}
