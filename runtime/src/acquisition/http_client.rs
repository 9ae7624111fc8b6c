//! Document fetcher wrapping reqwest.
//!
//! One GET per call by default. With `max_retries > 0`, transient failures
//! are retried with exponential backoff, and 429 responses honour
//! `Retry-After`.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use super::error::FetchError;

const USER_AGENT: &str = concat!("handbook-requisites/", env!("CARGO_PKG_VERSION"));

/// Longest wait honoured from a `Retry-After` header.
const MAX_RETRY_AFTER_SECS: u64 = 10;

/// Source of markup documents, addressed by absolute URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP implementation of [`Fetcher`].
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpClient {
    pub fn new(timeout_ms: u64, max_retries: u32) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            max_retries,
        }
    }

    /// One request. On failure also returns how long the server asked us to wait.
    async fn fetch_once(&self, url: &str) -> Result<String, (FetchError, Option<Duration>)> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| (FetchError::from_reqwest(url, &e), None))?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let retry_after = (status == 429)
                .then(|| {
                    resp.headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.trim().parse::<u64>().ok())
                })
                .flatten()
                .map(|secs| Duration::from_secs(secs.min(MAX_RETRY_AFTER_SECS)));
            return Err((FetchError::from_status(url, status), retry_after));
        }

        resp.text().await.map_err(|e| {
            (
                FetchError::permanent(url, Some(status), format!("body decode failed: {e}")),
                None,
            )
        })
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut retries = 0u32;
        loop {
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err((err, retry_after)) => {
                    if !err.is_transient() || retries >= self.max_retries {
                        return Err(err);
                    }
                    retries += 1;
                    let delay = retry_after.unwrap_or_else(|| backoff(retries));
                    debug!(url, attempt = retries, ?delay, "retrying after {err}");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// 500ms, 1s, 2s, ...
fn backoff(attempt: u32) -> Duration {
    Duration::from_millis(500 * 2u64.pow(attempt.saturating_sub(1).min(16)))
}

/// Resolve a site-relative href against the base origin. Absolute hrefs are
/// returned as given.
pub fn resolve_url(base: &Url, href: &str) -> Result<String, FetchError> {
    base.join(href)
        .map(String::from)
        .map_err(|e| FetchError::permanent(href, None, format!("invalid URL: {e}")))
}
