//! Outbound HTTP fetcher with a fixed browser-like header set.
//!
//! Every other component performs its upstream requests through this type so
//! the proxy presents one consistent identity to target sites.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, RANGE, REFERER, USER_AGENT};
use reqwest::{Client, Response};

/// User agent presented to upstream sites. Matches the browser locator's
/// override so static and dynamic fetches are indistinguishable.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default per-request time budget for the header phase.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Error from an upstream fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),
}

/// HTTP client wrapper attaching the fixed header set to every request.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Create a fetcher. The timeout bounds time-to-headers only; response
    /// bodies keep streaming past it so long-lived media transfers survive.
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .tcp_nodelay(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, timeout }
    }

    /// The header set carried on every outbound request. Best-effort
    /// anti-scraping evasion, not a guarantee.
    fn browser_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(
            REFERER,
            HeaderValue::from_static("https://www.google.com/"),
        );
        headers
    }

    /// Fetch a URL.
    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        self.get_with_range(url, None).await
    }

    /// Fetch a URL, forwarding an inbound `Range` header verbatim when present.
    pub async fn get_with_range(
        &self,
        url: &str,
        range: Option<&str>,
    ) -> Result<Response, FetchError> {
        let mut request = self.client.get(url).headers(Self::browser_headers());
        if let Some(range) = range {
            request = request.header(RANGE, range);
        }

        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        Ok(response)
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}
