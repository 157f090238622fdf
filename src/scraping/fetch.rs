//! Page fetching over HTTP with a browser-like request profile.

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Desktop Chrome user agent sent with every page request.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const MAX_REDIRECTS: usize = 10;

/// Failure to retrieve a page. The item is skipped and counted as failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },
}

/// Body of a fetched page together with the post-redirect URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub final_url: Url,
    pub body: String,
}

/// Source of HTML pages.
pub trait PageFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// [`PageFetcher`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with the given per-request timeout.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                reason: e.to_string(),
            })?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let network = |e: reqwest::Error| FetchError::Network {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .header(reqwest::header::ACCEPT_LANGUAGE, "pt-BR,pt;q=0.9,en;q=0.8")
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(network)?;
        log::debug!("Fetched {url} ({} bytes, final {final_url})", body.len());

        Ok(FetchedPage { final_url, body })
    }
}

/// Parse a user-supplied URL, accepting only `http(s)`.
pub fn parse_http_url(raw: &str) -> Result<Url, FetchError> {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(FetchError::InvalidUrl(trimmed.to_string())),
    }
}
