//! HTTP fetcher with streaming support and a one-shot fallback transport.
//!
//! The primary transport sends the tool's own User-Agent. When a fetch fails
//! at the transport level or trips an anti-bot style status, one fallback
//! attempt is made with a browser-like User-Agent before giving up. The
//! pipeline never retries beyond that; re-running the batch is the retry.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use super::error::DownloadError;

/// Browser User-Agent used by the fallback transport.
///
/// Some hosts serve challenge pages or refuse the tool's own User-Agent;
/// the fallback retries once looking like an ordinary browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default User-Agent identifying the tool.
fn tool_user_agent() -> String {
    format!("harvester/{} (research document fetcher)", env!("CARGO_PKG_VERSION"))
}

/// Statuses that suggest the server objects to the client, not the resource.
/// These trigger the fallback transport; other statuses fail as-is.
fn is_anti_bot_status(status: u16) -> bool {
    matches!(status, 403 | 429 | 503)
}

/// HTTP client for fetching documents with streaming support.
///
/// Created once per run and reused, taking advantage of connection pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    primary: Client,
    fallback: Option<Client>,
}

impl HttpClient {
    /// Creates a client with the given per-request deadline.
    ///
    /// When `fallback_enabled` is false, failures of the primary transport
    /// are returned directly with no second attempt.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(timeout: Duration, fallback_enabled: bool) -> Self {
        let primary = build_client(&tool_user_agent(), timeout)
            .expect("failed to build HTTP client with static configuration");
        let fallback = fallback_enabled.then(|| {
            build_client(BROWSER_USER_AGENT, timeout)
                .expect("failed to build fallback HTTP client with static configuration")
        });
        Self { primary, fallback }
    }

    /// Fetches a URL, returning the response ready for streaming.
    ///
    /// At most two attempts are made: primary transport, then (when enabled
    /// and the failure looks transport- or bot-related) the browser-UA
    /// fallback. HTTP status errors surface as
    /// [`DownloadError::HttpStatus`] so callers can distinguish them from
    /// network failures.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] when the URL is invalid, the request fails
    /// at the network level, the deadline is exceeded, or the final attempt
    /// returns a non-success status.
    pub async fn fetch(&self, url: &str) -> Result<FetchResponse, DownloadError> {
        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        debug!(url, "fetching");
        let primary_error = match send(&self.primary, url).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            return Err(primary_error);
        };
        if !should_fall_back(&primary_error) {
            return Err(primary_error);
        }

        warn!(url, error = %primary_error, "primary transport failed; trying browser-UA fallback");
        send(fallback, url).await
    }
}

/// Whether a primary-transport failure warrants the single fallback attempt.
fn should_fall_back(error: &DownloadError) -> bool {
    match error {
        DownloadError::Network { .. } | DownloadError::Timeout { .. } => true,
        DownloadError::HttpStatus { status, .. } => is_anti_bot_status(*status),
        DownloadError::InvalidUrl { .. } | DownloadError::Io { .. } => false,
    }
}

async fn send(client: &Client, url: &str) -> Result<FetchResponse, DownloadError> {
    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DownloadError::timeout(url)
        } else {
            DownloadError::network(url, e)
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::http_status(url, status.as_u16()));
    }

    Ok(FetchResponse {
        url: url.to_string(),
        response,
    })
}

fn build_client(user_agent: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .gzip(true)
        .build()
}

/// A successful fetch, not yet consumed.
///
/// Exposes the declared headers so the pipeline can validate before any
/// bytes land on disk, then streams the body in bounded chunks.
#[derive(Debug)]
pub struct FetchResponse {
    url: String,
    response: reqwest::Response,
}

impl FetchResponse {
    /// Declared Content-Type header, when present.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    /// Declared Content-Length header, when present and parseable.
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
    }

    /// Streams the response body to `path` in bounded chunks.
    ///
    /// Returns the number of bytes written. The file is created (or
    /// truncated) at the final path; the caller owns cleanup of partial
    /// writes on failure.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Io`] on filesystem failures and
    /// [`DownloadError::Network`]/[`DownloadError::Timeout`] when the body
    /// stream breaks mid-transfer.
    pub async fn stream_to_file(self, path: &Path) -> Result<u64, DownloadError> {
        let mut file = File::create(path)
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        let mut stream = self.response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    DownloadError::timeout(&self.url)
                } else {
                    DownloadError::network(&self.url, e)
                }
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| DownloadError::io(path, e))?;
            written += chunk.len() as u64;
        }

        file.flush().await.map_err(|e| DownloadError::io(path, e))?;
        debug!(path = %path.display(), bytes = written, "body streamed to disk");
        Ok(written)
    }
}
