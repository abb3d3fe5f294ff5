//! Unpaywall-style open-access resolution.
//!
//! `GET {base}/v2/{doi}?email={email}` returns a JSON document whose
//! `best_oa_location.url_for_pdf` field, when present, is a directly
//! fetchable PDF URL.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Production API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.unpaywall.org";

/// Resolver requests use a shorter deadline than document downloads;
/// metadata lookups are small JSON bodies.
const RESOLVE_TIMEOUT_SECS: u64 = 10;

/// Errors from open-access resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Transport-level failure talking to the API.
    #[error("network error resolving DOI {doi}: {source}")]
    Network {
        /// The DOI being resolved.
        doi: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("HTTP {status} resolving DOI {doi}")]
    Status {
        /// The DOI being resolved.
        doi: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The resolver HTTP client could not be constructed.
    #[error("failed to build resolver HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct OaResponse {
    best_oa_location: Option<OaLocation>,
}

#[derive(Debug, Deserialize)]
struct OaLocation {
    url_for_pdf: Option<String>,
}

/// Resolver backed by an Unpaywall-compatible API.
#[derive(Debug, Clone)]
pub struct UnpaywallResolver {
    client: reqwest::Client,
    base_url: String,
    email: String,
}

impl UnpaywallResolver {
    /// Creates a resolver against the production API.
    ///
    /// The API requires a contact email on every request.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Client`] when the HTTP client cannot be built.
    pub fn new(email: impl Into<String>) -> Result<Self, ResolveError> {
        Self::with_base_url(DEFAULT_BASE_URL, email)
    }

    /// Creates a resolver against an alternative endpoint (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Client`] when the HTTP client cannot be built.
    pub fn with_base_url(
        base_url: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(RESOLVE_TIMEOUT_SECS))
            .gzip(true)
            .build()
            .map_err(ResolveError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            email: email.into(),
        })
    }

    /// Resolves a DOI to an open-access PDF URL.
    ///
    /// `Ok(None)` means the work exists but has no open-access PDF; that is
    /// an ordinary outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] on transport failures or non-success API
    /// statuses (including 404 for unknown DOIs).
    #[instrument(skip(self))]
    pub async fn resolve_pdf_url(&self, doi: &str) -> Result<Option<String>, ResolveError> {
        let url = format!("{}/v2/{}", self.base_url, doi);

        let response = self
            .client
            .get(&url)
            .query(&[("email", self.email.as_str())])
            .send()
            .await
            .map_err(|e| ResolveError::Network {
                doi: doi.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                doi: doi.to_string(),
                status: status.as_u16(),
            });
        }

        let body: OaResponse = response.json().await.map_err(|e| ResolveError::Network {
            doi: doi.to_string(),
            source: e,
        })?;

        let pdf_url = body.best_oa_location.and_then(|loc| loc.url_for_pdf);
        match &pdf_url {
            Some(url) => debug!(doi, pdf_url = %url, "open-access PDF found"),
            None => warn!(doi, "no open-access PDF location"),
        }
        Ok(pdf_url)
    }
}
