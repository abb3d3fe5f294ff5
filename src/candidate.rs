//! The candidate contract between discovery glue and the download pipeline.
//!
//! Page rendering, link scraping, and search-result pagination live outside
//! the core; whatever form they take, they hand the pipeline a sequence of
//! [`Candidate`] values through the [`CandidateSource`] seam.

use async_trait::async_trait;
use url::Url;

/// A single downloadable document candidate.
///
/// Ephemeral: exists only for one pipeline invocation. The suggested name is
/// raw (possibly percent-encoded, possibly containing illegal path
/// characters); the pipeline sanitizes it before touching the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// URL the document bytes are fetched from.
    pub source_url: String,
    /// Raw name or identifier suggested by the supplier.
    pub suggested_name: String,
}

impl Candidate {
    /// Creates a candidate from explicit parts.
    #[must_use]
    pub fn new(source_url: impl Into<String>, suggested_name: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            suggested_name: suggested_name.into(),
        }
    }

    /// Creates a candidate whose suggested name is derived from the URL's
    /// last path segment (still percent-encoded; sanitization decodes it).
    ///
    /// Falls back to the host name, then to `"document"`, when the URL has no
    /// usable path segment.
    #[must_use]
    pub fn from_url(source_url: impl Into<String>) -> Self {
        let source_url = source_url.into();
        let suggested_name = Url::parse(&source_url)
            .ok()
            .and_then(|url| {
                let from_path = url
                    .path_segments()
                    .and_then(|mut segments| segments.next_back().map(str::to_string))
                    .filter(|segment| !segment.is_empty());
                from_path.or_else(|| url.host_str().map(str::to_string))
            })
            .unwrap_or_else(|| "document".to_string());
        Self {
            source_url,
            suggested_name,
        }
    }
}

/// Supplier of download candidates.
///
/// Implementations may render pages, walk search pagination, or call
/// bibliographic APIs; the pipeline only depends on the returned shape.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    /// Yields the candidates this source knows about.
    ///
    /// # Errors
    ///
    /// Returns an implementation-defined error when discovery fails outright;
    /// partial discovery should return the candidates found so far instead.
    async fn candidates(&self) -> anyhow::Result<Vec<Candidate>>;
}

/// In-memory candidate source wrapping an already-discovered list.
///
/// The CLI funnels its assembled candidates through this so the pipeline
/// only ever sees the [`CandidateSource`] seam; tests use it directly.
#[derive(Debug, Default)]
pub struct StaticCandidates {
    items: Vec<Candidate>,
}

impl StaticCandidates {
    /// Wraps an already-discovered candidate list.
    #[must_use]
    pub fn new(items: Vec<Candidate>) -> Self {
        Self { items }
    }
}

#[async_trait]
impl CandidateSource for StaticCandidates {
    async fn candidates(&self) -> anyhow::Result<Vec<Candidate>> {
        Ok(self.items.clone())
    }
}
