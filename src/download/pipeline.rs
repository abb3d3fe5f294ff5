//! Download pipeline orchestration.
//!
//! For each candidate: sanitize the suggested name, short-circuit when a
//! valid artifact already exists, fetch, validate headers before writing and
//! actual size after, and keep partial files off disk via a scoped cleanup
//! guard. Per-candidate failures become [`DownloadResult`] outcomes; they
//! never abort the batch.

use std::fmt;
use std::path::{Path, PathBuf};

use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::candidate::Candidate;
use crate::config::Config;

use super::client::HttpClient;
use super::error::DownloadError;
use super::filename::sanitize_document_name;
use super::validate::{Rejection, Validator};

/// Outcome status of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    /// Artifact fetched, validated, and written.
    Success,
    /// A valid artifact already existed at the target path; no network call.
    SkippedExisting,
    /// The artifact failed validation; nothing persisted. Permanent skip.
    Rejected(Rejection),
    /// Fetch or filesystem failure; retried only by re-running the batch.
    Failed(String),
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::SkippedExisting => write!(f, "skipped-existing"),
            Self::Rejected(rejection) => write!(f, "rejected ({rejection})"),
            Self::Failed(error) => write!(f, "failed ({error})"),
        }
    }
}

/// Result of processing one candidate. Consumed once, not persisted.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// Stable identifier: the sanitized filename without its extension.
    pub identifier: String,
    /// Target path of the artifact (present even for failures).
    pub file_path: PathBuf,
    /// Bytes on disk for `Success`/`SkippedExisting`, zero otherwise.
    pub byte_size: u64,
    /// What happened.
    pub status: DownloadStatus,
}

impl DownloadResult {
    /// True for outcomes that leave a valid artifact at `file_path`.
    #[must_use]
    pub fn has_artifact(&self) -> bool {
        matches!(
            self.status,
            DownloadStatus::Success | DownloadStatus::SkippedExisting
        )
    }
}

/// Tally of outcomes across one batch run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Candidates fetched and persisted.
    pub succeeded: usize,
    /// Candidates skipped because a valid artifact already existed.
    pub skipped: usize,
    /// Candidates rejected by validation.
    pub rejected: usize,
    /// Candidates that failed at the network or filesystem level.
    pub failed: usize,
}

impl RunStats {
    fn record(&mut self, status: &DownloadStatus) {
        match status {
            DownloadStatus::Success => self.succeeded += 1,
            DownloadStatus::SkippedExisting => self.skipped += 1,
            DownloadStatus::Rejected(_) => self.rejected += 1,
            DownloadStatus::Failed(_) => self.failed += 1,
        }
    }

    /// Total candidates processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.rejected + self.failed
    }
}

/// Sleeps a randomized politeness interval drawn from `delay_ms`.
///
/// A `(0, 0)` range disables the delay. This is backoff etiquette toward the
/// hosts being fetched from, not a correctness mechanism.
pub async fn polite_delay(delay_ms: (u64, u64)) {
    let (min, max) = delay_ms;
    if max == 0 {
        return;
    }
    let millis = if min >= max {
        max
    } else {
        rand::thread_rng().gen_range(min..=max)
    };
    tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
}

/// Removes a partially written file on every exit path unless disarmed.
///
/// Created after header validation passes and disarmed only once the written
/// artifact clears the actual-size check, so no partial document outlives
/// its pipeline invocation.
struct PartialFileGuard<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> PartialFileGuard<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialFileGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            debug!(path = %self.path.display(), "removing partial artifact");
            if let Err(e) = std::fs::remove_file(self.path)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                warn!(path = %self.path.display(), error = %e, "failed to remove partial artifact");
            }
        }
    }
}

/// Internal: everything that can end one candidate short of success.
enum Setback {
    Rejected(Rejection),
    Failed(DownloadError),
}

impl From<Rejection> for Setback {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

impl From<DownloadError> for Setback {
    fn from(error: DownloadError) -> Self {
        Self::Failed(error)
    }
}

/// Orchestrates fetch, validation, and persistence for candidates.
///
/// Designed single-threaded: candidates are processed sequentially with a
/// politeness delay between network operations. Safe to re-run on the same
/// candidate list; the existence short-circuit makes re-runs idempotent.
#[derive(Debug)]
pub struct DownloadPipeline {
    download_dir: PathBuf,
    min_size_bytes: u64,
    delay_ms: (u64, u64),
    client: HttpClient,
    validator: Validator,
}

impl DownloadPipeline {
    /// Builds a pipeline from the run configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            download_dir: config.download_dir.clone(),
            min_size_bytes: config.min_size_bytes(),
            delay_ms: config.delay_ms,
            client: HttpClient::new(config.request_timeout, config.fallback_transport_enabled),
            validator: Validator::new(config.min_size_bytes()),
        }
    }

    /// Processes one candidate through the full pipeline.
    ///
    /// Never returns an error: network, validation, and filesystem problems
    /// are folded into the result's [`DownloadStatus`].
    #[instrument(skip(self, candidate), fields(url = %candidate.source_url))]
    pub async fn process(&self, candidate: &Candidate) -> DownloadResult {
        let filename = sanitize_document_name(&candidate.suggested_name);
        let identifier = identifier_from_filename(&filename);
        let file_path = self.download_dir.join(&filename);

        // Existence short-circuit: a valid prior artifact means no network
        // call at all; an undersized one is a corrupt earlier attempt.
        match tokio::fs::metadata(&file_path).await {
            Ok(meta) if meta.len() >= self.min_size_bytes => {
                info!(path = %file_path.display(), bytes = meta.len(), "valid artifact already exists");
                return DownloadResult {
                    identifier,
                    file_path,
                    byte_size: meta.len(),
                    status: DownloadStatus::SkippedExisting,
                };
            }
            Ok(meta) => {
                warn!(
                    path = %file_path.display(),
                    bytes = meta.len(),
                    "existing artifact undersized; deleting and re-fetching"
                );
                if let Err(e) = tokio::fs::remove_file(&file_path).await {
                    let error = DownloadError::io(&file_path, e);
                    return DownloadResult {
                        identifier,
                        file_path,
                        byte_size: 0,
                        status: DownloadStatus::Failed(error.to_string()),
                    };
                }
            }
            Err(_) => {}
        }

        let (byte_size, status) = match self.fetch_and_persist(candidate, &file_path).await {
            Ok(bytes) => (bytes, DownloadStatus::Success),
            Err(Setback::Rejected(rejection)) => {
                info!(url = %candidate.source_url, reason = %rejection, "artifact rejected");
                (0, DownloadStatus::Rejected(rejection))
            }
            Err(Setback::Failed(error)) => {
                warn!(url = %candidate.source_url, error = %error, "download failed");
                (0, DownloadStatus::Failed(error.to_string()))
            }
        };

        DownloadResult {
            identifier,
            file_path,
            byte_size,
            status,
        }
    }

    /// Fetch, validate, and write one artifact.
    ///
    /// Header validation runs before any bytes land on disk; the cleanup
    /// guard covers the window between first write and the actual-size check.
    async fn fetch_and_persist(
        &self,
        candidate: &Candidate,
        file_path: &Path,
    ) -> Result<u64, Setback> {
        let response = self.client.fetch(&candidate.source_url).await?;

        self.validator
            .check_headers(response.content_type().as_deref(), response.content_length())?;

        let guard = PartialFileGuard::new(file_path);
        let written = response.stream_to_file(file_path).await?;
        self.validator.check_size(written)?;
        guard.disarm();

        info!(path = %file_path.display(), bytes = written, "download complete");
        Ok(written)
    }

    /// Processes a batch of candidates sequentially.
    ///
    /// Applies the politeness delay between candidates that actually hit the
    /// network; existence skips cost nothing and trigger no delay.
    pub async fn run(&self, candidates: &[Candidate]) -> (Vec<DownloadResult>, RunStats) {
        let mut results = Vec::with_capacity(candidates.len());
        let mut stats = RunStats::default();

        info!(candidates = candidates.len(), "starting batch");

        for (index, candidate) in candidates.iter().enumerate() {
            let result = self.process(candidate).await;
            info!(
                identifier = %result.identifier,
                status = %result.status,
                "candidate processed"
            );
            stats.record(&result.status);

            let touched_network = !matches!(result.status, DownloadStatus::SkippedExisting);
            results.push(result);

            if touched_network && index + 1 < candidates.len() {
                polite_delay(self.delay_ms).await;
            }
        }

        info!(
            succeeded = stats.succeeded,
            skipped = stats.skipped,
            rejected = stats.rejected,
            failed = stats.failed,
            total = stats.total(),
            "batch complete"
        );

        (results, stats)
    }
}

/// Identifier for the metadata store: the filename minus its `.pdf` suffix.
fn identifier_from_filename(filename: &str) -> String {
    filename
        .get(..filename.len().saturating_sub(".pdf".len()))
        .unwrap_or(filename)
        .to_string()
}
