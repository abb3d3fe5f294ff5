//! Deduplicated JSON metadata store.
//!
//! The store is the only durable state across runs: a JSON array of
//! [`MetadataRecord`]s, one per successfully downloaded identifier. Merging
//! is read-merge-rewrite with first-write-wins dedup, and the rewrite goes
//! through a temp file plus rename so the file on disk is always a complete
//! snapshot.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Metadata about one successfully downloaded artifact.
///
/// `identifier` is the unique key; records are never mutated in place once
/// stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataRecord {
    /// Stable unique key (sanitized filename stem or DOI-derived id).
    pub identifier: String,
    /// URL the artifact was fetched from.
    pub source_url: String,
    /// Path of the artifact on disk at time of write.
    pub file_path: String,
    /// Free-form attributes (byte size, DOI, titles from suppliers, ...).
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl MetadataRecord {
    /// Creates a record with no attributes.
    #[must_use]
    pub fn new(
        identifier: impl Into<String>,
        source_url: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            source_url: source_url.into(),
            file_path: file_path.into(),
            attributes: HashMap::new(),
        }
    }

    /// Adds one attribute, builder style.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Errors from persisting the merged store.
///
/// A corrupt *existing* store is deliberately not an error: it is recovered
/// by treating it as empty. Failing to write the merged snapshot is the one
/// run-ending condition.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure while writing the snapshot.
    #[error("IO error writing metadata store {path}: {source}")]
    Io {
        /// The store path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The merged collection could not be serialized.
    #[error("failed to serialize metadata store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Handle on the persisted metadata file.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    /// Creates a handle for the store at `path`. Nothing is read until
    /// [`merge`](Self::merge) or [`load`](Self::load) is called.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The persisted path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the existing record set.
    ///
    /// A missing, empty, or unparseable file yields an empty base with a
    /// warning; losing a corrupt store must never abort the whole run.
    pub async fn load(&self) -> Vec<MetadataRecord> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no existing metadata store");
                return Vec::new();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read metadata store; starting empty");
                return Vec::new();
            }
        };

        if bytes.is_empty() {
            return Vec::new();
        }

        match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "metadata store unparseable; starting empty"
                );
                Vec::new()
            }
        }
    }

    /// Merges new records into the persisted store.
    ///
    /// First-write-wins per identifier: records already present keep their
    /// attributes, later duplicates (including within `new_records` itself)
    /// are silently dropped. The full merged collection is rewritten as one
    /// snapshot (temp file + rename). Returns the final record count.
    ///
    /// Not safe under concurrent writers; a parallel caller must serialize
    /// merges through a lock or a single owning task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the merged snapshot cannot be serialized
    /// or written.
    pub async fn merge(&self, new_records: &[MetadataRecord]) -> Result<usize, StoreError> {
        let mut merged = self.load().await;
        let mut seen: HashSet<String> = merged.iter().map(|r| r.identifier.clone()).collect();

        let mut appended = 0usize;
        for record in new_records {
            if seen.insert(record.identifier.clone()) {
                merged.push(record.clone());
                appended += 1;
            } else {
                debug!(identifier = %record.identifier, "duplicate identifier dropped");
            }
        }

        self.write_snapshot(&merged).await?;

        info!(
            path = %self.path.display(),
            appended,
            total = merged.len(),
            "metadata store merged"
        );
        Ok(merged.len())
    }

    /// Writes the full collection as one snapshot.
    ///
    /// The bytes go to a sibling temp file first and are renamed over the
    /// store path, so readers never observe a half-written file.
    async fn write_snapshot(&self, records: &[MetadataRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(records)?;

        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &json)
            .await
            .map_err(|e| StoreError::Io {
                path: tmp_path.clone(),
                source: e,
            })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| StoreError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        Ok(())
    }
}
