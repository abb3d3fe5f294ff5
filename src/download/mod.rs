//! Fetch-validate-persist pipeline for PDF documents.
//!
//! This module contains the core of the tool:
//!
//! - [`sanitize_document_name`] - safe, stable filenames from raw suggestions
//! - [`Validator`] - size/content-type acceptance rules
//! - [`HttpClient`] - streaming fetcher with a one-shot fallback transport
//! - [`DownloadPipeline`] - orchestration: skip, fetch, validate, persist
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::{Candidate, Config, DownloadPipeline};
//!
//! # async fn example() {
//! let config = Config::default();
//! let pipeline = DownloadPipeline::new(&config);
//! let candidate = Candidate::new("https://example.com/paper.pdf", "paper");
//! let result = pipeline.process(&candidate).await;
//! println!("{}: {}", result.identifier, result.status);
//! # }
//! ```

mod client;
mod error;
mod filename;
mod pipeline;
mod validate;

pub use client::{BROWSER_USER_AGENT, FetchResponse, HttpClient};
pub use error::DownloadError;
pub use filename::sanitize_document_name;
pub use pipeline::{DownloadPipeline, DownloadResult, DownloadStatus, RunStats, polite_delay};
pub use validate::{Rejection, Validator};
