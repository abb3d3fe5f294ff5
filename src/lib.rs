//! Harvester Core Library
//!
//! This library implements the fetch-validate-persist pipeline behind the
//! `harvester` tool: given candidate PDF URLs discovered by external scraping
//! or search glue, it downloads each document robustly, validates the result
//! against size and content-type heuristics, and merges a metadata record
//! into a durable, deduplicated store.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`candidate`] - The `(source_url, suggested_name)` contract with suppliers
//! - [`config`] - Immutable run configuration
//! - [`download`] - Fetcher, validator, sanitizer, and the download pipeline
//! - [`parser`] - Free-text input parsing (URLs, DOIs)
//! - [`resolver`] - Open-access PDF resolution for DOI inputs
//! - [`store`] - Deduplicated JSON metadata store

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod candidate;
pub mod config;
pub mod download;
pub mod parser;
pub mod resolver;
pub mod store;

// Re-export commonly used types
pub use candidate::{Candidate, CandidateSource, StaticCandidates};
pub use config::Config;
pub use download::{
    BROWSER_USER_AGENT, DownloadError, DownloadPipeline, DownloadResult, DownloadStatus,
    HttpClient, Rejection, RunStats, Validator, sanitize_document_name,
};
pub use parser::{InputKind, ParseResult, parse_input};
pub use resolver::UnpaywallResolver;
pub use store::{MetadataRecord, MetadataStore, StoreError};
