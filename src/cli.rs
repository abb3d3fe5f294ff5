//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use harvester_core::config::{DEFAULT_DELAY_MS, DEFAULT_MIN_SIZE_KB, DEFAULT_TIMEOUT_SECS};

/// Fetch, validate, and catalog open-access PDF documents.
///
/// Harvester takes candidate document URLs (or DOIs resolved through an
/// open-access API), downloads each PDF once, rejects junk by size and
/// content type, and records successful downloads in a deduplicated
/// metadata file that survives across runs.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// URLs or DOIs to fetch; reads stdin when omitted
    pub inputs: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Directory that receives downloaded documents
    #[arg(short = 'o', long, default_value = "downloads")]
    pub output_dir: PathBuf,

    /// Metadata record file; defaults to records.json inside the output directory
    #[arg(short = 'm', long)]
    pub metadata_file: Option<PathBuf>,

    /// Minimum accepted document size in KiB
    #[arg(long, default_value_t = DEFAULT_MIN_SIZE_KB)]
    pub min_size_kb: u64,

    /// Per-request deadline in seconds
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Minimum politeness delay between network operations, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DELAY_MS.0)]
    pub delay_min_ms: u64,

    /// Maximum politeness delay between network operations, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DELAY_MS.1)]
    pub delay_max_ms: u64,

    /// Disable the browser-UA fallback transport
    #[arg(long)]
    pub no_fallback: bool,

    /// Contact email sent to the open-access resolution API
    #[arg(long, default_value = "harvester@example.com")]
    pub email: String,
}

impl Args {
    /// Metadata path: explicit flag, or `records.json` under the output dir.
    #[must_use]
    pub fn metadata_path(&self) -> PathBuf {
        self.metadata_file
            .clone()
            .unwrap_or_else(|| self.output_dir.join("records.json"))
    }

    /// Politeness delay range, rejecting an inverted min/max pair.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message when `--delay-min-ms` exceeds
    /// `--delay-max-ms`.
    pub fn delay_range(&self) -> Result<(u64, u64), String> {
        if self.delay_min_ms > self.delay_max_ms {
            return Err(format!(
                "--delay-min-ms ({}) must not exceed --delay-max-ms ({})",
                self.delay_min_ms, self.delay_max_ms
            ));
        }
        Ok((self.delay_min_ms, self.delay_max_ms))
    }
}
