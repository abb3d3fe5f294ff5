//! Immutable run configuration.
//!
//! All tunable values (paths, thresholds, timeouts, delay range) live in a
//! single [`Config`] constructed once at startup and passed by reference into
//! each component. There are no process-wide mutable globals.

use std::path::PathBuf;
use std::time::Duration;

/// Default minimum artifact size in KiB. Anything smaller is treated as
/// "too small to be a real document" (error pages, stub redirects).
pub const DEFAULT_MIN_SIZE_KB: u64 = 10;

/// Default per-request deadline in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default politeness delay range between network operations, in milliseconds.
pub const DEFAULT_DELAY_MS: (u64, u64) = (1000, 3000);

/// Configuration for a harvest run.
///
/// Constructed once (typically from CLI flags) and shared by reference.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory that receives one file per accepted artifact.
    pub download_dir: PathBuf,
    /// Path of the persisted metadata record file (JSON array).
    pub metadata_path: PathBuf,
    /// Minimum accepted artifact size in KiB.
    pub min_size_kb: u64,
    /// Per-request deadline for fetches.
    pub request_timeout: Duration,
    /// Whether the browser-UA fallback transport may be attempted.
    pub fallback_transport_enabled: bool,
    /// Inclusive (min, max) politeness delay range in milliseconds.
    /// `(0, 0)` disables the delay entirely (used by tests).
    pub delay_ms: (u64, u64),
    /// Search result page range, consumed only by candidate suppliers.
    pub page_range: Option<(u32, u32)>,
}

impl Config {
    /// Minimum accepted artifact size in bytes.
    #[must_use]
    pub fn min_size_bytes(&self) -> u64 {
        self.min_size_kb * 1024
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            download_dir: PathBuf::from("downloads"),
            metadata_path: PathBuf::from("records.json"),
            min_size_kb: DEFAULT_MIN_SIZE_KB,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            fallback_transport_enabled: true,
            delay_ms: DEFAULT_DELAY_MS,
            page_range: None,
        }
    }
}
