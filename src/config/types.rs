//! Configuration types for cloud-image-changelog.

use super::defaults::{
    DEFAULT_ADDED_PACKAGE_ENTRIES, DEFAULT_API_BASE, DEFAULT_ARCHITECTURE,
    DEFAULT_CVE_TRACKER_BASE, DEFAULT_CVE_URL_BASE, DEFAULT_DISTRIBUTION,
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_UNIT_MS, DEFAULT_TIMEOUT_SECS,
};
use crate::reports::ReportFormat;
use crate::utils::RetryPolicy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Unified application configuration that can be loaded from CLI args or config files.
///
/// CLI arguments are layered over the file settings with [`AppConfig::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// Package archive access
    pub archive: ArchiveConfig,
    /// CVE highlighting
    pub cve: CveConfig,
    /// Retry policy for every remote call
    pub retry: RetryConfig,
    /// Output configuration (format, file, colors)
    pub output: OutputConfig,
    /// Behavior flags
    pub behavior: BehaviorConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// ============================================================================
// Command Configuration
// ============================================================================

/// Manifest inputs of the generate command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratePaths {
    pub from_manifest: PathBuf,
    pub to_manifest: PathBuf,
}

/// Everything the generate command needs: the merged application config
/// plus the per-invocation image details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateConfig {
    pub app: AppConfig,
    pub paths: GeneratePaths,
    /// Series of the "from" image, codename or version
    pub from_series: String,
    pub to_series: String,
    pub from_serial: Option<String>,
    pub to_serial: Option<String>,
    /// Notes copied verbatim into the report
    pub notes: Option<String>,
    /// Also write the JSON report to this file
    pub output_json: Option<PathBuf>,
}

// ============================================================================
// Sub-configuration Types
// ============================================================================

/// Launchpad archive configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Launchpad API root
    pub api_base: String,
    /// Distribution name
    pub distribution: String,
    /// Image architecture used to look up binary publications
    pub architecture: String,
    /// PPAs (`owner/name`) consulted after the main archive, in order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ppas: Vec<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            distribution: DEFAULT_DISTRIBUTION.to_string(),
            architecture: DEFAULT_ARCHITECTURE.to_string(),
            ppas: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ArchiveConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// CVE lookup configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CveConfig {
    /// Look up and print CVEs referenced in changelogs
    pub enabled: bool,
    /// Plain-text base of the CVE tracker
    pub tracker_base: String,
    /// Base of the CVE web pages linked from the report
    pub url_base: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            tracker_base: DEFAULT_CVE_TRACKER_BASE.to_string(),
            url_base: DEFAULT_CVE_URL_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl CveConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry configuration for remote calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per call
    pub attempts: u32,
    /// Backoff unit in milliseconds; attempt k waits k-1 units
    pub delay_unit_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_RETRY_ATTEMPTS,
            delay_unit_ms: DEFAULT_RETRY_DELAY_UNIT_MS,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.delay_unit_ms))
    }
}

/// Output-related configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    pub format: ReportFormat,
    /// Output file path (None for stdout)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// Indent JSON output
    pub pretty: bool,
    /// Disable colored output
    pub no_color: bool,
}

/// Behavior flags for the generate run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Changelog entries shown for an added package without a renamed predecessor
    pub added_package_entries: usize,
    /// Suppress non-essential output
    pub quiet: bool,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            added_package_entries: DEFAULT_ADDED_PACKAGE_ENTRIES,
            quiet: false,
        }
    }
}
