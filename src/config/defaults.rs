//! Default values for cloud-image-changelog configuration.

use crate::utils::retry::{DEFAULT_ATTEMPTS, DEFAULT_DELAY_UNIT};

/// Launchpad web service root.
pub const DEFAULT_API_BASE: &str = crate::archive::DEFAULT_API_BASE;

/// Distribution the images are built from.
pub const DEFAULT_DISTRIBUTION: &str = "ubuntu";

/// Image architecture when none is given.
pub const DEFAULT_ARCHITECTURE: &str = "amd64";

/// Per-request HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Plain-text base of the Ubuntu CVE tracker.
pub const DEFAULT_CVE_TRACKER_BASE: &str = crate::enrichment::DEFAULT_TRACKER_BASE;

/// Base of the human-readable CVE pages.
pub const DEFAULT_CVE_URL_BASE: &str = crate::model::DEFAULT_CVE_URL_BASE;

/// Attempts per remote call.
pub const DEFAULT_RETRY_ATTEMPTS: u32 = DEFAULT_ATTEMPTS;

/// Backoff unit in milliseconds.
#[allow(clippy::cast_possible_truncation)]
pub const DEFAULT_RETRY_DELAY_UNIT_MS: u64 = DEFAULT_DELAY_UNIT.as_millis() as u64;

/// Changelog entries shown for a newly added package.
pub const DEFAULT_ADDED_PACKAGE_ENTRIES: usize = crate::pipeline::DEFAULT_ADDED_PACKAGE_ENTRIES;
