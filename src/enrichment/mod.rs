//! Enrichment of changelog entries with data from remote sources.
//!
//! Two concerns live here: CVE annotation against the Ubuntu CVE tracker and
//! the run-scoped changelog cache that keeps repeated source lookups cheap.
//!
//! # Example
//!
//! ```no_run
//! use cloud_image_changelog::enrichment::{CveAnnotator, CveTrackerClient, CveTrackerConfig};
//! use cloud_image_changelog::utils::RetryPolicy;
//!
//! let client = CveTrackerClient::new(CveTrackerConfig::default()).unwrap();
//! let annotator = CveAnnotator::new(client, RetryPolicy::default());
//! let cves = annotator.annotate(&["  * SECURITY UPDATE: CVE-2023-3390"]);
//! assert_eq!(cves.len(), 1);
//! ```

mod cache;
pub mod cve;
mod traits;

pub use cache::{CacheKey, CacheStats, CachedChangelog, ChangelogCache};
#[cfg(feature = "network")]
pub use cve::{CveTrackerClient, CveTrackerConfig};
pub use cve::{
    find_cve_ids, parse_cve_metadata, CveAnnotator, CveMetadata, DEFAULT_TRACKER_BASE,
};
pub use traits::{CveLocation, CveMetadataSource};

/// A metadata source that knows no CVEs.
///
/// Used when CVE lookups are disabled; every identifier then resolves to a
/// placeholder record.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineCveSource;

impl CveMetadataSource for OfflineCveSource {
    fn fetch(&self, id: &str, location: CveLocation) -> crate::Result<Vec<String>> {
        Err(crate::ChangelogError::not_found(
            "offline",
            format!("{location}/{id}"),
        ))
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}
