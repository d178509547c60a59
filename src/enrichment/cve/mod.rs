//! CVE annotation of changelog entries.
//!
//! [`CveAnnotator`] scans change lines for `CVE-YYYY-NNNN` identifiers and
//! resolves each one against the Ubuntu CVE tracker. Lookups never fail the
//! caller: an identifier the tracker cannot describe becomes a placeholder
//! record with priority `n/a`.

#[cfg(feature = "network")]
mod client;
mod parser;

#[cfg(feature = "network")]
pub use client::{CveTrackerClient, CveTrackerConfig};
pub use parser::{parse_cve_metadata, CveMetadata};

use super::traits::{CveLocation, CveMetadataSource};
use crate::model::{cve_url, CveRecord, DEFAULT_CVE_URL_BASE, UNKNOWN_PRIORITY};
use crate::utils::RetryPolicy;
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Plain-text view of the ubuntu-cve-tracker repository.
pub const DEFAULT_TRACKER_BASE: &str = "https://git.launchpad.net/ubuntu-cve-tracker/plain";

static CVE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"CVE-\d+-\d+").expect("static regex"));

/// Distinct CVE identifiers in `lines`, in first-seen order.
#[must_use]
pub fn find_cve_ids<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for line in lines {
        for found in CVE_ID.find_iter(line.as_ref()) {
            if !ids.iter().any(|id| id == found.as_str()) {
                ids.push(found.as_str().to_string());
            }
        }
    }
    ids
}

/// Resolves CVE identifiers in changelog text to tracker records.
///
/// Records are memoized per identifier for the lifetime of the annotator, so
/// a CVE mentioned by several packages is fetched once.
pub struct CveAnnotator<S> {
    source: S,
    retry: RetryPolicy,
    url_base: String,
    memo: RefCell<HashMap<String, CveRecord>>,
}

impl<S: CveMetadataSource> CveAnnotator<S> {
    pub fn new(source: S, retry: RetryPolicy) -> Self {
        Self {
            source,
            retry,
            url_base: DEFAULT_CVE_URL_BASE.to_string(),
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// Override the base of the per-CVE web page URL.
    #[must_use]
    pub fn with_url_base(mut self, url_base: impl Into<String>) -> Self {
        self.url_base = url_base.into();
        self
    }

    /// One record per distinct CVE mentioned in `lines`, in first-seen order.
    pub fn annotate<L: AsRef<str>>(&self, lines: &[L]) -> Vec<CveRecord> {
        find_cve_ids(lines)
            .into_iter()
            .map(|id| self.lookup(&id))
            .collect()
    }

    /// Resolve a single identifier, falling back to a placeholder.
    pub fn lookup(&self, id: &str) -> CveRecord {
        if let Some(record) = self.memo.borrow().get(id) {
            return record.clone();
        }

        let record = self.fetch_record(id);
        self.memo
            .borrow_mut()
            .insert(id.to_string(), record.clone());
        record
    }

    fn fetch_record(&self, id: &str) -> CveRecord {
        for location in CveLocation::ALL {
            match self
                .retry
                .retry_transient(|| self.source.fetch(id, location))
            {
                Ok(lines) => {
                    let meta = parse_cve_metadata(&lines);
                    tracing::debug!("{} found in {} ({})", id, location, self.source.name());
                    return CveRecord {
                        id: id.to_string(),
                        url: cve_url(&self.url_base, id),
                        description: meta.description,
                        priority: meta
                            .priority
                            .unwrap_or_else(|| UNKNOWN_PRIORITY.to_string()),
                        public_date: meta.public_date.unwrap_or_default(),
                    };
                }
                Err(e) if e.is_not_found() => {
                    tracing::trace!("{} not in {}", id, location);
                }
                Err(e) => {
                    tracing::warn!("Unable to fetch {} from {}: {}", id, location, e);
                }
            }
        }

        tracing::debug!("No tracker record for {}, using placeholder", id);
        CveRecord::placeholder(id, &self.url_base)
    }

    /// Number of distinct identifiers resolved so far.
    #[must_use]
    pub fn resolved_count(&self) -> usize {
        self.memo.borrow().len()
    }
}
