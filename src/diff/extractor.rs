//! Changelog range extraction.
//!
//! Given a changelog (newest first) and a version range, isolate exactly the
//! blocks introduced between the two versions. The range is half-open:
//! `(from_version, to_version]`.
//!
//! Versions are matched through [`variants`] on both sides, so a manifest
//! version like `15.7-0ubuntu1+signed1` still finds the `15.7-0ubuntu1`
//! changelog block. Matching is always whole-string, never by prefix.

use crate::error::Result;
use crate::model::{ChangelogBlock, ChangelogDocument};
use crate::utils::{compare_versions, variants, VersionVariantSet};
use std::cmp::Ordering;
use std::fmt;

/// Which blocks to extract from a changelog.
///
/// * no versions: the `max_count` newest blocks;
/// * `to_version` only: up to `max_count` blocks starting at `to_version`;
/// * both versions: every block in `(from, to]`, `max_count` ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeRequest<'a> {
    pub from_version: Option<&'a str>,
    pub to_version: Option<&'a str>,
    pub max_count: Option<usize>,
}

impl<'a> RangeRequest<'a> {
    /// Every block after `from_version` up to and including `to_version`.
    #[must_use]
    pub const fn between(from_version: &'a str, to_version: &'a str) -> Self {
        Self {
            from_version: Some(from_version),
            to_version: Some(to_version),
            max_count: None,
        }
    }

    /// The `count` most recent blocks ending at `to_version`.
    #[must_use]
    pub const fn latest(to_version: &'a str, count: usize) -> Self {
        Self {
            from_version: None,
            to_version: Some(to_version),
            max_count: Some(count),
        }
    }

    /// The `count` newest blocks of the document.
    #[must_use]
    pub const fn newest(count: usize) -> Self {
        Self {
            from_version: None,
            to_version: None,
            max_count: Some(count),
        }
    }

    /// The effective block limit: ignored once the range is bounded on both ends.
    const fn limit(&self) -> Option<usize> {
        match (self.from_version, self.to_version) {
            (Some(_), Some(_)) => None,
            _ => self.max_count,
        }
    }
}

/// A requested boundary that never matched inside the changelog.
///
/// This is a diagnostic: the extraction still returns whatever it found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeNotFullyResolved {
    pub missing_to: Option<String>,
    pub missing_from: Option<String>,
}

impl fmt::Display for RangeNotFullyResolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.missing_to, &self.missing_from) {
            (Some(to), Some(from)) => write!(
                f,
                "neither to_version {to} nor from_version {from} appear in the changelog"
            ),
            (Some(to), None) => write!(f, "to_version {to} does not appear in the changelog"),
            (None, Some(from)) => {
                write!(f, "from_version {from} does not appear in the changelog")
            }
            (None, None) => write!(f, "range fully resolved"),
        }
    }
}

/// Result of walking a changelog for a range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeExtraction {
    /// Matched blocks in document (newest-first) order
    pub blocks: Vec<ChangelogBlock>,
    unresolved: Option<RangeNotFullyResolved>,
}

impl RangeExtraction {
    /// The unresolved boundaries, if any requested version never matched.
    #[must_use]
    pub const fn unresolved(&self) -> Option<&RangeNotFullyResolved> {
        self.unresolved.as_ref()
    }

    #[must_use]
    pub const fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    NotStarted,
    InRange,
    Ended,
}

/// Extract the blocks of `document` selected by `request`.
///
/// Pure function of its inputs; never reorders blocks.
#[must_use]
pub fn extract(document: &ChangelogDocument, request: &RangeRequest<'_>) -> RangeExtraction {
    if request.from_version.is_none() && request.to_version.is_none() {
        let take = request.max_count.unwrap_or(usize::MAX);
        return RangeExtraction {
            blocks: document.iter().take(take).cloned().collect(),
            unresolved: None,
        };
    }

    let to_variants = request.to_version.map(variants);
    let from_variants = request.from_version.map(variants);
    let limit = request.limit();

    // Without a to_version the range starts at the newest block.
    let mut state = if to_variants.is_some() {
        WalkState::NotStarted
    } else {
        WalkState::InRange
    };
    let mut from_matched = false;
    let mut accumulated: Vec<ChangelogBlock> = Vec::new();

    for block in document {
        if limit.is_some_and(|max| accumulated.len() >= max) {
            break;
        }

        let block_variants = block.version_variants();

        if state == WalkState::NotStarted
            && matches_any(block_variants.as_ref(), to_variants.as_ref())
        {
            state = WalkState::InRange;
            accumulated.clear();
        }

        if matches_any(block_variants.as_ref(), from_variants.as_ref()) {
            from_matched = true;
            state = WalkState::Ended;
        }

        match state {
            WalkState::Ended => break,
            WalkState::InRange => {
                warn_if_newer(block, request.to_version);
                accumulated.push(block.clone());
            }
            WalkState::NotStarted => {}
        }
    }

    let to_matched = to_variants.is_none() || state != WalkState::NotStarted;
    let missing_to = (!to_matched).then(|| request.to_version.unwrap_or_default().to_string());
    // When the walk stopped on max_count, from_version was never expected to show up.
    let missing_from = match request.from_version {
        Some(from) if !from_matched && limit.is_none() => Some(from.to_string()),
        _ => None,
    };

    let unresolved =
        (missing_to.is_some() || missing_from.is_some()).then_some(RangeNotFullyResolved {
            missing_to,
            missing_from,
        });

    RangeExtraction {
        blocks: accumulated,
        unresolved,
    }
}

/// Parse raw changelog text and extract a range from it.
///
/// Fails with [`crate::ChangelogError::MalformedChangelog`] when the text holds
/// no changelog blocks at all.
pub fn extract_from_text(text: &str, request: &RangeRequest<'_>) -> Result<RangeExtraction> {
    let document = ChangelogDocument::parse(text)?;
    Ok(extract(&document, request))
}

fn matches_any(block: Option<&VersionVariantSet>, target: Option<&VersionVariantSet>) -> bool {
    match (block, target) {
        (Some(block), Some(target)) => block.intersects(target),
        _ => false,
    }
}

/// Blocks inside the range should not be newer than `to_version`. A newer
/// one is reported but kept; the "to" block itself can be newer when it only
/// matched through a stripped variant.
fn warn_if_newer(block: &ChangelogBlock, to_version: Option<&str>) {
    if let (Some(version), Some(to)) = (block.version.as_deref(), to_version) {
        if compare_versions(version, to) == Ordering::Greater {
            tracing::warn!(
                "Changelog block version {} is unexpectedly greater than to_version {}",
                version,
                to
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn block(version: &str) -> ChangelogBlock {
        ChangelogBlock {
            package: "pkg".to_string(),
            version: (!version.is_empty()).then(|| version.to_string()),
            distributions: "noble".to_string(),
            urgency: "medium".to_string(),
            changes: vec![format!("  * Release {version}")],
            author: "A <a@example.com>".to_string(),
            date: "Mon, 01 Jan 2024 00:00:00 +0000".to_string(),
            lp_bugs_closed: Vec::new(),
        }
    }

    fn doc(versions: &[&str]) -> ChangelogDocument {
        ChangelogDocument::from_blocks(versions.iter().map(|v| block(v)).collect())
    }

    fn versions(extraction: &RangeExtraction) -> Vec<&str> {
        extraction
            .blocks
            .iter()
            .map(|b| b.version.as_deref().unwrap_or(""))
            .collect()
    }

    #[test]
    fn test_newest_mode() {
        let d = doc(&["5", "4", "3", "2", "1"]);
        let result = extract(&d, &RangeRequest::newest(3));
        assert_eq!(versions(&result), vec!["5", "4", "3"]);
        assert!(result.is_fully_resolved());

        let all = extract(&d, &RangeRequest::default());
        assert_eq!(all.blocks.len(), 5);
    }

    #[test]
    fn test_half_open_range() {
        let d = doc(&["5", "4", "3", "2", "1"]);
        let result = extract(&d, &RangeRequest::between("2", "4"));
        assert_eq!(versions(&result), vec!["4", "3"]);
        assert!(result.is_fully_resolved());
    }

    #[test]
    fn test_max_count_ignored_for_bounded_range() {
        let d = doc(&["5", "4", "3", "2", "1"]);
        let request = RangeRequest {
            from_version: Some("1"),
            to_version: Some("5"),
            max_count: Some(1),
        };
        assert_eq!(versions(&extract(&d, &request)), vec!["5", "4", "3", "2"]);
    }

    #[test]
    fn test_latest_mode_is_pure() {
        let d = doc(&["5", "4", "3", "2", "1"]);
        let request = RangeRequest::latest("4", 2);
        let first = extract(&d, &request);
        assert_eq!(versions(&first), vec!["4", "3"]);
        assert_eq!(first, extract(&d, &request));
    }

    #[test]
    fn test_missing_to_version() {
        let d = doc(&["5", "4", "3", "2", "1"]);
        let result = extract(&d, &RangeRequest::between("1", "9"));
        assert!(result.blocks.is_empty());
        let unresolved = result.unresolved().unwrap();
        assert_eq!(unresolved.missing_to.as_deref(), Some("9"));
        assert!(unresolved.missing_from.is_none());
    }

    #[test]
    fn test_missing_from_version_returns_tail() {
        let d = doc(&["5", "4", "3"]);
        let result = extract(&d, &RangeRequest::between("0", "4"));
        assert_eq!(versions(&result), vec!["4", "3"]);
        assert_eq!(result.unresolved().unwrap().missing_from.as_deref(), Some("0"));
    }

    #[test]
    fn test_from_equals_to_is_empty() {
        let d = doc(&["3", "2", "1"]);
        let result = extract(&d, &RangeRequest::between("2", "2"));
        assert!(result.blocks.is_empty());
        assert!(result.is_fully_resolved());
    }

    #[test]
    fn test_variant_matching() {
        let d = doc(&["1:2.0-1", "1.9-1", "15.7-0ubuntu1", "15.6-0ubuntu1"]);
        // Epoch stripped in the manifest
        let result = extract(&d, &RangeRequest::between("1.9-1", "2.0-1"));
        assert_eq!(versions(&result), vec!["1:2.0-1"]);

        // Signing suffix appended in the manifest
        let request = RangeRequest::between("15.6-0ubuntu1+signed1", "15.7-0ubuntu1+signed1");
        let result = extract(&d, &request);
        assert_eq!(versions(&result), vec!["15.7-0ubuntu1"]);
    }

    #[test]
    fn test_no_prefix_matching() {
        let d = doc(&["1.10-1", "1.1-1"]);
        let result = extract(&d, &RangeRequest::between("1.0", "1.1"));
        assert!(result.blocks.is_empty());
        assert!(result.unresolved().is_some());
    }

    #[test]
    fn test_unversioned_blocks_do_not_abort() {
        let d = doc(&["3", "", "2", "1"]);
        let result = extract(&d, &RangeRequest::between("1", "3"));
        assert_eq!(versions(&result), vec!["3", "", "2"]);
    }

    #[test]
    fn test_repeated_to_version_uses_first_match() {
        let d = doc(&["4", "3", "4", "2"]);
        let result = extract(&d, &RangeRequest::between("2", "4"));
        assert_eq!(versions(&result), vec!["4", "3", "4"]);
    }

    #[test]
    fn test_from_only_walks_from_newest() {
        let d = doc(&["3", "2", "1"]);
        let request = RangeRequest {
            from_version: Some("1"),
            to_version: None,
            max_count: None,
        };
        assert_eq!(versions(&extract(&d, &request)), vec!["3", "2"]);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn extract_with_logs(
        d: &ChangelogDocument,
        request: &RangeRequest<'_>,
    ) -> (RangeExtraction, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let result = tracing::subscriber::with_default(subscriber, || extract(d, request));
        (result, logs.text())
    }

    #[test]
    fn test_to_block_newer_than_requested_is_kept_with_warning() {
        let d = doc(&["1.0", "0.9"]);
        let (result, logs) = extract_with_logs(&d, &RangeRequest::between("0.9", "1.0~rc1"));

        assert_eq!(versions(&result), vec!["1.0"]);
        assert!(result.is_fully_resolved());
        assert!(
            logs.contains("1.0 is unexpectedly greater than to_version 1.0~rc1"),
            "logs: {logs}"
        );
    }

    #[test]
    fn test_exact_to_block_does_not_warn() {
        let d = doc(&["3", "2", "1"]);
        let (result, logs) = extract_with_logs(&d, &RangeRequest::between("1", "3"));
        assert_eq!(versions(&result), vec!["3", "2"]);
        assert!(!logs.contains("unexpectedly greater"), "logs: {logs}");
    }

    #[test]
    fn test_extract_from_text_rejects_garbage() {
        assert!(extract_from_text("not a changelog", &RangeRequest::newest(1)).is_err());
    }
}
