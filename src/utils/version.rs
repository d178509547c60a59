//! Debian version helpers.
//!
//! Two concerns live here: expanding a version into the textual spellings a
//! changelog may use for it, and ordering two versions the way dpkg does.

use std::cmp::Ordering;

/// Alternate textual spellings of one debian version.
///
/// Holds the original string first, then (when applicable) the epoch-stripped
/// form, the prefix before the first `+` and the prefix before the first `~`.
/// Exact duplicates and empty strings are dropped. Order carries no meaning;
/// use [`contains`](Self::contains) or [`intersects`](Self::intersects).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionVariantSet {
    variants: Vec<String>,
}

impl VersionVariantSet {
    fn push(&mut self, candidate: &str) {
        if !candidate.is_empty() && !self.variants.iter().any(|v| v == candidate) {
            self.variants.push(candidate.to_string());
        }
    }

    /// Whole-string membership test. Never a prefix match.
    #[must_use]
    pub fn contains(&self, version: &str) -> bool {
        self.variants.iter().any(|v| v == version)
    }

    /// Whether any spelling in `self` also appears in `other`.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.variants.iter().any(|v| other.contains(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

/// Expand a version into the spellings a changelog may record for it.
///
/// Archives sometimes publish a binary under a version that never appears
/// verbatim in its source changelog: signed packages such as `shim-signed`
/// append `+signed` style suffixes, repackaging can drop the epoch, and
/// pre-release builds carry `~` suffixes.
///
/// ```
/// use cloud_image_changelog::utils::variants;
///
/// let set = variants("1:2.0+dfsg~rc1");
/// assert!(set.contains("1:2.0+dfsg~rc1"));
/// assert!(set.contains("2.0+dfsg~rc1"));
/// assert!(set.contains("1:2.0"));
/// assert!(set.contains("1:2.0+dfsg"));
/// assert!(!set.contains("1:2"));
/// ```
#[must_use]
pub fn variants(version: &str) -> VersionVariantSet {
    let mut set = VersionVariantSet {
        variants: Vec::with_capacity(4),
    };
    set.push(version);

    if let Some((_, without_epoch)) = version.split_once(':') {
        set.push(without_epoch);
    }
    if let Some((prefix, _)) = version.split_once('+') {
        set.push(prefix);
    }
    if let Some((prefix, _)) = version.split_once('~') {
        set.push(prefix);
    }

    set
}

// ============================================================================
// dpkg ordering
// ============================================================================

/// Compare two debian version strings using dpkg's algorithm.
///
/// Epochs compare numerically (missing epoch is 0), then the upstream
/// version, then the debian revision. A `~` sorts before everything,
/// including the end of the string.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (epoch_a, upstream_a, revision_a) = split_version(a);
    let (epoch_b, upstream_b, revision_b) = split_version(b);

    epoch_a
        .cmp(&epoch_b)
        .then_with(|| compare_fragment(upstream_a, upstream_b))
        .then_with(|| compare_fragment(revision_a, revision_b))
}

/// Split `[epoch:]upstream[-revision]`.
fn split_version(version: &str) -> (u64, &str, &str) {
    let (epoch, rest) = match version.split_once(':') {
        Some((epoch, rest)) if !epoch.is_empty() && epoch.bytes().all(|b| b.is_ascii_digit()) => {
            (epoch.parse().unwrap_or(u64::MAX), rest)
        }
        _ => (0, version),
    };
    match rest.rsplit_once('-') {
        Some((upstream, revision)) => (epoch, upstream, revision),
        None => (epoch, rest, ""),
    }
}

/// Sort weight of one non-digit character.
fn char_order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(b'~') => -1,
        Some(c) if c.is_ascii_alphabetic() => i32::from(c),
        Some(c) => i32::from(c) + 256,
    }
}

fn compare_fragment(a: &str, b: &str) -> Ordering {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let (mut i, mut j) = (0, 0);

    while i < a.len() || j < b.len() {
        // Non-digit run
        while (i < a.len() && !a[i].is_ascii_digit()) || (j < b.len() && !b[j].is_ascii_digit()) {
            let ca = a.get(i).copied().filter(|c| !c.is_ascii_digit());
            let cb = b.get(j).copied().filter(|c| !c.is_ascii_digit());
            let ord = char_order(ca).cmp(&char_order(cb));
            if ord != Ordering::Equal {
                return ord;
            }
            if ca.is_some() {
                i += 1;
            }
            if cb.is_some() {
                j += 1;
            }
        }

        // Digit run, compared numerically without overflowing
        while i < a.len() && a[i] == b'0' {
            i += 1;
        }
        while j < b.len() && b[j] == b'0' {
            j += 1;
        }
        let start_a = i;
        let start_b = j;
        while i < a.len() && a[i].is_ascii_digit() {
            i += 1;
        }
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        let digits_a = &a[start_a..i];
        let digits_b = &b[start_b..j];
        let ord = digits_a
            .len()
            .cmp(&digits_b.len())
            .then_with(|| digits_a.cmp(digits_b));
        if ord != Ordering::Equal {
            return ord;
        }
    }

    Ordering::Equal
}
