//! Image manifests.
//!
//! A manifest lists one installed package per line, tab separated:
//!
//! ```text
//! adduser	3.118ubuntu2
//! libc6:amd64	2.31-0ubuntu9.9
//! snap:lxd	4.0/stable/ubuntu-20.04	24061
//! ```
//!
//! Snap lines carry a channel and a revision; the revision is what gets
//! compared between images.

use indexmap::IndexMap;
use std::path::Path;

use crate::error::{ChangelogError, Result};

const SNAP_PREFIX: &str = "snap:";

/// Architecture qualifiers stripped from deb package names.
const ARCH_SUFFIXES: &[&str] = &[":amd64", ":arm64"];

/// Package name → version maps for one image, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub debs: IndexMap<String, String>,
    pub snaps: IndexMap<String, String>,
}

impl Manifest {
    /// Parse manifest text. Malformed lines are skipped with a warning.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut manifest = Self::default();

        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let name = fields.next().unwrap_or_default().trim();
            let rest: Vec<&str> = fields.map(str::trim).collect();

            if let Some(snap) = name.strip_prefix(SNAP_PREFIX) {
                match rest.get(1) {
                    Some(revision) if !revision.is_empty() => {
                        manifest.snaps.insert(snap.to_string(), (*revision).to_string());
                    }
                    _ => tracing::warn!(
                        "Skipping manifest line {}: snap '{}' has no revision",
                        line_no + 1,
                        snap
                    ),
                }
                continue;
            }

            match rest.first() {
                Some(version) if !version.is_empty() => {
                    manifest
                        .debs
                        .insert(arch_independent_name(name).to_string(), (*version).to_string());
                }
                _ => tracing::warn!(
                    "Skipping manifest line {}: package '{}' has no version",
                    line_no + 1,
                    name
                ),
            }
        }

        manifest
    }

    /// Read and parse a manifest file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ChangelogError::io(path, e))?;
        Ok(Self::parse(&text))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.debs.is_empty() && self.snaps.is_empty()
    }
}

/// Drop a trailing `:amd64` / `:arm64` qualifier from a deb package name.
#[must_use]
pub fn arch_independent_name(name: &str) -> &str {
    ARCH_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_debs_and_snaps() {
        let manifest = Manifest::parse(
            "adduser\t3.118ubuntu2\nlibc6:amd64\t2.31-0ubuntu9.9\nsnap:lxd\t4.0/stable/ubuntu-20.04\t24061\n",
        );
        assert_eq!(manifest.debs.len(), 2);
        assert_eq!(manifest.debs["libc6"], "2.31-0ubuntu9.9");
        assert_eq!(manifest.snaps["lxd"], "24061");
    }

    #[test]
    fn test_parse_preserves_order() {
        let manifest = Manifest::parse("zlib1g\t1\nadduser\t2\nbash\t3\n");
        let names: Vec<_> = manifest.debs.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zlib1g", "adduser", "bash"]);
    }

    #[test]
    fn test_parse_skips_incomplete_lines() {
        let manifest = Manifest::parse("\nbroken\nsnap:core\tlatest/stable\n\nbash\t5.0\n");
        assert_eq!(manifest.debs.len(), 1);
        assert!(manifest.snaps.is_empty());
    }

    #[test]
    fn test_arch_independent_name() {
        assert_eq!(arch_independent_name("libc6:amd64"), "libc6");
        assert_eq!(arch_independent_name("libc6:arm64"), "libc6");
        assert_eq!(arch_independent_name("libc6:i386"), "libc6:i386");
        assert_eq!(arch_independent_name("bash"), "bash");
    }
}
