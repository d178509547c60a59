//! Package archive access.
//!
//! The pipeline needs two things from the archive: the source package that
//! built a given binary, and the changelog of a source package version.
//! [`ArchiveResolver`] abstracts both; [`LaunchpadClient`] implements them
//! against the Launchpad REST API.

#[cfg(feature = "network")]
mod launchpad;

#[cfg(feature = "network")]
pub use launchpad::{LaunchpadClient, LaunchpadConfig};

use crate::enrichment::{CacheKey, CachedChangelog};
use crate::error::{ChangelogError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Launchpad web service root.
pub const DEFAULT_API_BASE: &str = "https://api.launchpad.net/devel";

/// A source package at a specific version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourcePackage {
    pub name: String,
    pub version: String,
}

impl SourcePackage {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Key for the changelog cache.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::new(&self.name, &self.version)
    }
}

impl fmt::Display for SourcePackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// The distribution series and architecture an image was built for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesContext {
    /// Series codename or version, e.g. `noble` or `24.04`
    pub series: String,
    pub architecture: String,
}

impl SeriesContext {
    pub fn new(series: impl Into<String>, architecture: impl Into<String>) -> Self {
        Self {
            series: series.into(),
            architecture: architecture.into(),
        }
    }
}

/// A Launchpad personal package archive, written `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ppa {
    pub owner: String,
    pub name: String,
}

impl FromStr for Ppa {
    type Err = ChangelogError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().trim_start_matches("ppa:");
        match s.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(ChangelogError::validation(format!(
                "Invalid PPA '{s}': expected owner/name"
            ))),
        }
    }
}

impl TryFrom<String> for Ppa {
    type Error = ChangelogError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Ppa> for String {
    fn from(ppa: Ppa) -> Self {
        ppa.to_string()
    }
}

impl fmt::Display for Ppa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Resolves binaries to sources and retrieves source changelogs.
///
/// Both operations consult the main archive first and then each PPA in the
/// order given.
pub trait ArchiveResolver {
    /// The source package that produced `binary_name` at `binary_version`.
    ///
    /// Fails with [`ChangelogError::SourceNotFound`] when no archive has a
    /// matching publication.
    fn resolve_source(
        &self,
        binary_name: &str,
        binary_version: &str,
        series: &SeriesContext,
        ppas: &[Ppa],
    ) -> Result<SourcePackage>;

    /// Changelog text of `source`.
    ///
    /// A changelog is only accepted when it mentions `source.version`;
    /// when none does, the not-found sentinel is returned instead of an error.
    fn fetch_changelog(
        &self,
        source: &SourcePackage,
        series: &SeriesContext,
        ppas: &[Ppa],
    ) -> Result<CachedChangelog>;
}

impl<R: ArchiveResolver + ?Sized> ArchiveResolver for &R {
    fn resolve_source(
        &self,
        binary_name: &str,
        binary_version: &str,
        series: &SeriesContext,
        ppas: &[Ppa],
    ) -> Result<SourcePackage> {
        (**self).resolve_source(binary_name, binary_version, series, ppas)
    }

    fn fetch_changelog(
        &self,
        source: &SourcePackage,
        series: &SeriesContext,
        ppas: &[Ppa],
    ) -> Result<CachedChangelog> {
        (**self).fetch_changelog(source, series, ppas)
    }
}

/// Parse a list of `owner/name` PPA specs.
pub fn parse_ppas<S: AsRef<str>>(specs: &[S]) -> Result<Vec<Ppa>> {
    specs.iter().map(|s| s.as_ref().parse()).collect()
}
