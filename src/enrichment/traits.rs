//! Seams for CVE metadata retrieval.
//!
//! The annotator only needs raw tracker text for an identifier; where that
//! text comes from (HTTP, a local checkout, a test fixture) is behind
//! [`CveMetadataSource`].

use crate::error::Result;
use std::fmt;

/// Directories of the Ubuntu CVE tracker, in lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CveLocation {
    Active,
    Retired,
    Ignored,
}

impl CveLocation {
    /// Lookup order: the first location holding a record wins.
    pub const ALL: [Self; 3] = [Self::Active, Self::Retired, Self::Ignored];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Retired => "retired",
            Self::Ignored => "ignored",
        }
    }
}

impl fmt::Display for CveLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of raw CVE tracker records.
///
/// Implementations return the record as text lines, and fail with a
/// not-found remote error (see [`crate::ChangelogError::is_not_found`]) when
/// the location holds no record for the identifier.
pub trait CveMetadataSource {
    fn fetch(&self, id: &str, location: CveLocation) -> Result<Vec<String>>;

    /// Name of the source, for log messages.
    fn name(&self) -> &'static str;
}

impl<S: CveMetadataSource + ?Sized> CveMetadataSource for &S {
    fn fetch(&self, id: &str, location: CveLocation) -> Result<Vec<String>> {
        (**self).fetch(id, location)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
