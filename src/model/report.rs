//! The changelog report: what changed between two images, and why.
//!
//! This is the unit serialized to JSON and rendered to the console.

use super::changelog::ChangelogBlock;
use super::cve::CveRecord;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One side of a version transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
    /// Source package the binary was built from, when resolved
    pub source_package_name: Option<String>,
    pub source_package_version: Option<String>,
    /// Binary version recorded in the manifest
    pub version: Option<String>,
}

impl VersionInfo {
    #[must_use]
    pub fn binary(version: Option<String>) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn resolved(version: Option<String>, source_name: String, source_version: String) -> Self {
        Self {
            source_package_name: Some(source_name),
            source_package_version: Some(source_version),
            version,
        }
    }
}

/// One changelog block as it appears in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Change {
    pub cves: Vec<CveRecord>,
    pub log: Vec<String>,
    pub package: String,
    pub version: String,
    pub urgency: String,
    pub distributions: String,
    pub launchpad_bugs_fixed: Vec<u64>,
    pub author: String,
    pub date: String,
}

impl Change {
    #[must_use]
    pub fn from_block(block: &ChangelogBlock, cves: Vec<CveRecord>) -> Self {
        Self {
            cves,
            log: block.changes.clone(),
            package: block.package.clone(),
            version: block.version.clone().unwrap_or_default(),
            urgency: block.urgency.clone(),
            distributions: block.distributions.clone(),
            launchpad_bugs_fixed: block.lp_bugs_closed.clone(),
            author: block.author.clone(),
            date: block.date.clone(),
        }
    }

    /// `pkg (version) dists; urgency=u`
    #[must_use]
    pub fn header_line(&self) -> String {
        format!(
            "{} ({}) {}; urgency={}",
            self.package, self.version, self.distributions, self.urgency
        )
    }
}

/// A deb package that was added, removed or changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DebPackage {
    pub name: String,
    pub from_version: VersionInfo,
    pub to_version: VersionInfo,
    /// Union of the CVEs of all changes, first-seen order
    pub cves: Vec<CveRecord>,
    pub launchpad_bugs_fixed: Vec<u64>,
    /// Matched changelog blocks, newest first
    pub changes: Vec<Change>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl DebPackage {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        from_version: VersionInfo,
        to_version: VersionInfo,
    ) -> Self {
        Self {
            name: name.into(),
            from_version,
            to_version,
            cves: Vec::new(),
            launchpad_bugs_fixed: Vec::new(),
            changes: Vec::new(),
            notes: None,
        }
    }

    /// Append a change, folding its CVEs and bugs into the package totals.
    pub fn push_change(&mut self, change: Change) {
        for cve in &change.cves {
            if !self.cves.iter().any(|c| c.id == cve.id) {
                self.cves.push(cve.clone());
            }
        }
        self.launchpad_bugs_fixed
            .extend(change.launchpad_bugs_fixed.iter().copied());
        self.changes.push(change);
    }

    /// The newest matched change, if any.
    #[must_use]
    pub fn latest_change(&self) -> Option<&Change> {
        self.changes.first()
    }
}

/// A snap that was added, removed or changed. Snaps carry no changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SnapPackage {
    pub name: String,
    pub from_version: VersionInfo,
    pub to_version: VersionInfo,
}

/// Names of added, removed and changed packages of one kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PackageSummary {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub diff: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    pub snap: PackageSummary,
    pub deb: PackageSummary,
}

/// Deb and snap packages of one category (added, removed or changed).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PackageSet {
    pub deb: Vec<DebPackage>,
    pub snap: Vec<SnapPackage>,
}

/// A package whose changelog could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PackageFailure {
    pub name: String,
    pub message: String,
}

/// The full report for one manifest comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChangelogReport {
    pub summary: Summary,
    pub diff: PackageSet,
    pub added: PackageSet,
    pub removed: PackageSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub from_series: String,
    pub to_series: String,
    pub from_serial: Option<String>,
    pub to_serial: Option<String>,
    pub from_manifest_filename: String,
    pub to_manifest_filename: String,
    /// Packages skipped because of per-package failures
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<PackageFailure>,
}

impl ChangelogReport {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
