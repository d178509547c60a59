//! Package set differences between two manifests.

use crate::model::Manifest;
use indexmap::IndexMap;

/// A package present in both manifests with different versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
    pub name: String,
    pub from_version: String,
    pub to_version: String,
}

/// Added, removed and changed packages of one kind, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDiff {
    /// `(name, version)` present only in the "to" manifest
    pub added: Vec<(String, String)>,
    /// `(name, version)` present only in the "from" manifest
    pub removed: Vec<(String, String)>,
    pub changed: Vec<VersionChange>,
}

impl PackageDiff {
    /// Compare two name → version maps.
    #[must_use]
    pub fn compute(from: &IndexMap<String, String>, to: &IndexMap<String, String>) -> Self {
        let removed = from
            .iter()
            .filter(|(name, _)| !to.contains_key(*name))
            .map(|(name, version)| (name.clone(), version.clone()))
            .collect();

        let mut added = Vec::new();
        let mut changed = Vec::new();
        for (name, to_version) in to {
            match from.get(name) {
                None => added.push((name.clone(), to_version.clone())),
                Some(from_version) if from_version != to_version => changed.push(VersionChange {
                    name: name.clone(),
                    from_version: from_version.clone(),
                    to_version: to_version.clone(),
                }),
                Some(_) => {}
            }
        }

        Self {
            added,
            removed,
            changed,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    #[must_use]
    pub fn added_names(&self) -> Vec<String> {
        self.added.iter().map(|(name, _)| name.clone()).collect()
    }

    #[must_use]
    pub fn removed_names(&self) -> Vec<String> {
        self.removed.iter().map(|(name, _)| name.clone()).collect()
    }

    #[must_use]
    pub fn changed_names(&self) -> Vec<String> {
        self.changed.iter().map(|c| c.name.clone()).collect()
    }
}

/// Deb and snap differences between two images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestDiff {
    pub debs: PackageDiff,
    pub snaps: PackageDiff,
}

impl ManifestDiff {
    #[must_use]
    pub fn compute(from: &Manifest, to: &Manifest) -> Self {
        Self {
            debs: PackageDiff::compute(&from.debs, &to.debs),
            snaps: PackageDiff::compute(&from.snaps, &to.snaps),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_diff() {
        let from = Manifest::parse("pkgA\t1.0-0\npkgB\t1.0\nold\t0.1\nsnap:lxd\tstable\t100\n");
        let to = Manifest::parse("pkgA\t2.0-0ubuntu1\npkgB\t1.0\nnew\t0.2\nsnap:lxd\tstable\t101\n");
        let diff = ManifestDiff::compute(&from, &to);

        assert_eq!(diff.debs.added, vec![("new".to_string(), "0.2".to_string())]);
        assert_eq!(diff.debs.removed, vec![("old".to_string(), "0.1".to_string())]);
        assert_eq!(
            diff.debs.changed,
            vec![VersionChange {
                name: "pkgA".to_string(),
                from_version: "1.0-0".to_string(),
                to_version: "2.0-0ubuntu1".to_string(),
            }]
        );
        assert_eq!(diff.snaps.changed_names(), vec!["lxd".to_string()]);
        assert!(diff.snaps.added.is_empty());
    }

    #[test]
    fn test_identical_manifests() {
        let m = Manifest::parse("bash\t5.0\n");
        assert!(PackageDiff::compute(&m.debs, &m.debs).is_empty());
    }
}
