//! The generate run: manifest diff → resolve → fetch → extract → annotate.
//!
//! Packages are processed one at a time. A failure for one package is
//! recorded in [`ChangelogReport::failures`] and the run moves on.

use crate::archive::{ArchiveResolver, Ppa, SeriesContext, SourcePackage};
use crate::diff::{extract, ManifestDiff, PackageDiff, RangeRequest, VersionChange};
use crate::enrichment::{CachedChangelog, ChangelogCache, CveAnnotator, CveMetadataSource};
use crate::error::{ErrorContext, Result};
use crate::model::{
    Change, ChangelogDocument, ChangelogReport, DebPackage, Manifest, PackageFailure,
    PackageSummary, SnapPackage, VersionInfo,
};
use crate::utils::content_hash;
use std::collections::HashMap;
use std::rc::Rc;

/// Default number of changelog entries shown for a newly added package.
pub const DEFAULT_ADDED_PACKAGE_ENTRIES: usize = 3;

/// Inputs of one generate run besides the manifests themselves.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    pub from_series: String,
    pub to_series: String,
    pub from_serial: Option<String>,
    pub to_serial: Option<String>,
    pub from_manifest_filename: String,
    pub to_manifest_filename: String,
    /// Image architecture, e.g. `amd64`
    pub architecture: String,
    /// PPAs consulted after the main archive, in order
    pub ppas: Vec<Ppa>,
    /// Entries shown for an added package with no renamed predecessor
    pub added_package_entries: usize,
    /// Free-form notes copied into the report
    pub notes: Option<String>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            from_series: String::new(),
            to_series: String::new(),
            from_serial: None,
            to_serial: None,
            from_manifest_filename: String::new(),
            to_manifest_filename: String::new(),
            architecture: "amd64".to_string(),
            ppas: Vec::new(),
            added_package_entries: DEFAULT_ADDED_PACKAGE_ENTRIES,
            notes: None,
        }
    }
}

/// A removed deb together with its resolved source, if any.
struct RemovedDeb {
    name: String,
    source: Option<SourcePackage>,
}

/// Builds a [`ChangelogReport`] for two manifests.
pub struct ChangelogGenerator<'c, R, S> {
    resolver: R,
    annotator: Option<CveAnnotator<S>>,
    cache: &'c ChangelogCache,
    options: GenerateOptions,
    from_series: SeriesContext,
    to_series: SeriesContext,
    /// Parsed changelogs keyed by content hash
    documents: HashMap<u64, Rc<ChangelogDocument>>,
}

impl<'c, R: ArchiveResolver, S: CveMetadataSource> ChangelogGenerator<'c, R, S> {
    /// Create a generator. Without an annotator, changes carry no CVE records.
    pub fn new(
        resolver: R,
        annotator: Option<CveAnnotator<S>>,
        cache: &'c ChangelogCache,
        options: GenerateOptions,
    ) -> Self {
        let from_series = SeriesContext::new(&options.from_series, &options.architecture);
        let to_series = SeriesContext::new(&options.to_series, &options.architecture);
        Self {
            resolver,
            annotator,
            cache,
            options,
            from_series,
            to_series,
            documents: HashMap::new(),
        }
    }

    /// Compare `from` and `to` and produce the report.
    ///
    /// Never fails as a whole; per-package problems end up in
    /// [`ChangelogReport::failures`].
    pub fn run(&mut self, from: &Manifest, to: &Manifest) -> ChangelogReport {
        let diff = ManifestDiff::compute(from, to);
        let mut report = ChangelogReport {
            notes: self.options.notes.clone(),
            from_series: self.options.from_series.clone(),
            to_series: self.options.to_series.clone(),
            from_serial: self.options.from_serial.clone(),
            to_serial: self.options.to_serial.clone(),
            from_manifest_filename: self.options.from_manifest_filename.clone(),
            to_manifest_filename: self.options.to_manifest_filename.clone(),
            ..ChangelogReport::default()
        };

        report.summary.snap = summarize(&diff.snaps);
        report.summary.deb = summarize(&diff.debs);
        tracing::info!(
            "Snap packages: {} added, {} removed, {} changed",
            diff.snaps.added.len(),
            diff.snaps.removed.len(),
            diff.snaps.changed.len()
        );
        tracing::info!(
            "Deb packages: {} added, {} removed, {} changed",
            diff.debs.added.len(),
            diff.debs.removed.len(),
            diff.debs.changed.len()
        );

        self.collect_snaps(&diff.snaps, &mut report);

        let removed = self.collect_removed_debs(&diff.debs, &mut report);
        for (name, version) in &diff.debs.added {
            match self.added_deb(name, version, &removed) {
                Ok(package) => report.added.deb.push(package),
                Err(e) => record_failure(&mut report, name, &e),
            }
        }
        for change in &diff.debs.changed {
            match self.changed_deb(change) {
                Ok(package) => report.diff.deb.push(package),
                Err(e) => record_failure(&mut report, &change.name, &e),
            }
        }

        if let Some(annotator) = &self.annotator {
            tracing::debug!("Resolved {} distinct CVEs", annotator.resolved_count());
        }
        let stats = self.cache.stats();
        tracing::debug!(
            "Changelog cache: {} fetches, {} hits",
            stats.fetches,
            stats.hits
        );

        report
    }

    fn collect_snaps(&self, snaps: &PackageDiff, report: &mut ChangelogReport) {
        for (name, version) in &snaps.removed {
            report.removed.snap.push(SnapPackage {
                name: name.clone(),
                from_version: VersionInfo::binary(Some(version.clone())),
                to_version: VersionInfo::binary(None),
            });
        }
        for (name, version) in &snaps.added {
            report.added.snap.push(SnapPackage {
                name: name.clone(),
                from_version: VersionInfo::binary(None),
                to_version: VersionInfo::binary(Some(version.clone())),
            });
        }
        for change in &snaps.changed {
            report.diff.snap.push(SnapPackage {
                name: change.name.clone(),
                from_version: VersionInfo::binary(Some(change.from_version.clone())),
                to_version: VersionInfo::binary(Some(change.to_version.clone())),
            });
        }
    }

    /// Resolve removed debs against the "from" series. A package that cannot
    /// be resolved is still reported, without source details.
    fn collect_removed_debs(
        &self,
        debs: &PackageDiff,
        report: &mut ChangelogReport,
    ) -> Vec<RemovedDeb> {
        let mut removed = Vec::with_capacity(debs.removed.len());
        for (name, version) in &debs.removed {
            let source = match self.resolve(name, version, &self.from_series) {
                Ok(source) => Some(source),
                Err(e) => {
                    record_failure(report, name, &e);
                    None
                }
            };

            let from_version = match &source {
                Some(s) => {
                    VersionInfo::resolved(Some(version.clone()), s.name.clone(), s.version.clone())
                }
                None => VersionInfo::binary(Some(version.clone())),
            };
            report.removed.deb.push(DebPackage::new(
                name.clone(),
                from_version,
                VersionInfo::binary(None),
            ));
            removed.push(RemovedDeb {
                name: name.clone(),
                source,
            });
        }
        removed
    }

    fn added_deb(
        &mut self,
        name: &str,
        version: &str,
        removed: &[RemovedDeb],
    ) -> Result<DebPackage> {
        let to_source = self.resolve(name, version, &self.to_series)?;
        let document = self.document(&to_source)?;

        let to_version = VersionInfo::resolved(
            Some(version.to_string()),
            to_source.name.clone(),
            to_source.version.clone(),
        );

        // A removed binary built from the same source is most likely a rename
        // (kernels do this on every ABI bump).
        let predecessor = removed.iter().find_map(|r| {
            r.source
                .as_ref()
                .filter(|s| s.name == to_source.name)
                .map(|s| (r.name.as_str(), s))
        });

        let (from_version, request, notes) = match predecessor {
            Some((removed_name, removed_source)) => {
                let notes = format!(
                    "{name} version '{version}' (source package {} version '{}') was added. \
                     {name} has the same source package name, {}, as removed package {removed_name}, \
                     so the removed package's source version '{}' is used as the starting point \
                     of the changelog diff.",
                    to_source.name, to_source.version, to_source.name, removed_source.version
                );
                (
                    VersionInfo::resolved(
                        None,
                        removed_source.name.clone(),
                        removed_source.version.clone(),
                    ),
                    RangeRequest::between(&removed_source.version, &to_source.version),
                    notes,
                )
            }
            None => {
                let count = self.options.added_package_entries;
                (
                    VersionInfo::binary(None),
                    RangeRequest::latest(&to_source.version, count),
                    format!(
                        "For a newly added package only the {count} most recent changelog entries are shown."
                    ),
                )
            }
        };

        let mut package = DebPackage::new(name, from_version, to_version);
        self.fill_changes(&mut package, document.as_deref(), &request);
        package.notes = Some(match document {
            Some(_) => notes,
            None => not_found_note(&to_source),
        });
        Ok(package)
    }

    fn changed_deb(&mut self, change: &VersionChange) -> Result<DebPackage> {
        let from_source = self.resolve(&change.name, &change.from_version, &self.from_series)?;
        let to_source = self.resolve(&change.name, &change.to_version, &self.to_series)?;
        let document = self.document(&to_source)?;

        let mut package = DebPackage::new(
            change.name.clone(),
            VersionInfo::resolved(
                Some(change.from_version.clone()),
                from_source.name.clone(),
                from_source.version.clone(),
            ),
            VersionInfo::resolved(
                Some(change.to_version.clone()),
                to_source.name.clone(),
                to_source.version.clone(),
            ),
        );

        let request = RangeRequest::between(&from_source.version, &to_source.version);
        self.fill_changes(&mut package, document.as_deref(), &request);
        if document.is_none() {
            package.notes = Some(not_found_note(&to_source));
        }
        Ok(package)
    }

    fn fill_changes(
        &self,
        package: &mut DebPackage,
        document: Option<&ChangelogDocument>,
        request: &RangeRequest<'_>,
    ) {
        let Some(document) = document else {
            return;
        };

        let extraction = extract(document, request);
        if let Some(unresolved) = extraction.unresolved() {
            tracing::warn!("{}: {}", package.name, unresolved);
        }
        if extraction.blocks.is_empty() {
            tracing::warn!("No changelog entries matched for {}", package.name);
        }

        for block in &extraction.blocks {
            let cves = match &self.annotator {
                Some(annotator) => annotator.annotate(&block.changes),
                None => Vec::new(),
            };
            package.push_change(Change::from_block(block, cves));
        }
    }

    fn resolve(
        &self,
        binary: &str,
        version: &str,
        series: &SeriesContext,
    ) -> Result<SourcePackage> {
        self.resolver
            .resolve_source(binary, version, series, &self.options.ppas)
    }

    /// Fetch (through the cache) and parse the "to" series changelog of
    /// `source`.
    ///
    /// `Ok(None)` when the archive has no changelog mentioning the version.
    fn document(&mut self, source: &SourcePackage) -> Result<Option<Rc<ChangelogDocument>>> {
        let series = &self.to_series;
        let key = source.cache_key();
        let entry = self
            .cache
            .get_or_fetch(&key, || {
                self.resolver
                    .fetch_changelog(source, series, &self.options.ppas)
            })
            .with_context(|| format!("fetching changelog for {source}"))?;

        let text = match entry {
            CachedChangelog::Found { text } => text,
            CachedChangelog::NotFound { .. } => {
                tracing::warn!("Unable to find changelog for source package {}", source);
                return Ok(None);
            }
        };

        let hash = content_hash(text.as_bytes());
        if let Some(document) = self.documents.get(&hash) {
            return Ok(Some(Rc::clone(document)));
        }

        let document = Rc::new(
            ChangelogDocument::parse(&text).with_context(|| source.to_string())?,
        );
        self.documents.insert(hash, Rc::clone(&document));
        Ok(Some(document))
    }
}

fn summarize(diff: &PackageDiff) -> PackageSummary {
    PackageSummary {
        added: diff.added_names(),
        removed: diff.removed_names(),
        diff: diff.changed_names(),
    }
}

fn not_found_note(source: &SourcePackage) -> String {
    format!(
        "Unable to find changelog for source package {} version {}.",
        source.name, source.version
    )
}

fn record_failure(report: &mut ChangelogReport, name: &str, error: &crate::ChangelogError) {
    tracing::warn!("{}: {}", name, error);
    report.failures.push(PackageFailure {
        name: name.to_string(),
        message: error.to_string(),
    });
}
