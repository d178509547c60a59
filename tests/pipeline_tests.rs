//! Pipeline and CLI integration tests.
//!
//! These tests exercise the full manifest → diff → changelog → report run
//! with in-memory archive and CVE tracker fakes backed by fixture files.

use cloud_image_changelog::archive::{ArchiveResolver, Ppa, SeriesContext, SourcePackage};
use cloud_image_changelog::cli::{emit_report, exit_code_for, generate_report};
use cloud_image_changelog::config::{AppConfig, GenerateConfig, GeneratePaths};
use cloud_image_changelog::enrichment::{CachedChangelog, CveLocation, CveMetadataSource};
use cloud_image_changelog::model::ChangelogReport;
use cloud_image_changelog::pipeline::exit_codes;
use cloud_image_changelog::reports::ReportFormat;
use cloud_image_changelog::{ChangelogError, Result};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

// ============================================================================
// Test Fixtures
// ============================================================================

const FIXTURES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures");

fn fixture_path(name: &str) -> PathBuf {
    Path::new(FIXTURES_DIR).join(name)
}

/// Archive fake: binaries map to sources by name, changelogs come from
/// `tests/fixtures/changelogs/<source>.changelog`.
#[derive(Default)]
struct FixtureArchive {
    fetched: RefCell<Vec<String>>,
}

impl ArchiveResolver for FixtureArchive {
    fn resolve_source(
        &self,
        binary_name: &str,
        binary_version: &str,
        _series: &SeriesContext,
        _ppas: &[Ppa],
    ) -> Result<SourcePackage> {
        let source = match binary_name {
            "pkga" | "oldtool" | "newtool" => binary_name,
            name if name.starts_with("linux-image-") => "linux",
            _ => return Err(ChangelogError::source_not_found(binary_name, binary_version)),
        };
        Ok(SourcePackage::new(source, binary_version))
    }

    fn fetch_changelog(
        &self,
        source: &SourcePackage,
        _series: &SeriesContext,
        _ppas: &[Ppa],
    ) -> Result<CachedChangelog> {
        self.fetched.borrow_mut().push(source.to_string());
        let path = fixture_path(&format!("changelogs/{}.changelog", source.name));
        match std::fs::read_to_string(&path) {
            Ok(text) if text.contains(&source.version) => Ok(CachedChangelog::Found { text }),
            _ => Ok(CachedChangelog::not_found(&source.cache_key())),
        }
    }
}

/// Tracker fake: active records live in `tests/fixtures/cve/<id>`.
struct FixtureTracker;

impl CveMetadataSource for FixtureTracker {
    fn fetch(&self, id: &str, location: CveLocation) -> Result<Vec<String>> {
        let path = fixture_path(&format!("cve/{id}"));
        match (location, std::fs::read_to_string(path)) {
            (CveLocation::Active, Ok(text)) => Ok(text.lines().map(str::to_string).collect()),
            _ => Err(ChangelogError::not_found("fixture tracker", format!("{location}/{id}"))),
        }
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}

fn config() -> GenerateConfig {
    let mut app = AppConfig::default();
    app.behavior.quiet = true;
    app.retry.delay_unit_ms = 0;
    app.cve.enabled = true;
    GenerateConfig {
        app,
        paths: GeneratePaths {
            from_manifest: fixture_path("manifests/from.manifest"),
            to_manifest: fixture_path("manifests/to.manifest"),
        },
        from_series: "noble".to_string(),
        to_series: "noble".to_string(),
        from_serial: Some("20240423".to_string()),
        to_serial: Some("20240521".to_string()),
        notes: Some("Weekly refresh".to_string()),
        output_json: None,
    }
}

fn run() -> (ChangelogReport, FixtureArchive) {
    let archive = FixtureArchive::default();
    let report = generate_report(&config(), &archive, Some(FixtureTracker))
        .expect("report should be generated");
    (report, archive)
}

fn versions(report: &ChangelogReport, name: &str, added: bool) -> Vec<String> {
    let set = if added { &report.added } else { &report.diff };
    set.deb
        .iter()
        .find(|p| p.name == name)
        .unwrap_or_else(|| panic!("{name} missing from report"))
        .changes
        .iter()
        .map(|c| c.version.clone())
        .collect()
}

// ============================================================================
// Generate Run Tests
// ============================================================================

mod generate_run {
    use super::*;

    #[test]
    fn report_metadata_is_copied() {
        let (report, _) = run();
        assert_eq!(report.from_series, "noble");
        assert_eq!(report.from_serial.as_deref(), Some("20240423"));
        assert_eq!(report.from_manifest_filename, "from.manifest");
        assert_eq!(report.to_manifest_filename, "to.manifest");
        assert_eq!(report.notes.as_deref(), Some("Weekly refresh"));
    }

    #[test]
    fn summary_lists_every_category() {
        let (report, _) = run();
        assert_eq!(report.summary.deb.diff, vec!["pkga"]);
        assert_eq!(
            report.summary.deb.removed,
            vec!["linux-image-6.8.0-31-generic", "oldtool"]
        );
        assert_eq!(
            report.summary.deb.added,
            vec!["linux-image-6.8.0-35-generic", "newtool", "ghost"]
        );
        assert_eq!(report.summary.snap.diff, vec!["lxd"]);
        assert_eq!(report.summary.snap.removed, vec!["core22"]);
        assert_eq!(report.summary.snap.added, vec!["hello"]);
    }

    #[test]
    fn changed_package_gets_half_open_range() {
        let (report, _) = run();
        assert_eq!(versions(&report, "pkga", false), vec!["2.0-0ubuntu1", "1.5-0"]);

        let pkga = &report.diff.deb[0];
        assert_eq!(pkga.launchpad_bugs_fixed, vec![12345]);
        assert_eq!(pkga.from_version.source_package_version.as_deref(), Some("1.0-0"));
        assert_eq!(pkga.to_version.version.as_deref(), Some("2.0-0ubuntu1"));
    }

    #[test]
    fn cves_are_resolved_through_tracker() {
        let (report, _) = run();
        let pkga = &report.diff.deb[0];
        assert_eq!(pkga.cves.len(), 1);
        let cve = &pkga.cves[0];
        assert_eq!(cve.id, "CVE-2024-0001");
        assert_eq!(cve.priority, "high");
        assert_eq!(cve.public_date, "2024-01-15 12:00:00 UTC");
        assert!(cve.description.starts_with("A heap overflow in the pkga parser"));
        assert_eq!(cve.url, "https://ubuntu.com/security/CVE-2024-0001");
    }

    #[test]
    fn renamed_binary_uses_removed_source_version() {
        let (report, _) = run();
        let name = "linux-image-6.8.0-35-generic";
        assert_eq!(versions(&report, name, true), vec!["6.8.0-35.35", "6.8.0-34.34"]);

        let kernel = report.added.deb.iter().find(|p| p.name == name).unwrap();
        assert_eq!(
            kernel.from_version.source_package_version.as_deref(),
            Some("6.8.0-31.31")
        );
        assert_eq!(kernel.launchpad_bugs_fixed, vec![2_065_886, 2_064_331, 2_064_332]);
        assert!(kernel
            .notes
            .as_deref()
            .unwrap_or_default()
            .contains("linux-image-6.8.0-31-generic"));

        // CVE-2024-26925 has no tracker record
        assert_eq!(kernel.cves.len(), 1);
        assert_eq!(kernel.cves[0].priority, "n/a");
    }

    #[test]
    fn added_package_shows_latest_entries() {
        let (report, _) = run();
        assert_eq!(
            versions(&report, "newtool", true),
            vec!["1.2-1", "1.1-1", "1.0-1"]
        );
    }

    #[test]
    fn removed_packages_keep_source_details() {
        let (report, _) = run();
        let oldtool = report.removed.deb.iter().find(|p| p.name == "oldtool").unwrap();
        assert_eq!(oldtool.from_version.source_package_name.as_deref(), Some("oldtool"));
        assert!(oldtool.to_version.version.is_none());
        assert!(oldtool.changes.is_empty());
    }

    #[test]
    fn unresolvable_package_is_partial_failure() {
        let (report, _) = run();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "ghost");
        assert_eq!(exit_code_for(&report), exit_codes::PARTIAL_FAILURE);
    }

    #[test]
    fn each_changelog_fetched_once() {
        let (_, archive) = run();
        let fetched = archive.fetched.borrow();
        assert_eq!(fetched.len(), 3, "fetched: {fetched:?}");
    }

    #[test]
    fn disabled_cves_leave_records_empty() {
        let archive = FixtureArchive::default();
        let report = generate_report(&config(), &archive, None::<FixtureTracker>).unwrap();
        assert!(report.diff.deb[0].cves.is_empty());
        assert_eq!(report.diff.deb[0].changes.len(), 2);
    }
}

// ============================================================================
// Error Handling Tests
// ============================================================================

mod error_handling {
    use super::*;

    #[test]
    fn missing_manifest_is_fatal() {
        let mut config = config();
        config.paths.from_manifest = fixture_path("manifests/does-not-exist.manifest");
        let err = generate_report(&config, FixtureArchive::default(), None::<FixtureTracker>)
            .unwrap_err();
        assert!(err.to_string().contains("does-not-exist.manifest"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut config = config();
        config.app.retry.attempts = 0;
        config.app.archive.ppas = vec!["not-a-ppa".to_string()];
        let err = generate_report(&config, FixtureArchive::default(), None::<FixtureTracker>)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Invalid configuration"));
        assert!(message.contains("retry.attempts"));
    }
}

// ============================================================================
// Report Output Tests
// ============================================================================

mod report_output {
    use super::*;

    #[test]
    fn json_report_written_to_file_round_trips() {
        let (report, _) = run();
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.app.output.format = ReportFormat::Json;
        config.app.output.pretty = true;
        config.app.output.file = Some(dir.path().join("report.json"));

        emit_report(&config, &report).unwrap();

        let written = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
        let parsed: ChangelogReport = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, report);
        assert!(written.contains("\n  \"summary\""));
    }

    #[test]
    fn text_report_with_json_copy() {
        let (report, _) = run();
        let dir = tempfile::tempdir().unwrap();
        let mut config = config();
        config.app.output.file = Some(dir.path().join("report.txt"));
        config.output_json = Some(dir.path().join("report.json"));

        emit_report(&config, &report).unwrap();

        let text = std::fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert!(text.contains("CVE-2024-0001"));
        assert!(text.contains("pkga (2.0-0ubuntu1) noble; urgency=medium"));
        assert!(!text.contains("\u{1b}["), "files are never coloured");

        let json = std::fs::read_to_string(dir.path().join("report.json")).unwrap();
        let parsed: ChangelogReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.failures.len(), 1);
    }
}
