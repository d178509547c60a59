//! Generate command handler.
//!
//! Implements the `generate` subcommand: diff two image manifests and print
//! the changelog of everything that changed between them.

use crate::archive::{parse_ppas, ArchiveResolver};
use crate::config::{GenerateConfig, Validatable};
use crate::enrichment::{ChangelogCache, CveAnnotator, CveMetadataSource};
use crate::model::{ChangelogReport, Manifest};
use crate::pipeline::{
    exit_codes, should_use_color, write_output, ChangelogGenerator, GenerateOptions, OutputTarget,
    PipelineError,
};
use crate::reports::{create_reporter, JsonReporter, ReportConfig, ReportGenerator};
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Run the generate command, returning the desired exit code.
///
/// The caller is responsible for calling `std::process::exit()` with the
/// returned code when it is non-zero.
#[cfg(feature = "network")]
#[allow(clippy::needless_pass_by_value)]
pub fn run_generate(config: GenerateConfig) -> Result<i32> {
    use crate::archive::{LaunchpadClient, LaunchpadConfig};
    use crate::enrichment::{CveTrackerClient, CveTrackerConfig};

    let app = &config.app;
    let resolver = LaunchpadClient::new(LaunchpadConfig {
        api_base: app.archive.api_base.clone(),
        distribution: app.archive.distribution.clone(),
        timeout: app.archive.timeout(),
        retry: app.retry.policy(),
    })
    .context("Failed to create Launchpad client")?;

    let tracker = if app.cve.enabled {
        Some(
            CveTrackerClient::new(CveTrackerConfig {
                tracker_base: app.cve.tracker_base.clone(),
                timeout: app.cve.timeout(),
            })
            .context("Failed to create CVE tracker client")?,
        )
    } else {
        None
    };

    let report = generate_report(&config, resolver, tracker)?;
    emit_report(&config, &report)?;
    Ok(exit_code_for(&report))
}

/// Without the `network` feature there is no archive to talk to.
#[cfg(not(feature = "network"))]
#[allow(clippy::needless_pass_by_value)]
pub fn run_generate(_config: GenerateConfig) -> Result<i32> {
    bail!(
        "cloud-image-changelog was built without the 'network' feature. \
         Rebuild with --features network to query the archive."
    )
}

/// Produce the report for `config` with the given archive and CVE sources.
///
/// Validates the configuration and loads both manifests; everything after
/// that is per-package and lands in [`ChangelogReport::failures`].
pub fn generate_report<R, S>(
    config: &GenerateConfig,
    resolver: R,
    cve_source: Option<S>,
) -> Result<ChangelogReport>
where
    R: ArchiveResolver,
    S: CveMetadataSource,
{
    let errors = config.app.validate();
    if !errors.is_empty() {
        let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", details.join("\n  "));
    }
    let quiet = config.app.behavior.quiet;

    let from = load_manifest(&config.paths.from_manifest)?;
    let to = load_manifest(&config.paths.to_manifest)?;
    if !quiet {
        tracing::info!(
            "Loaded {} debs and {} snaps from {}, {} debs and {} snaps from {}",
            from.debs.len(),
            from.snaps.len(),
            config.paths.from_manifest.display(),
            to.debs.len(),
            to.snaps.len(),
            config.paths.to_manifest.display()
        );
    }

    let options = GenerateOptions {
        from_series: config.from_series.clone(),
        to_series: config.to_series.clone(),
        from_serial: config.from_serial.clone(),
        to_serial: config.to_serial.clone(),
        from_manifest_filename: file_name(&config.paths.from_manifest),
        to_manifest_filename: file_name(&config.paths.to_manifest),
        architecture: config.app.archive.architecture.clone(),
        ppas: parse_ppas(&config.app.archive.ppas)?,
        added_package_entries: config.app.behavior.added_package_entries,
        notes: config.notes.clone(),
    };

    let annotator = cve_source.map(|source| {
        CveAnnotator::new(source, config.app.retry.policy())
            .with_url_base(config.app.cve.url_base.clone())
    });

    let cache = ChangelogCache::temporary().context("Failed to create changelog cache")?;

    let report = ChangelogGenerator::new(resolver, annotator, &cache, options).run(&from, &to);
    if report.has_failures() && !quiet {
        tracing::warn!("{} package(s) could not be processed", report.failures.len());
    }
    Ok(report)
}

/// Render `report` to the configured output, plus the optional JSON file.
pub fn emit_report(config: &GenerateConfig, report: &ChangelogReport) -> Result<()> {
    let output = &config.app.output;
    let target = OutputTarget::from_option(output.file.clone());
    let report_config = ReportConfig {
        highlight_cves: config.app.cve.enabled,
        colored: should_use_color(output.no_color, &target),
        pretty: output.pretty,
    };

    let rendered = create_reporter(output.format, &report_config)
        .generate(report, &report_config)
        .map_err(|e| PipelineError::ReportFailed { source: e.into() })?;
    write_output(&rendered, &target, config.app.behavior.quiet)?;

    if let Some(path) = &config.output_json {
        let json = JsonReporter::new()
            .pretty(output.pretty)
            .generate(report, &report_config)
            .map_err(|e| PipelineError::ReportFailed { source: e.into() })?;
        write_output(
            &json,
            &OutputTarget::File(path.clone()),
            config.app.behavior.quiet,
        )?;
    }
    Ok(())
}

/// Exit code for a finished run.
#[must_use]
pub fn exit_code_for(report: &ChangelogReport) -> i32 {
    if report.has_failures() {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::SUCCESS
    }
}

fn load_manifest(path: &Path) -> Result<Manifest> {
    Manifest::from_path(path)
        .map_err(|source| PipelineError::ManifestFailed {
            path: path.display().to_string(),
            source,
        })
        .map_err(Into::into)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
