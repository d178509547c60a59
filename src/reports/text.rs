//! Console changelog reporter.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::model::{Change, ChangelogReport, CvePriority, CveRecord, DebPackage, PackageSummary};
use std::fmt::Write;

const SEPARATOR: &str = "======================================================================================================================";

/// Apply ANSI color codes if colored output is enabled
fn ansi_color(text: &str, color: &str, colored: bool) -> String {
    if colored {
        match color {
            "red" => format!("\x1b[31m{text}\x1b[0m"),
            "yellow" => format!("\x1b[33m{text}\x1b[0m"),
            "red-bold" => format!("\x1b[1;31m{text}\x1b[0m"),
            "yellow-bold" => format!("\x1b[1;33m{text}\x1b[0m"),
            "bold" => format!("\x1b[1m{text}\x1b[0m"),
            _ => text.to_string(),
        }
    } else {
        text.to_string()
    }
}

fn priority_color(priority: &str) -> &'static str {
    match CvePriority::parse(priority) {
        CvePriority::High | CvePriority::Critical => "red-bold",
        CvePriority::Medium => "yellow-bold",
        _ => "",
    }
}

fn name_list(names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{n}'")).collect();
    format!("[{}]", quoted.join(", "))
}

/// Human-readable changelog, one section per package.
pub struct TextReporter;

impl TextReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn write_summary(
        out: &mut String,
        kind: &str,
        summary: &PackageSummary,
    ) -> Result<(), ReportError> {
        writeln!(out, "{kind} packages added: {}", name_list(&summary.added))?;
        writeln!(out, "{kind} packages removed: {}", name_list(&summary.removed))?;
        writeln!(out, "{kind} packages changed: {}", name_list(&summary.diff))?;
        Ok(())
    }

    fn write_package(
        out: &mut String,
        package: &DebPackage,
        config: &ReportConfig,
    ) -> Result<(), ReportError> {
        writeln!(out, "{SEPARATOR}")?;
        let to = &package.to_version;
        let source_name = to.source_package_name.as_deref().unwrap_or_default();
        let source_version = to.source_package_version.as_deref().unwrap_or_default();
        let version = to.version.as_deref().unwrap_or_default();

        match package.from_version.version.as_deref() {
            Some(from_version) => writeln!(
                out,
                "{} changed from version '{from_version}' to version '{version}' \
                 (source package changed from {} version '{}' to {source_name} version '{source_version}')",
                ansi_color(&package.name, "bold", config.colored),
                package.from_version.source_package_name.as_deref().unwrap_or_default(),
                package.from_version.source_package_version.as_deref().unwrap_or_default(),
            )?,
            None => writeln!(
                out,
                "{} version '{version}' (source package {source_name} version '{source_version}') was added.",
                ansi_color(&package.name, "bold", config.colored),
            )?,
        }
        if let Some(notes) = &package.notes {
            writeln!(out, "{notes}")?;
        }
        writeln!(out)?;

        writeln!(out, "Source: {source_name}")?;
        writeln!(out, "Version: {source_version}")?;
        if let Some(latest) = package.latest_change() {
            writeln!(out, "Distribution: {}", latest.distributions)?;
            writeln!(out, "Urgency: {}", latest.urgency)?;
            writeln!(out, "Maintainer: {}", latest.author)?;
            writeln!(out, "Date: {}", latest.date)?;
        }
        let bugs: Vec<String> = package
            .launchpad_bugs_fixed
            .iter()
            .map(u64::to_string)
            .collect();
        writeln!(out, "Launchpad-Bugs-Fixed: {}", bugs.join(", "))?;
        if config.highlight_cves && !package.cves.is_empty() {
            let ids: Vec<&str> = package.cves.iter().map(|c| c.id.as_str()).collect();
            writeln!(out, "CVEs referenced: {}", ids.join(", "))?;
        }

        for change in &package.changes {
            Self::write_change(out, change, config)?;
        }
        Ok(())
    }

    fn write_change(
        out: &mut String,
        change: &Change,
        config: &ReportConfig,
    ) -> Result<(), ReportError> {
        writeln!(out)?;
        writeln!(out, "{}", change.header_line())?;
        writeln!(out, "{} ({})", change.author, change.date)?;
        writeln!(out)?;

        if config.highlight_cves && !change.cves.is_empty() {
            writeln!(out, "CVEs referenced in changelog:")?;
            for cve in &change.cves {
                writeln!(out, "{}", Self::cve_line(cve, config.colored))?;
            }
            writeln!(out)?;
        }

        writeln!(out, "Changes:")?;
        for line in &change.log {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    fn cve_line(cve: &CveRecord, colored: bool) -> String {
        format!(
            "\t- {} ({} priority): {}",
            cve.id,
            ansi_color(&cve.priority, priority_color(&cve.priority), colored),
            cve.description
        )
    }
}

impl Default for TextReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for TextReporter {
    fn generate(
        &self,
        report: &ChangelogReport,
        config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let mut out = String::new();

        if let Some(notes) = &report.notes {
            writeln!(out, "{notes}")?;
            writeln!(out)?;
        }
        writeln!(
            out,
            "Changes from {} ({}) to {} ({})",
            report.from_series,
            report.from_serial.as_deref().unwrap_or(&report.from_manifest_filename),
            report.to_series,
            report.to_serial.as_deref().unwrap_or(&report.to_manifest_filename),
        )?;
        writeln!(out)?;

        Self::write_summary(&mut out, "Snap", &report.summary.snap)?;
        Self::write_summary(&mut out, "Deb", &report.summary.deb)?;

        if !report.added.snap.is_empty() || !report.diff.snap.is_empty() {
            writeln!(
                out,
                "\n** Package version diffs for changed snap packages below. \
                 Full changelogs for snap packages are not listed **\n"
            )?;
            for snap in &report.added.snap {
                writeln!(out, "{SEPARATOR}")?;
                writeln!(
                    out,
                    "{} version '{}' was added.",
                    snap.name,
                    snap.to_version.version.as_deref().unwrap_or_default()
                )?;
            }
            for snap in &report.diff.snap {
                writeln!(out, "{SEPARATOR}")?;
                writeln!(
                    out,
                    "{} changed from version '{}' to version '{}'",
                    snap.name,
                    snap.from_version.version.as_deref().unwrap_or_default(),
                    snap.to_version.version.as_deref().unwrap_or_default()
                )?;
            }
        }

        if !report.added.deb.is_empty() || !report.diff.deb.is_empty() {
            writeln!(out, "\n** Changelogs for added and changed deb packages below: **\n")?;
            for package in report.added.deb.iter().chain(&report.diff.deb) {
                Self::write_package(&mut out, package, config)?;
                writeln!(out)?;
            }
        }

        if !report.failures.is_empty() {
            writeln!(out, "{SEPARATOR}")?;
            writeln!(
                out,
                "{}",
                ansi_color("Packages that could not be processed:", "red", config.colored)
            )?;
            for failure in &report.failures {
                writeln!(out, "  {}: {}", failure.name, failure.message)?;
            }
        }

        Ok(out)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }
}
