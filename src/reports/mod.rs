//! Report generation for changelog reports.
//!
//! Two output formats are supported:
//! - Text: the console changelog, one section per package
//! - JSON: the [`ChangelogReport`] model, compact or pretty
//!
//! [`report_schema`] renders the JSON Schema of the JSON output.

mod json;
mod text;
mod types;

pub use json::JsonReporter;
pub use text::TextReporter;
pub use types::{ReportConfig, ReportFormat};

use crate::model::ChangelogReport;
use std::io::Write;
use thiserror::Error;

/// Errors that can occur during report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Format error: {0}")]
    FormatError(#[from] std::fmt::Error),
}

/// Trait for report generators
pub trait ReportGenerator {
    /// Render a report
    fn generate(&self, report: &ChangelogReport, config: &ReportConfig)
        -> Result<String, ReportError>;

    /// Write report to a writer
    fn write_report(
        &self,
        report: &ChangelogReport,
        config: &ReportConfig,
        writer: &mut dyn Write,
    ) -> Result<(), ReportError> {
        let rendered = self.generate(report, config)?;
        writer.write_all(rendered.as_bytes())?;
        Ok(())
    }

    /// Get the format this generator produces
    fn format(&self) -> ReportFormat;
}

/// Create a report generator for the given format
#[must_use]
pub fn create_reporter(format: ReportFormat, config: &ReportConfig) -> Box<dyn ReportGenerator> {
    match format {
        ReportFormat::Text => Box::new(TextReporter::new()),
        ReportFormat::Json => Box::new(JsonReporter::new().pretty(config.pretty)),
    }
}

/// JSON Schema of the JSON report, pretty printed.
pub fn report_schema() -> Result<String, ReportError> {
    let schema = schemars::schema_for!(ChangelogReport);
    serde_json::to_string_pretty(&schema)
        .map_err(|e| ReportError::SerializationError(e.to_string()))
}
