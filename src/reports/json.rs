//! JSON report generator.

use super::{ReportConfig, ReportError, ReportFormat, ReportGenerator};
use crate::model::ChangelogReport;

/// JSON report generator
pub struct JsonReporter {
    /// Pretty print output
    pretty: bool,
}

impl JsonReporter {
    /// Create a new compact JSON reporter
    #[must_use]
    pub const fn new() -> Self {
        Self { pretty: false }
    }

    /// Set pretty printing
    #[must_use]
    pub const fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportGenerator for JsonReporter {
    fn generate(
        &self,
        report: &ChangelogReport,
        _config: &ReportConfig,
    ) -> Result<String, ReportError> {
        let json = if self.pretty {
            serde_json::to_string_pretty(report)
        } else {
            serde_json::to_string(report)
        };
        json.map_err(|e| ReportError::SerializationError(e.to_string()))
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> ChangelogReport {
        ChangelogReport {
            from_series: "jammy".into(),
            to_series: "noble".into(),
            ..ChangelogReport::default()
        }
    }

    #[test]
    fn test_compact_json() {
        let out = JsonReporter::new()
            .generate(&report(), &ReportConfig::default())
            .unwrap();
        assert!(!out.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["to_series"], "noble");
        assert!(value.get("failures").is_none());
    }

    #[test]
    fn test_pretty_json_round_trips() {
        let out = JsonReporter::new()
            .pretty(true)
            .generate(&report(), &ReportConfig::default())
            .unwrap();
        assert!(out.contains('\n'));
        let parsed: ChangelogReport = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, report());
    }
}
