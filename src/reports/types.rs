//! Report configuration types.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output format for reports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Human-readable console changelog
    #[default]
    Text,
    /// Structured JSON output
    Json,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Rendering options shared by the reporters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportConfig {
    /// Print referenced CVEs with their priority and description
    pub highlight_cves: bool,
    /// ANSI colours in text output
    pub colored: bool,
    /// Indent JSON output
    pub pretty: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_serde_names() {
        assert_eq!(serde_json::to_string(&ReportFormat::Json).unwrap(), "\"json\"");
        let parsed: ReportFormat = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(parsed, ReportFormat::Text);
        assert_eq!(ReportFormat::Json.to_string(), "json");
    }
}
