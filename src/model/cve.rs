//! CVE references found in changelog text.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Priority value used when no metadata could be retrieved.
pub const UNKNOWN_PRIORITY: &str = "n/a";

/// Base URL of the human-readable CVE pages.
pub const DEFAULT_CVE_URL_BASE: &str = "https://ubuntu.com/security";

/// One CVE referenced by a changelog block.
///
/// Field names on the wire match the report format consumers already parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CveRecord {
    /// Identifier such as `CVE-2023-3390`
    #[serde(rename = "cve")]
    pub id: String,
    pub url: String,
    #[serde(rename = "cve_description")]
    pub description: String,
    /// Tracker priority, `n/a` when unknown
    #[serde(rename = "cve_priority")]
    pub priority: String,
    #[serde(rename = "cve_public_date")]
    pub public_date: String,
}

impl CveRecord {
    /// A record with no metadata beyond its identifier and URL.
    #[must_use]
    pub fn placeholder(id: &str, url_base: &str) -> Self {
        Self {
            id: id.to_string(),
            url: cve_url(url_base, id),
            description: String::new(),
            priority: UNKNOWN_PRIORITY.to_string(),
            public_date: String::new(),
        }
    }

    #[must_use]
    pub fn severity(&self) -> CvePriority {
        CvePriority::parse(&self.priority)
    }
}

/// Link to the public page for a CVE.
#[must_use]
pub fn cve_url(url_base: &str, id: &str) -> String {
    format!("{}/{}", url_base.trim_end_matches('/'), id)
}

/// Ubuntu CVE tracker priorities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CvePriority {
    Unknown,
    Negligible,
    Low,
    Medium,
    High,
    Critical,
}

impl CvePriority {
    /// Parse a tracker priority; anything unrecognised is `Unknown`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "medium" => Self::Medium,
            "low" => Self::Low,
            "negligible" => Self::Negligible,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Negligible => "negligible",
            Self::Unknown => UNKNOWN_PRIORITY,
        }
    }
}

impl fmt::Display for CvePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let record = CveRecord::placeholder("CVE-2023-1111", "https://ubuntu.com/security/");
        assert_eq!(record.url, "https://ubuntu.com/security/CVE-2023-1111");
        assert_eq!(record.priority, "n/a");
        assert_eq!(record.severity(), CvePriority::Unknown);
    }

    #[test]
    fn test_priority_parse_and_order() {
        assert_eq!(CvePriority::parse("High"), CvePriority::High);
        assert_eq!(CvePriority::parse("untriaged"), CvePriority::Unknown);
        assert!(CvePriority::Critical > CvePriority::Medium);
    }

    #[test]
    fn test_wire_field_names() {
        let record = CveRecord::placeholder("CVE-2023-1111", DEFAULT_CVE_URL_BASE);
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["cve"], "CVE-2023-1111");
        assert_eq!(json["cve_priority"], "n/a");
        assert!(json.get("cve_description").is_some());
        assert!(json.get("cve_public_date").is_some());
    }
}
