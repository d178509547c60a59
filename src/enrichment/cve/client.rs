//! Ubuntu CVE tracker HTTP client.

use super::DEFAULT_TRACKER_BASE;
use crate::enrichment::traits::{CveLocation, CveMetadataSource};
use crate::error::{ChangelogError, RemoteErrorKind, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

/// CVE tracker client configuration.
#[derive(Debug, Clone)]
pub struct CveTrackerConfig {
    /// Base URL; records live at `{base}/{location}/{id}`
    pub tracker_base: String,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for CveTrackerConfig {
    fn default() -> Self {
        Self {
            tracker_base: DEFAULT_TRACKER_BASE.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fetches raw tracker records over HTTP.
pub struct CveTrackerClient {
    client: Client,
    config: CveTrackerConfig,
}

fn network_error(context: &str, err: &reqwest::Error) -> ChangelogError {
    ChangelogError::remote(context, RemoteErrorKind::Network(err.to_string()))
}

impl CveTrackerClient {
    /// Create a new tracker client.
    pub fn new(config: CveTrackerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| network_error("Failed to create HTTP client", &e))?;

        Ok(Self { client, config })
    }

    fn record_url(&self, id: &str, location: CveLocation) -> String {
        format!(
            "{}/{}/{}",
            self.config.tracker_base.trim_end_matches('/'),
            location,
            id
        )
    }
}

impl CveMetadataSource for CveTrackerClient {
    fn fetch(&self, id: &str, location: CveLocation) -> Result<Vec<String>> {
        let url = self.record_url(id, location);
        let context = format!("CVE tracker {location}/{id}");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| network_error(&context, &e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ChangelogError::not_found(context, url));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ChangelogError::remote(
                context,
                RemoteErrorKind::Status {
                    status: status.as_u16(),
                    body,
                },
            ));
        }

        let text = response.text().map_err(|e| network_error(&context, &e))?;
        Ok(text.lines().map(str::to_string).collect())
    }

    fn name(&self) -> &'static str {
        "ubuntu-cve-tracker"
    }
}
