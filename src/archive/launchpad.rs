//! Launchpad REST API client.
//!
//! Anonymous, read-only access to the web service at
//! `https://api.launchpad.net/devel`. Every request goes through the
//! configured [`RetryPolicy`].

use super::{ArchiveResolver, Ppa, SeriesContext, SourcePackage, DEFAULT_API_BASE};
use crate::enrichment::CachedChangelog;
use crate::error::{ChangelogError, ErrorContext, RemoteErrorKind, Result};
use crate::utils::RetryPolicy;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

/// Launchpad client configuration.
#[derive(Debug, Clone)]
pub struct LaunchpadConfig {
    pub api_base: String,
    /// Distribution name, `ubuntu` for cloud images
    pub distribution: String,
    /// Request timeout
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            distribution: "ubuntu".to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Collection<T> {
    #[serde(default = "Vec::new")]
    entries: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SeriesEntry {
    self_link: String,
}

#[derive(Debug, Deserialize)]
struct BinaryPublication {
    source_package_name: String,
    source_package_version: String,
}

#[derive(Debug, Deserialize)]
struct SourcePublication {
    self_link: String,
}

/// Which archive a publication query runs against.
enum ArchiveRef<'a> {
    Primary,
    Ppa(&'a Ppa),
}

/// HTTP client for the Launchpad API.
pub struct LaunchpadClient {
    client: Client,
    config: LaunchpadConfig,
    /// series name → series self link
    series_links: RefCell<HashMap<String, String>>,
}

fn network_error(context: &str, err: &reqwest::Error) -> ChangelogError {
    ChangelogError::remote(context, RemoteErrorKind::Network(err.to_string()))
}

impl LaunchpadClient {
    /// Create a new Launchpad client.
    pub fn new(config: LaunchpadConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(|e| network_error("Failed to create HTTP client", &e))?;

        Ok(Self {
            client,
            config,
            series_links: RefCell::new(HashMap::new()),
        })
    }

    fn api_base(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    fn archive_link(&self, archive: &ArchiveRef<'_>) -> String {
        match archive {
            ArchiveRef::Primary => format!(
                "{}/{}/+archive/primary",
                self.api_base(),
                self.config.distribution
            ),
            ArchiveRef::Ppa(ppa) => format!(
                "{}/~{}/+archive/{}/{}",
                self.api_base(),
                ppa.owner,
                self.config.distribution,
                ppa.name
            ),
        }
    }

    /// Send a request built by `build`, retrying transient failures.
    fn send(&self, context: &str, build: impl Fn() -> RequestBuilder) -> Result<String> {
        self.config.retry.retry_transient(|| {
            let response = build().send().map_err(|e| network_error(context, &e))?;
            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(ChangelogError::not_found(context, response.url().to_string()));
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
            response.text().map_err(|e| network_error(context, &e))
        })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        context: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let body = self.send(context, || self.client.get(url).query(query))?;
        serde_json::from_str(&body).context(context)
    }

    /// Self link of a series, looked up once per run.
    fn series_link(&self, series: &str) -> Result<String> {
        if let Some(link) = self.series_links.borrow().get(series) {
            return Ok(link.clone());
        }

        let url = format!("{}/{}", self.api_base(), self.config.distribution);
        let entry: SeriesEntry = self.get_json(
            &format!("getSeries {series}"),
            &url,
            &[("ws.op", "getSeries"), ("name_or_version", series)],
        )?;
        tracing::debug!("Series {} is {}", series, entry.self_link);

        self.series_links
            .borrow_mut()
            .insert(series.to_string(), entry.self_link.clone());
        Ok(entry.self_link)
    }

    fn arch_series_link(&self, context: &SeriesContext) -> Result<String> {
        Ok(format!(
            "{}/{}",
            self.series_link(&context.series)?,
            context.architecture
        ))
    }

    fn published_binaries(
        &self,
        archive: &ArchiveRef<'_>,
        binary_name: &str,
        binary_version: &str,
        arch_series: &str,
    ) -> Result<Vec<BinaryPublication>> {
        let mut query = vec![
            ("ws.op", "getPublishedBinaries"),
            ("exact_match", "true"),
            ("binary_name", binary_name),
            ("distro_arch_series", arch_series),
            ("order_by_date", "true"),
            ("version", binary_version),
        ];
        if matches!(archive, ArchiveRef::Ppa(_)) {
            query.push(("pocket", "Release"));
        }

        let collection: Collection<BinaryPublication> = self.get_json(
            &format!("getPublishedBinaries {binary_name} {binary_version}"),
            &self.archive_link(archive),
            &query,
        )?;
        Ok(collection.entries)
    }

    fn published_sources(
        &self,
        archive: &ArchiveRef<'_>,
        source: &SourcePackage,
        series_link: &str,
    ) -> Result<Vec<SourcePublication>> {
        let mut query = vec![
            ("ws.op", "getPublishedSources"),
            ("exact_match", "true"),
            ("source_name", source.name.as_str()),
            ("distro_series", series_link),
            ("order_by_date", "true"),
            ("version", source.version.as_str()),
        ];
        if matches!(archive, ArchiveRef::Ppa(_)) {
            query.push(("pocket", "Release"));
        }

        let collection: Collection<SourcePublication> = self.get_json(
            &format!("getPublishedSources {source}"),
            &self.archive_link(archive),
            &query,
        )?;
        Ok(collection.entries)
    }

    /// Download the changelog of a source publication.
    fn publication_changelog(&self, publication: &SourcePublication) -> Result<String> {
        let changelog_url: String = self.get_json(
            "changelogUrl",
            &publication.self_link,
            &[("ws.op", "changelogUrl")],
        )?;
        let url = api_url_for(self.api_base(), &changelog_url)?;
        self.send("changelog download", || self.client.get(&url))
    }

    /// The changelog of the newest matching publication in `archive`, if it
    /// mentions the source version.
    fn archive_changelog(
        &self,
        archive: &ArchiveRef<'_>,
        source: &SourcePackage,
        series_link: &str,
    ) -> Result<Option<String>> {
        let publications = self.published_sources(archive, source, series_link)?;
        let Some(publication) = publications.first() else {
            return Ok(None);
        };

        match self.publication_changelog(publication) {
            Ok(text) if text.contains(&source.version) => Ok(Some(text)),
            Ok(_) => {
                tracing::debug!("Changelog for {} does not mention its version", source);
                Ok(None)
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Launchpad hands out changelog links on the web host; rebase the path
/// onto the API root so the download goes through the web service.
fn api_url_for(api_base: &str, url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|e| {
        ChangelogError::remote(
            "changelogUrl",
            RemoteErrorKind::InvalidResponse(format!("{url}: {e}")),
        )
    })?;
    Ok(format!(
        "{}/{}",
        api_base.trim_end_matches('/'),
        parsed.path().trim_start_matches('/')
    ))
}

impl ArchiveResolver for LaunchpadClient {
    fn resolve_source(
        &self,
        binary_name: &str,
        binary_version: &str,
        series: &SeriesContext,
        ppas: &[Ppa],
    ) -> Result<SourcePackage> {
        let arch_series = self.arch_series_link(series)?;

        let archives =
            std::iter::once(ArchiveRef::Primary).chain(ppas.iter().map(ArchiveRef::Ppa));
        for archive in archives {
            let binaries =
                self.published_binaries(&archive, binary_name, binary_version, &arch_series)?;
            if let Some(binary) = binaries.into_iter().next() {
                return Ok(SourcePackage::new(
                    binary.source_package_name,
                    binary.source_package_version,
                ));
            }
        }

        Err(ChangelogError::source_not_found(binary_name, binary_version))
    }

    fn fetch_changelog(
        &self,
        source: &SourcePackage,
        series: &SeriesContext,
        ppas: &[Ppa],
    ) -> Result<CachedChangelog> {
        let series_link = self.series_link(&series.series)?;

        if let Some(text) = self.archive_changelog(&ArchiveRef::Primary, source, &series_link)? {
            return Ok(CachedChangelog::Found { text });
        }
        for ppa in ppas {
            let archive = ArchiveRef::Ppa(ppa);
            if let Some(text) = self.archive_changelog(&archive, source, &series_link)? {
                tracing::debug!("Changelog for {} found in ppa:{}", source, ppa);
                return Ok(CachedChangelog::Found { text });
            }
        }

        tracing::warn!("Unable to find changelog for source package {}", source);
        Ok(CachedChangelog::not_found(&source.cache_key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_for_rebases_path() {
        let url = api_url_for(
            "https://api.launchpad.net/devel/",
            "https://launchpad.net/ubuntu/+archive/primary/+sourcefiles/sl/5.02-1/changelog",
        )
        .unwrap();
        assert_eq!(
            url,
            "https://api.launchpad.net/devel/ubuntu/+archive/primary/+sourcefiles/sl/5.02-1/changelog"
        );
        assert!(api_url_for(DEFAULT_API_BASE, "not a url").is_err());
    }

    #[test]
    fn test_archive_links() {
        let client = LaunchpadClient::new(LaunchpadConfig::default()).unwrap();
        assert_eq!(
            client.archive_link(&ArchiveRef::Primary),
            "https://api.launchpad.net/devel/ubuntu/+archive/primary"
        );
        let ppa: Ppa = "cloud-team/proposed".parse().unwrap();
        assert_eq!(
            client.archive_link(&ArchiveRef::Ppa(&ppa)),
            "https://api.launchpad.net/devel/~cloud-team/+archive/ubuntu/proposed"
        );
    }

    #[test]
    fn test_collection_deserialization() {
        let json = r#"{"total_size": 1, "entries": [
            {"source_package_name": "shim-signed", "source_package_version": "1.58",
             "binary_package_name": "shim-signed"}
        ]}"#;
        let collection: Collection<BinaryPublication> = serde_json::from_str(json).unwrap();
        assert_eq!(collection.entries[0].source_package_name, "shim-signed");

        let empty: Collection<SourcePublication> = serde_json::from_str("{}").unwrap();
        assert!(empty.entries.is_empty());
    }
}
