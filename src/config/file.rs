//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::types::AppConfig;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".cloud-image-changelog.yaml",
    ".cloud-image-changelog.yml",
    "cloud-image-changelog.yaml",
];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. User config directory (~/.config/cloud-image-changelog/)
/// 4. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    if let Some(path) = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_in_dir(&cwd))
    {
        return Some(path);
    }

    if let Some(path) = user_config_dir().and_then(|dir| find_config_in_dir(&dir)) {
        return Some(path);
    }

    dirs::home_dir().and_then(|home| find_config_in_dir(&home))
}

/// `~/.config/cloud-image-changelog` or the platform equivalent.
#[must_use]
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cloud-image-changelog"))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    /// File not found
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// IO error reading file
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// YAML parsing error
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Load config from discovered file, or return default.
#[must_use]
pub fn load_or_default(explicit_path: Option<&Path>) -> (AppConfig, Option<PathBuf>) {
    discover_config_file(explicit_path).map_or_else(
        || (AppConfig::default(), None),
        |path| match load_config_file(&path) {
            Ok(config) => (config, Some(path)),
            Err(e) => {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                (AppConfig::default(), None)
            }
        },
    )
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Merge another config into this one, with `other` taking precedence.
    ///
    /// A field of `other` only overrides when it differs from its default.
    pub fn merge(&mut self, other: &Self) {
        let defaults = Self::default();

        // Archive config
        if other.archive.api_base != defaults.archive.api_base {
            self.archive.api_base.clone_from(&other.archive.api_base);
        }
        if other.archive.distribution != defaults.archive.distribution {
            self.archive.distribution.clone_from(&other.archive.distribution);
        }
        if other.archive.architecture != defaults.archive.architecture {
            self.archive.architecture.clone_from(&other.archive.architecture);
        }
        if !other.archive.ppas.is_empty() {
            self.archive.ppas.clone_from(&other.archive.ppas);
        }
        if other.archive.timeout_secs != defaults.archive.timeout_secs {
            self.archive.timeout_secs = other.archive.timeout_secs;
        }

        // CVE config
        if other.cve.enabled {
            self.cve.enabled = true;
        }
        if other.cve.tracker_base != defaults.cve.tracker_base {
            self.cve.tracker_base.clone_from(&other.cve.tracker_base);
        }
        if other.cve.url_base != defaults.cve.url_base {
            self.cve.url_base.clone_from(&other.cve.url_base);
        }
        if other.cve.timeout_secs != defaults.cve.timeout_secs {
            self.cve.timeout_secs = other.cve.timeout_secs;
        }

        // Retry config
        if other.retry.attempts != defaults.retry.attempts {
            self.retry.attempts = other.retry.attempts;
        }
        if other.retry.delay_unit_ms != defaults.retry.delay_unit_ms {
            self.retry.delay_unit_ms = other.retry.delay_unit_ms;
        }

        // Output config - only override if explicitly set
        if other.output.format != defaults.output.format {
            self.output.format = other.output.format;
        }
        if other.output.file.is_some() {
            self.output.file.clone_from(&other.output.file);
        }
        if other.output.pretty {
            self.output.pretty = true;
        }
        if other.output.no_color {
            self.output.no_color = true;
        }

        // Behavior config
        if other.behavior.added_package_entries != defaults.behavior.added_package_entries {
            self.behavior.added_package_entries = other.behavior.added_package_entries;
        }
        if other.behavior.quiet {
            self.behavior.quiet = true;
        }
    }

    /// Load from file and merge with CLI overrides.
    #[must_use]
    pub fn from_file_with_overrides(
        config_path: Option<&Path>,
        cli_overrides: &Self,
    ) -> (Self, Option<PathBuf>) {
        let (mut config, loaded_from) = load_or_default(config_path);
        config.merge(cli_overrides);
        (config, loaded_from)
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate an example config file content.
#[must_use]
pub fn generate_example_config() -> String {
    let example = AppConfig::default();
    format!(
        r"# cloud-image-changelog configuration
# Place this file at .cloud-image-changelog.yaml in the working directory
# or in ~/.config/cloud-image-changelog/

{}",
        serde_yaml::to_string(&example).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::ReportFormat;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_in_dir() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(".cloud-image-changelog.yaml");
        std::fs::write(&config_path, "cve:\n  enabled: true\n").unwrap();

        let found = find_config_in_dir(tmp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_in_dir_not_found() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(find_config_in_dir(tmp.path()), None);
    }

    #[test]
    fn test_load_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");

        let yaml = r"
archive:
  architecture: arm64
  ppas:
    - cloud-team/proposed
cve:
  enabled: true
output:
  format: json
  pretty: true
";
        std::fs::write(&config_path, yaml).unwrap();

        let config = load_config_file(&config_path).unwrap();
        assert_eq!(config.archive.architecture, "arm64");
        assert_eq!(config.archive.ppas, vec!["cloud-team/proposed"]);
        assert_eq!(config.archive.distribution, "ubuntu");
        assert!(config.cve.enabled);
        assert_eq!(config.output.format, ReportFormat::Json);
        assert!(config.output.pretty);
        assert_eq!(config.retry.attempts, 5);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config_file(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(ConfigFileError::NotFound(_))));
    }

    #[test]
    fn test_load_config_file_invalid_yaml() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.yaml");
        std::fs::write(&config_path, "retry: [not, a, map]\n").unwrap();
        assert!(matches!(
            load_config_file(&config_path),
            Err(ConfigFileError::Parse(_))
        ));
    }

    #[test]
    fn test_config_merge() {
        let mut base = AppConfig::default();
        base.archive.ppas = vec!["file/ppa".to_string()];
        base.retry.attempts = 7;

        let mut overrides = AppConfig::default();
        overrides.archive.architecture = "arm64".to_string();
        overrides.cve.enabled = true;
        overrides.output.format = ReportFormat::Json;

        base.merge(&overrides);

        assert_eq!(base.archive.architecture, "arm64");
        assert_eq!(base.archive.ppas, vec!["file/ppa"]);
        assert_eq!(base.retry.attempts, 7);
        assert!(base.cve.enabled);
        assert_eq!(base.output.format, ReportFormat::Json);
    }

    #[test]
    fn test_generate_example_config() {
        let example = generate_example_config();
        assert!(example.contains("archive:"));
        assert!(example.contains("api_base"));
        let yaml = example
            .lines()
            .filter(|l| !l.starts_with('#'))
            .collect::<Vec<_>>()
            .join("\n");
        let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    #[test]
    fn test_discover_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("custom-config.yaml");
        std::fs::write(&config_path, "behavior:\n  quiet: true\n").unwrap();

        let discovered = discover_config_file(Some(&config_path));
        assert_eq!(discovered, Some(config_path));
    }
}
