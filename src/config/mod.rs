//! Configuration module for cloud-image-changelog.
//!
//! This module provides:
//! - Type-safe configuration structures
//! - Validation for all configuration values
//! - YAML config file loading and discovery
//! - CLI argument merging
//!
//! # Configuration File
//!
//! Place a `.cloud-image-changelog.yaml` file in the working directory or
//! `~/.config/cloud-image-changelog/`:
//!
//! ```yaml
//! archive:
//!   architecture: arm64
//!   ppas:
//!     - cloud-team/proposed
//! cve:
//!   enabled: true
//! retry:
//!   attempts: 3
//! ```

mod defaults;
pub mod file;
mod types;
mod validation;

pub use defaults::*;
pub use file::{
    discover_config_file, generate_example_config, load_config_file, load_or_default,
    user_config_dir, ConfigFileError, CONFIG_FILE_NAMES,
};
pub use types::{
    AppConfig, ArchiveConfig, BehaviorConfig, CveConfig, GenerateConfig, GeneratePaths,
    OutputConfig, RetryConfig,
};
pub use validation::{ConfigError, Validatable};

/// JSON Schema of the config file format, pretty printed.
#[must_use]
pub fn generate_json_schema() -> String {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_schema_lists_sections() {
        let schema = generate_json_schema();
        for section in ["archive", "cve", "retry", "output", "behavior"] {
            assert!(schema.contains(section), "missing {section}");
        }
    }
}
