//! Configuration validation for cloud-image-changelog.
//!
//! Provides validation traits and implementations for all configuration types.

use super::types::{AppConfig, ArchiveConfig, BehaviorConfig, CveConfig, RetryConfig};
use crate::archive::Ppa;

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        errors.extend(self.archive.validate());
        errors.extend(self.cve.validate());
        errors.extend(self.retry.validate());
        errors.extend(self.behavior.validate());
        errors
    }
}

fn check_url(errors: &mut Vec<ConfigError>, field: &str, value: &str) {
    if !(value.starts_with("https://") || value.starts_with("http://")) {
        errors.push(ConfigError::new(
            field,
            format!("'{value}' is not an http(s) URL"),
        ));
    }
}

impl Validatable for ArchiveConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        check_url(&mut errors, "archive.api_base", &self.api_base);

        if self.distribution.trim().is_empty() {
            errors.push(ConfigError::new("archive.distribution", "must not be empty"));
        }
        if self.architecture.trim().is_empty() {
            errors.push(ConfigError::new("archive.architecture", "must not be empty"));
        }
        for ppa in &self.ppas {
            if let Err(e) = ppa.parse::<Ppa>() {
                errors.push(ConfigError::new("archive.ppas", e.to_string()));
            }
        }
        if self.timeout_secs == 0 {
            errors.push(ConfigError::new("archive.timeout_secs", "must be greater than 0"));
        }
        errors
    }
}

impl Validatable for CveConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        check_url(&mut errors, "cve.tracker_base", &self.tracker_base);
        check_url(&mut errors, "cve.url_base", &self.url_base);
        if self.timeout_secs == 0 {
            errors.push(ConfigError::new("cve.timeout_secs", "must be greater than 0"));
        }
        errors
    }
}

impl Validatable for RetryConfig {
    fn validate(&self) -> Vec<ConfigError> {
        if self.attempts == 0 {
            vec![ConfigError::new("retry.attempts", "must be at least 1")]
        } else {
            Vec::new()
        }
    }
}

impl Validatable for BehaviorConfig {
    fn validate(&self) -> Vec<ConfigError> {
        if self.added_package_entries == 0 {
            vec![ConfigError::new(
                "behavior.added_package_entries",
                "must be at least 1",
            )]
        } else {
            Vec::new()
        }
    }
}
