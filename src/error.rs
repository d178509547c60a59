//! Unified error types for cloud-image-changelog.
//!
//! Per-package failures are reported through [`ChangelogError`]; the run
//! aggregator decides whether one of them is fatal. Unresolved version ranges
//! are not errors at all, see [`crate::diff::RangeNotFullyResolved`].

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cloud-image-changelog operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ChangelogError {
    /// The raw changelog text could not be split into any blocks
    #[error("Malformed changelog ({context}): {reason}")]
    MalformedChangelog { context: String, reason: String },

    /// No archive or PPA publication matches a binary package/version
    #[error("Unable to find source package for {package} {version}")]
    SourceNotFound { package: String, version: String },

    /// Failures talking to the archive or the CVE tracker
    #[error("Remote request failed: {context}")]
    Remote {
        context: String,
        #[source]
        source: RemoteErrorKind,
    },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),
}

/// Specific remote error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RemoteErrorKind {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Convenient Result type for cloud-image-changelog operations
pub type Result<T> = std::result::Result<T, ChangelogError>;

impl ChangelogError {
    /// Create a malformed-changelog error
    pub fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedChangelog {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Create a source-not-found error
    pub fn source_not_found(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self::SourceNotFound {
            package: package.into(),
            version: version.into(),
        }
    }

    /// Create a remote error with context
    pub fn remote(context: impl Into<String>, source: RemoteErrorKind) -> Self {
        Self::Remote {
            context: context.into(),
            source,
        }
    }

    /// Create a not-found remote error
    pub fn not_found(context: impl Into<String>, what: impl Into<String>) -> Self {
        Self::remote(context, RemoteErrorKind::NotFound(what.into()))
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let message = format!("{source}");
        Self::Io {
            path: Some(path.into()),
            message,
            source,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the remote side reported that the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Remote {
                source: RemoteErrorKind::NotFound(_),
                ..
            }
        )
    }

    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Network failures, 5xx responses and 429 are transient. Everything
    /// else, including not-found, is terminal for that request.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Remote { source, .. } => match source {
                RemoteErrorKind::Network(_) => true,
                RemoteErrorKind::Status { status, .. } => *status >= 500 || *status == 429,
                RemoteErrorKind::NotFound(_) | RemoteErrorKind::InvalidResponse(_) => false,
            },
            _ => false,
        }
    }
}

impl From<std::io::Error> for ChangelogError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ChangelogError {
    fn from(err: serde_json::Error) -> Self {
        Self::remote(
            "JSON deserialization",
            RemoteErrorKind::InvalidResponse(err.to_string()),
        )
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// The context string is prepended to the error's existing context, so a
/// failure deep in the archive client reads like
/// `"resolving linux-image: getPublishedBinaries: ..."`.
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, evaluated only on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<ChangelogError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

fn add_context_to_error(err: ChangelogError, new_ctx: &str) -> ChangelogError {
    match err {
        ChangelogError::MalformedChangelog { context, reason } => {
            ChangelogError::MalformedChangelog {
                context: chain_context(new_ctx, &context),
                reason,
            }
        }
        ChangelogError::Remote { context, source } => ChangelogError::Remote {
            context: chain_context(new_ctx, &context),
            source,
        },
        ChangelogError::Io {
            path,
            message,
            source,
        } => ChangelogError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        ChangelogError::Config(msg) => ChangelogError::Config(chain_context(new_ctx, &msg)),
        ChangelogError::Validation(msg) => {
            ChangelogError::Validation(chain_context(new_ctx, &msg))
        }
        // The package/version pair already says everything there is to say.
        other @ ChangelogError::SourceNotFound { .. } => other,
    }
}

/// Chain two context strings together as `"new: existing"`.
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to an error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;

    /// Convert None to an error with context from a closure.
    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| ChangelogError::Validation(context.into()))
    }

    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| ChangelogError::Validation(f().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChangelogError::source_not_found("sl", "5.02-1");
        assert_eq!(err.to_string(), "Unable to find source package for sl 5.02-1");

        let err = ChangelogError::malformed("sl 5.02-1", "no changelog blocks found");
        assert!(err.to_string().contains("no changelog blocks found"));
    }

    #[test]
    fn test_transient_classification() {
        let net = ChangelogError::remote("get", RemoteErrorKind::Network("reset".into()));
        assert!(net.is_transient());

        let server = ChangelogError::remote(
            "get",
            RemoteErrorKind::Status {
                status: 503,
                body: String::new(),
            },
        );
        assert!(server.is_transient());

        let client = ChangelogError::remote(
            "get",
            RemoteErrorKind::Status {
                status: 400,
                body: String::new(),
            },
        );
        assert!(!client.is_transient());

        let missing = ChangelogError::not_found("get", "active/CVE-2023-1111");
        assert!(!missing.is_transient());
        assert!(missing.is_not_found());
    }

    #[test]
    fn test_context_chaining_multiple_levels() {
        fn inner() -> Result<()> {
            Err(ChangelogError::remote(
                "base",
                RemoteErrorKind::Network("timeout".into()),
            ))
        }

        fn outer() -> Result<()> {
            inner().context("middle layer").context("outer layer")
        }

        match outer() {
            Err(ChangelogError::Remote { context, .. }) => {
                assert_eq!(context, "outer layer: middle layer: base");
            }
            other => panic!("Expected Remote error, got {other:?}"),
        }
    }

    #[test]
    fn test_context_keeps_source_not_found() {
        let result: Result<()> = Err(ChangelogError::source_not_found("sl", "1.0"));
        match result.context("resolving") {
            Err(ChangelogError::SourceNotFound { package, version }) => {
                assert_eq!(package, "sl");
                assert_eq!(version, "1.0");
            }
            other => panic!("Expected SourceNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_with_context_lazy_evaluation() {
        let mut called = false;
        let ok_result: Result<i32> = Ok(42);
        let _ = ok_result.with_context(|| {
            called = true;
            "should not be called"
        });
        assert!(!called);
    }

    #[test]
    fn test_option_context() {
        let none_value: Option<i32> = None;
        match none_value.context_none("missing value") {
            Err(ChangelogError::Validation(msg)) => assert_eq!(msg, "missing value"),
            other => panic!("Expected Validation error, got {other:?}"),
        }
        assert_eq!(Some(1).context_none("unused").unwrap(), 1);
    }

    #[test]
    fn test_chain_context_helper() {
        assert_eq!(chain_context("new", ""), "new");
        assert_eq!(chain_context("new", "existing"), "new: existing");
    }
}
