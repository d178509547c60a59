//! Pipeline orchestration for changelog generation.
//!
//! [`ChangelogGenerator`] drives one run over two manifests; the output
//! helpers here are shared by the CLI command handlers.

mod generate;
mod output;

pub use generate::{ChangelogGenerator, GenerateOptions, DEFAULT_ADDED_PACKAGE_ENTRIES};
pub use output::{should_use_color, write_output, OutputTarget};

/// Structured pipeline error types for better diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to read a manifest file
    #[error("Failed to load manifest {path}: {source}")]
    ManifestFailed {
        path: String,
        #[source]
        source: crate::ChangelogError,
    },

    /// Report rendering or output failed
    #[error("Report failed: {source}")]
    ReportFailed {
        #[source]
        source: anyhow::Error,
    },
}

/// Process exit codes
pub mod exit_codes {
    /// Every package was processed
    pub const SUCCESS: i32 = 0;
    /// The report was produced but some packages failed
    pub const PARTIAL_FAILURE: i32 = 1;
    /// Nothing could be produced
    pub const ERROR: i32 = 2;
}
