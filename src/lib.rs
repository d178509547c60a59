//! **Package changelogs between two Ubuntu cloud images.**
//!
//! `cloud-image-changelog` compares the package manifests of two cloud images
//! and, for every deb that changed, pulls the Debian changelog of its source
//! package and extracts the entries that lie between the two versions. The
//! result is a [`ChangelogReport`] that renders as a console changelog or as
//! JSON.
//!
//! ## Core Concepts & Modules
//!
//! - **[`model`]**: manifests, parsed changelogs ([`ChangelogDocument`]) and
//!   the report model.
//! - **[`diff`]**: the manifest diff and the version range extractor
//!   ([`extract`]), which selects the changelog blocks in `(from, to]`.
//! - **[`archive`]**: the [`ArchiveResolver`] seam and its Launchpad
//!   implementation.
//! - **[`enrichment`]**: CVE annotation ([`CveAnnotator`]) and the
//!   run-scoped changelog cache.
//! - **[`pipeline`]**: [`ChangelogGenerator`], which drives a run.
//! - **[`reports`]**: text and JSON renderers.
//! - **[`config`]**: YAML configuration, discovery and validation.
//!
//! ## Extracting a Version Range
//!
//! ```
//! use cloud_image_changelog::{extract_from_text, RangeRequest};
//!
//! let changelog = "\
//! pkga (2.0-1) noble; urgency=medium
//!
//!   * New upstream release.
//!
//!  -- Jane Doe <jane@example.com>  Tue, 11 Jul 2023 11:44:01 +0200
//!
//! pkga (1.0-1) jammy; urgency=low
//!
//!   * Initial release.
//!
//!  -- Jane Doe <jane@example.com>  Sun, 09 Jul 2023 11:44:01 +0200
//! ";
//!
//! let extraction = extract_from_text(changelog, &RangeRequest::between("1.0-1", "2.0-1")).unwrap();
//! assert_eq!(extraction.blocks.len(), 1);
//! assert_eq!(extraction.blocks[0].version.as_deref(), Some("2.0-1"));
//! assert!(extraction.is_fully_resolved());
//! ```
//!
//! ## Feature Flags
//!
//! - `network` (default): the Launchpad and CVE tracker HTTP clients. Without
//!   it the library still parses, extracts and renders, and callers supply
//!   their own [`ArchiveResolver`].

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod archive;
pub mod cli;
pub mod config;
pub mod diff;
pub mod enrichment;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod reports;
pub mod utils;

// Re-export main types for convenience
pub use archive::{ArchiveResolver, Ppa, SeriesContext, SourcePackage};
pub use config::{AppConfig, ConfigError, GenerateConfig, Validatable};
pub use diff::{
    extract, extract_from_text, ManifestDiff, RangeExtraction, RangeNotFullyResolved,
    RangeRequest,
};
pub use enrichment::{ChangelogCache, CveAnnotator, CveLocation, CveMetadataSource};
pub use error::{ChangelogError, ErrorContext, OptionContext, Result};
pub use model::{ChangelogBlock, ChangelogDocument, ChangelogReport, CveRecord, Manifest};
pub use pipeline::{ChangelogGenerator, GenerateOptions};
pub use reports::{ReportFormat, ReportGenerator};
pub use utils::{compare_versions, variants, RetryPolicy, VersionVariantSet};
