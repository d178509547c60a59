//! Data model for manifests, changelogs and the generated report.
//!
//! Changelog documents are always kept in authored order (newest first);
//! see [`ChangelogDocument`].

mod changelog;
mod cve;
mod manifest;
mod report;

pub use changelog::*;
pub use cve::*;
pub use manifest::*;
pub use report::*;
