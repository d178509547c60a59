//! Diffing: which packages changed between two manifests, and which
//! changelog blocks cover each change.
//!
//! # Example
//!
//! ```
//! use cloud_image_changelog::diff::{extract, RangeRequest};
//! use cloud_image_changelog::model::ChangelogDocument;
//!
//! let text = "\
//! pkga (2.0-0ubuntu1) noble; urgency=medium
//!
//!   * New upstream release.
//!
//!  -- Jane Doe <jane@example.com>  Tue, 11 Jul 2023 11:44:01 +0200
//!
//! pkga (1.0-0) noble; urgency=low
//!
//!   * Initial release.
//!
//!  -- Jane Doe <jane@example.com>  Mon, 10 Jul 2023 11:44:01 +0200
//! ";
//! let document = ChangelogDocument::parse(text).unwrap();
//! let range = extract(&document, &RangeRequest::between("1.0-0", "2.0-0ubuntu1"));
//! assert_eq!(range.blocks.len(), 1);
//! ```

mod extractor;
mod manifest_diff;

pub use extractor::{
    extract, extract_from_text, RangeExtraction, RangeNotFullyResolved, RangeRequest,
};
pub use manifest_diff::{ManifestDiff, PackageDiff, VersionChange};
