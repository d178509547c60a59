//! Shared utilities.

mod hash;
pub mod retry;
mod version;

pub use hash::content_hash;
pub use retry::{RetryPolicy, Sleeper, ThreadSleeper};
pub use version::{compare_versions, variants, VersionVariantSet};
