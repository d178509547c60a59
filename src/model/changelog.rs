//! Debian changelog documents.
//!
//! A changelog is a sequence of blocks, newest first, each shaped like:
//!
//! ```text
//! sl (5.02-1) noble; urgency=medium
//!
//!   * New upstream release (LP: #2001, #2002)
//!
//!  -- Jane Doe <jane@example.com>  Tue, 11 Jul 2023 11:44:01 +0200
//! ```
//!
//! Parse order is preserved exactly; nothing downstream may re-sort blocks.

use crate::error::{ChangelogError, Result};
use crate::utils::{variants, VersionVariantSet};
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\w[-+0-9A-Za-z.]*) \(([^()]*)\)((?:\s+[-+0-9A-Za-z.]+)*)\s*;(.*)$")
        .expect("static regex")
});

static TRAILER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ -- (.*<[^>]*>) ?(.*)$").expect("static regex")
});

static LP_BUGS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)lp:\s+#\d+(?:,\s*#\d+)*").expect("static regex"));

static BUG_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\s?(\d+)").expect("static regex"));

/// One versioned entry of a changelog. Read-only once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChangelogBlock {
    /// Source package name
    pub package: String,
    /// Full version string, `None` when the header carried no usable version
    pub version: Option<String>,
    /// Target distribution(s), space separated
    pub distributions: String,
    pub urgency: String,
    /// Change lines as authored, indentation included
    pub changes: Vec<String>,
    /// `Name <email>` from the trailer
    pub author: String,
    /// Date text from the trailer
    pub date: String,
    /// Launchpad bugs closed by this upload (`LP: #N`)
    pub lp_bugs_closed: Vec<u64>,
}

impl ChangelogBlock {
    /// The textual spellings this block's version may be matched by.
    #[must_use]
    pub fn version_variants(&self) -> Option<VersionVariantSet> {
        self.version.as_deref().map(variants)
    }

    /// The header line as it appears in a changelog.
    #[must_use]
    pub fn header_line(&self) -> String {
        format!(
            "{} ({}) {}; urgency={}",
            self.package,
            self.version.as_deref().unwrap_or(""),
            self.distributions,
            self.urgency
        )
    }

    /// The trailer date, if it is valid RFC 2822.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc2822(self.date.trim()).ok()
    }
}

/// A parsed changelog: blocks in authored (newest-first) order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangelogDocument {
    blocks: Vec<ChangelogBlock>,
}

impl ChangelogDocument {
    /// Wrap already-built blocks, keeping their order.
    #[must_use]
    pub const fn from_blocks(blocks: Vec<ChangelogBlock>) -> Self {
        Self { blocks }
    }

    /// Parse debian changelog text.
    ///
    /// Fails with [`ChangelogError::MalformedChangelog`] only when no block
    /// header can be found at all. Stray lines outside blocks are skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let mut blocks = Vec::new();
        let mut current: Option<ChangelogBlock> = None;
        let mut stray_lines = 0usize;

        for line in text.lines() {
            if let Some(caps) = HEADER.captures(line) {
                if let Some(block) = current.take() {
                    blocks.push(finish_block(block));
                }
                let version = caps[2].trim();
                current = Some(ChangelogBlock {
                    package: caps[1].to_string(),
                    version: (!version.is_empty() && !version.contains(char::is_whitespace))
                        .then(|| version.to_string()),
                    distributions: caps[3].split_whitespace().collect::<Vec<_>>().join(" "),
                    urgency: parse_urgency(&caps[4]),
                    changes: Vec::new(),
                    author: String::new(),
                    date: String::new(),
                    lp_bugs_closed: Vec::new(),
                });
                continue;
            }

            match current.as_mut() {
                Some(block) => {
                    if let Some(caps) = TRAILER.captures(line) {
                        block.author = caps[1].trim().to_string();
                        block.date = caps[2].trim().to_string();
                        if let Some(done) = current.take() {
                            blocks.push(finish_block(done));
                        }
                    } else {
                        block.changes.push(line.to_string());
                    }
                }
                None if line.trim().is_empty() => {}
                None => stray_lines += 1,
            }
        }

        if let Some(block) = current.take() {
            tracing::debug!(
                "Changelog block {} has no trailer line",
                block.version.as_deref().unwrap_or("<none>")
            );
            blocks.push(finish_block(block));
        }

        if blocks.is_empty() {
            let reason = if text.trim().is_empty() {
                "changelog is empty".to_string()
            } else {
                format!("no changelog block headers found in {stray_lines} lines")
            };
            return Err(ChangelogError::malformed("parsing changelog", reason));
        }
        if stray_lines > 0 {
            tracing::debug!("Skipped {} lines outside changelog blocks", stray_lines);
        }

        Ok(Self { blocks })
    }

    #[must_use]
    pub fn blocks(&self) -> &[ChangelogBlock] {
        &self.blocks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChangelogBlock> {
        self.blocks.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl<'a> IntoIterator for &'a ChangelogDocument {
    type Item = &'a ChangelogBlock;
    type IntoIter = std::slice::Iter<'a, ChangelogBlock>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Trim blank edges off the change lines and collect closed bugs.
fn finish_block(mut block: ChangelogBlock) -> ChangelogBlock {
    while block.changes.first().is_some_and(|l| l.trim().is_empty()) {
        block.changes.remove(0);
    }
    while block.changes.last().is_some_and(|l| l.trim().is_empty()) {
        block.changes.pop();
    }

    if !block.date.is_empty() && block.timestamp().is_none() {
        tracing::debug!(
            "Unparseable date '{}' in changelog block {}",
            block.date,
            block.version.as_deref().unwrap_or("<none>")
        );
    }

    let mut bugs = Vec::new();
    for line in &block.changes {
        for mention in LP_BUGS.find_iter(line) {
            for caps in BUG_NUMBER.captures_iter(mention.as_str()) {
                if let Ok(bug) = caps[1].parse::<u64>() {
                    if !bugs.contains(&bug) {
                        bugs.push(bug);
                    }
                }
            }
        }
    }
    block.lp_bugs_closed = bugs;
    block
}

/// Extract `urgency=` from the `key=value, key=value` tail of a header.
fn parse_urgency(fields: &str) -> String {
    fields
        .split(',')
        .filter_map(|field| field.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("urgency"))
        .map_or_else(|| "unknown".to_string(), |(_, value)| value.trim().to_string())
}
