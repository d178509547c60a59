//! Run-scoped file cache for downloaded changelogs.
//!
//! Entries are keyed by source package name and version. An in-memory index
//! records every key fetched during the run; the entries themselves are
//! written to a temporary directory that is removed when the cache is dropped.
//! A lookup that found nothing is cached too, so a missing changelog costs one
//! fetch per run.

use crate::error::{ChangelogError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Cache key for changelog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub source_name: String,
    pub source_version: String,
}

impl CacheKey {
    pub fn new(source_name: impl Into<String>, source_version: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            source_version: source_version.into(),
        }
    }

    /// Convert to a filesystem-safe filename using SHA256 hash.
    #[must_use]
    pub fn to_filename(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!(
            "source:{}|version:{}",
            self.source_name, self.source_version
        ));
        let hash = hasher.finalize();
        format!("{hash:x}.json")
    }
}

/// A cached changelog lookup result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CachedChangelog {
    Found { text: String },
    NotFound {
        source_name: String,
        source_version: String,
    },
}

impl CachedChangelog {
    /// The not-found sentinel for `key`.
    #[must_use]
    pub fn not_found(key: &CacheKey) -> Self {
        Self::NotFound {
            source_name: key.source_name.clone(),
            source_version: key.source_version.clone(),
        }
    }

    /// Changelog text, or a not-found error for the sentinel.
    pub fn into_text(self) -> Result<String> {
        match self {
            Self::Found { text } => Ok(text),
            Self::NotFound {
                source_name,
                source_version,
            } => Err(ChangelogError::not_found(
                "changelog",
                format!(
                    "Unable to find changelog for source package {source_name} version {source_version}"
                ),
            )),
        }
    }
}

/// Where the entry for a fetched key lives.
#[derive(Debug)]
enum Slot {
    /// Written to the cache directory
    OnDisk,
    /// Kept in memory because the file could not be written or read back
    InMemory(CachedChangelog),
}

/// Hit and fetch counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served without fetching
    pub hits: usize,
    /// Lookups that invoked the fetcher
    pub fetches: usize,
}

/// File-based changelog cache scoped to one run.
pub struct ChangelogCache {
    dir: TempDir,
    index: RefCell<HashMap<CacheKey, Slot>>,
    hits: Cell<usize>,
    fetches: Cell<usize>,
}

impl ChangelogCache {
    /// Create a cache in a fresh temporary directory.
    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("cloud-image-changelog")
            .tempdir()
            .map_err(|e| ChangelogError::io(std::env::temp_dir(), e))?;
        tracing::debug!("Changelog cache at {}", dir.path().display());
        Ok(Self {
            dir,
            index: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            fetches: Cell::new(0),
        })
    }

    /// Directory holding the cache entries.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.path().join(key.to_filename())
    }

    /// Get a cached result for a key.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<CachedChangelog> {
        match self.index.borrow().get(key)? {
            Slot::InMemory(entry) => Some(entry.clone()),
            Slot::OnDisk => self.read_entry(key),
        }
    }

    /// Read an entry file. Unreadable or corrupt files yield `None`.
    fn read_entry(&self, key: &CacheKey) -> Option<CachedChangelog> {
        let data = match fs::read_to_string(self.entry_path(key)) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(
                    "Cannot read cache entry for {} {}: {}",
                    key.source_name,
                    key.source_version,
                    e
                );
                return None;
            }
        };
        match serde_json::from_str(&data) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupt cache entry for {} {}: {}",
                    key.source_name,
                    key.source_version,
                    e
                );
                None
            }
        }
    }

    /// Store a result.
    ///
    /// The entry stays available in memory when the file cannot be written;
    /// the write error is still returned.
    pub fn set(&self, key: &CacheKey, entry: &CachedChangelog) -> Result<()> {
        match self.write_entry(key, entry) {
            Ok(()) => {
                self.index.borrow_mut().insert(key.clone(), Slot::OnDisk);
                Ok(())
            }
            Err(e) => {
                self.index
                    .borrow_mut()
                    .insert(key.clone(), Slot::InMemory(entry.clone()));
                Err(e)
            }
        }
    }

    fn write_entry(&self, key: &CacheKey, entry: &CachedChangelog) -> Result<()> {
        let path = self.entry_path(key);
        let data = serde_json::to_string(entry)?;
        fs::write(&path, data).map_err(|e| ChangelogError::io(path, e))
    }

    /// Return the cached result for `key`, calling `fetch` only on a miss.
    ///
    /// Fetch errors are returned and not cached.
    pub fn get_or_fetch<F>(&self, key: &CacheKey, fetch: F) -> Result<CachedChangelog>
    where
        F: FnOnce() -> Result<CachedChangelog>,
    {
        let on_disk = match self.index.borrow().get(key) {
            Some(Slot::InMemory(entry)) => {
                self.hits.set(self.hits.get() + 1);
                return Ok(entry.clone());
            }
            Some(Slot::OnDisk) => true,
            None => false,
        };

        if on_disk {
            if let Some(entry) = self.read_entry(key) {
                self.hits.set(self.hits.get() + 1);
                return Ok(entry);
            }
        }

        self.fetches.set(self.fetches.get() + 1);
        let entry = fetch()?;
        if let Err(e) = self.set(key, &entry) {
            tracing::warn!("Failed to write cache entry, keeping it in memory: {}", e);
        }
        Ok(entry)
    }

    /// Get cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.get(),
            fetches: self.fetches.get(),
        }
    }
}
