//! In-memory memo of path-set keys to tags, invalidated by changes to the source files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use dashmap::DashMap;

use crate::models::Tag;

/// Snapshot of a dependency file's identity at the time a tag was computed.
///
/// Identity is the modification time and length only. An edit that keeps the length and
/// lands within the filesystem's timestamp resolution compares equal, so it is missed until
/// the file changes again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStamp {
  path: PathBuf,
  state: Option<(Option<SystemTime>, u64)>,
}

impl FileStamp {
  /// Record the current modification time and length of `path`, or its absence.
  pub fn capture(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let state = fs::metadata(&path)
      .ok()
      .map(|metadata| (metadata.modified().ok(), metadata.len()));
    Self { path, state }
  }

  /// Path this stamp watches.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Returns `true` when the file existed when the stamp was captured.
  pub fn existed(&self) -> bool {
    self.state.is_some()
  }

  /// Returns `true` when the file was modified, deleted or created since capture.
  pub fn is_stale(&self) -> bool {
    Self::capture(self.path.clone()) != *self
  }
}

#[derive(Debug, Clone)]
struct CacheEntry {
  tag: Tag,
  dependencies: Vec<FileStamp>,
}

impl CacheEntry {
  fn is_fresh(&self) -> bool {
    self.dependencies.iter().all(|stamp| !stamp.is_stale())
  }
}

/// Concurrent map from path-set keys to tags.
///
/// There is no expiry: an entry lives until one of its dependency files changes, at which
/// point the next lookup evicts it and reports a miss.
#[derive(Debug, Default)]
pub struct ResolutionCache {
  entries: DashMap<String, CacheEntry>,
}

impl ResolutionCache {
  /// Create an empty cache.
  pub fn new() -> Self {
    Self::default()
  }

  /// Look up the tag stored under `key`, provided its dependencies are unchanged.
  pub fn get(&self, key: &str) -> Option<Tag> {
    let fresh = {
      let entry = self.entries.get(key)?;
      entry.is_fresh().then(|| entry.tag.clone())
    };

    if fresh.is_none() && self.evict_stale(key) {
      tracing::debug!(key, "dependency changed, evicted cached tag");
    }
    fresh
  }

  /// Remove the entry under `key` only if it is still stale; a concurrent insert survives.
  fn evict_stale(&self, key: &str) -> bool {
    self
      .entries
      .remove_if(key, |_, entry| !entry.is_fresh())
      .is_some()
  }

  /// Store `tag` under `key`, replacing any previous entry.
  pub fn insert(&self, key: impl Into<String>, tag: Tag, dependencies: Vec<FileStamp>) {
    self
      .entries
      .insert(key.into(), CacheEntry { tag, dependencies });
  }

  /// Drop the entry stored under `key`, returning its tag.
  pub fn invalidate(&self, key: &str) -> Option<Tag> {
    self.entries.remove(key).map(|(_, entry)| entry.tag)
  }

  /// Drop every entry.
  pub fn clear(&self) {
    self.entries.clear();
  }

  /// Number of stored entries, including ones that have gone stale but were not looked up yet.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Returns `true` when nothing is cached.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
