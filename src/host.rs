//! Mapping application-relative virtual paths onto the filesystem.

use std::path::{Path, PathBuf};

/// Capability supplied by the embedding application to resolve virtual paths.
///
/// Virtual paths look like `~/scripts/app.js`, `/scripts/app.js` or `scripts/app.js`, and
/// always use forward slashes.
pub trait HostEnvironment: Send + Sync {
    /// Resolve `virtual_path` to an absolute filesystem path.
    fn map_path(&self, virtual_path: &str) -> PathBuf;
}

impl<F> HostEnvironment for F
where
    F: Fn(&str) -> PathBuf + Send + Sync,
{
    fn map_path(&self, virtual_path: &str) -> PathBuf {
        self(virtual_path)
    }
}

/// Host rooted at a single directory, the usual setup for a web application's public root.
#[derive(Debug, Clone)]
pub struct RootedHost {
    root: PathBuf,
}

impl RootedHost {
    /// Create a host resolving every virtual path beneath `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory virtual paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl HostEnvironment for RootedHost {
    fn map_path(&self, virtual_path: &str) -> PathBuf {
        let trimmed = virtual_path
            .trim_start_matches('~')
            .replace('\\', "/");

        let mut resolved = self.root.clone();
        for segment in trimmed.split('/').filter(|segment| !segment.is_empty()) {
            resolved.push(segment);
        }
        resolved
    }
}
