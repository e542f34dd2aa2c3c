//! Process-wide registry mapping bundle aliases to fixed path lists.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::asset_paths::{is_alias, normalize_paths};
use crate::error::RegistryError;

/// Concurrent alias → path list map.
///
/// Entries are written once, usually while the application starts, and only read afterwards.
/// Registering distinct names from several threads is safe. Registering and resolving the
/// *same* name concurrently is a race: the resolver may observe the alias either missing or
/// present.
#[derive(Debug, Default)]
pub struct BundleRegistry {
  bundles: DashMap<String, Arc<[String]>>,
}

impl BundleRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `paths` under `name`.
  ///
  /// The list is normalised before it is stored, so an alias may be defined in terms of an
  /// already registered alias. Re-registering an existing name is rejected and leaves the
  /// stored list untouched.
  pub fn register<S: AsRef<str>>(&self, name: &str, paths: &[S]) -> Result<(), RegistryError> {
    if !is_alias(name) {
      return Err(RegistryError::InvalidName {
        name: name.to_string(),
      });
    }

    let normalized: Arc<[String]> = normalize_paths(paths, self).into();

    match self.bundles.entry(name.to_string()) {
      Entry::Occupied(_) => Err(RegistryError::AlreadyRegistered {
        name: name.to_string(),
      }),
      Entry::Vacant(slot) => {
        tracing::debug!(bundle = name, files = normalized.len(), "registered bundle");
        slot.insert(normalized);
        Ok(())
      }
    }
  }

  /// Paths registered under `name`, or an empty list when the alias is unknown.
  pub fn resolve(&self, name: &str) -> Vec<String> {
    self
      .bundles
      .get(name)
      .map(|paths| paths.to_vec())
      .unwrap_or_default()
  }

  /// Returns `true` when `name` has been registered.
  pub fn contains(&self, name: &str) -> bool {
    self.bundles.contains_key(name)
  }

  /// Number of registered aliases.
  pub fn len(&self) -> usize {
    self.bundles.len()
  }

  /// Returns `true` when no aliases have been registered.
  pub fn is_empty(&self) -> bool {
    self.bundles.is_empty()
  }

  /// Registered alias names in sorted order.
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.bundles.iter().map(|entry| entry.key().clone()).collect();
    names.sort();
    names
  }
}
