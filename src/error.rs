//! Error types surfaced by the bundler.

use std::path::PathBuf;

/// Errors raised while building or serving bundles.
///
/// Per-file and write variants are only returned under [`crate::ErrorPolicy::Strict`];
/// the lenient policy logs them and carries on.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
  /// A source file referenced by the bundle does not exist.
  #[error("source file not found: {}", path.display())]
  MissingSource {
    /// Absolute path of the missing file.
    path: PathBuf,
  },
  /// Reading or transforming a source file failed.
  #[error("error occurred processing file {}", path.display())]
  Process {
    /// Absolute path of the offending file.
    path: PathBuf,
    /// Underlying failure.
    #[source]
    source: anyhow::Error,
  },
  /// Persisting a bundle file failed.
  #[error("failed to write bundle {}", path.display())]
  Write {
    /// Destination that could not be written.
    path: PathBuf,
    /// Underlying I/O failure.
    #[source]
    source: std::io::Error,
  },
  /// The bundler could not be initialised from its configuration.
  #[error("invalid bundler configuration: {0}")]
  Config(String),
  /// Setting up an output folder failed.
  #[error("failed to prepare output folder {}", path.display())]
  OutputFolder {
    /// Folder that could not be created.
    path: PathBuf,
    /// Underlying I/O failure.
    #[source]
    source: std::io::Error,
  },
  /// Registering a bundle alias failed.
  #[error(transparent)]
  Registry(#[from] RegistryError),
}

/// Errors raised by the bundle alias registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
  /// An alias with the same name has already been registered.
  #[error("bundle `{name}` is already registered")]
  AlreadyRegistered {
    /// Alias name.
    name: String,
  },
  /// Alias names must start with the alias sigil.
  #[error("bundle name `{name}` must start with `#`")]
  InvalidName {
    /// Rejected alias name.
    name: String,
  },
}
