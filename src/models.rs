//! Data structures shared by the builder, cache and renderer.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Transformation and formatting category of a source or output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
  /// JavaScript sources, `.js`.
  Script,
  /// Plain stylesheets, `.css`.
  Style,
  /// Stylesheets that must be compiled before use, `.less`.
  StylePreprocessed,
  /// Anything else. Passed through untouched.
  Unknown,
}

impl AssetKind {
  /// Detect the kind of a file from its extension.
  pub fn from_path(path: impl AsRef<Path>) -> Self {
    let Some(extension) = path.as_ref().extension().and_then(|ext| ext.to_str()) else {
      return Self::Unknown;
    };

    if extension.eq_ignore_ascii_case("js") {
      Self::Script
    } else if extension.eq_ignore_ascii_case("css") {
      Self::Style
    } else if extension.eq_ignore_ascii_case("less") {
      Self::StylePreprocessed
    } else {
      Self::Unknown
    }
  }

  /// Extension of bundle files produced for this kind.
  ///
  /// Preprocessed stylesheets compile down to CSS, so they share the `.css` extension.
  pub fn file_extension(self) -> &'static str {
    match self {
      Self::Script => ".js",
      Self::Style | Self::StylePreprocessed => ".css",
      Self::Unknown => "",
    }
  }

  /// Token appended after each file's transformed content when concatenating.
  pub fn concatenation_token(self) -> &'static str {
    match self {
      Self::Script => ";\n",
      Self::Style | Self::StylePreprocessed | Self::Unknown => "\n",
    }
  }
}

/// Content-derived identifier of a bundle, used as its output file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
  /// Wrap an already computed tag value.
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  /// Borrow the tag as a string slice.
  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// File name of the bundle for the provided kind.
  pub fn file_name(&self, kind: AssetKind) -> String {
    format!("{}{}", self.0, kind.file_extension())
  }
}

impl fmt::Display for Tag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl AsRef<str> for Tag {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

/// How per-file and write failures are handled while building a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
  /// Drop the failing source and keep going. Used for live traffic.
  #[default]
  Lenient,
  /// Abort the build and report the failing path.
  Strict,
}

impl ErrorPolicy {
  /// Returns `true` when failures must be surfaced to the caller.
  pub fn is_strict(self) -> bool {
    matches!(self, Self::Strict)
  }
}

/// Result of a single persistence attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
  /// The bundle file did not exist and was written.
  Written,
  /// A bundle file already existed at the destination; nothing was written.
  AlreadyPresent,
  /// Writing failed and the error was swallowed.
  Failed,
}

/// Detailed output of a bundle build.
#[derive(Debug, Clone)]
pub struct BuiltBundle {
  /// Tag computed from the concatenated content.
  pub tag: Tag,
  /// Final concatenated, transformed content.
  pub content: String,
  /// Destination paths together with what happened when persisting to them.
  pub writes: Vec<(PathBuf, WriteOutcome)>,
}

impl BuiltBundle {
  /// Number of destinations that were freshly written by this build.
  pub fn written_count(&self) -> usize {
    self
      .writes
      .iter()
      .filter(|(_, outcome)| *outcome == WriteOutcome::Written)
      .count()
  }
}
