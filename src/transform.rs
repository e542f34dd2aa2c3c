//! Pluggable content transformation applied to every source file before concatenation.
//!
//! Minifiers and stylesheet compilers live outside this crate. Callers plug them in through
//! [`Transformer`], either as a single implementation that switches on [`AssetKind`] or as a
//! [`TransformerSet`] holding one implementation per kind.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;

use crate::models::AssetKind;

/// Capability turning raw source text into the text that is bundled.
pub trait Transformer: Send + Sync {
  /// Transform `source`, which was read from a file of the given kind.
  fn transform(&self, source: &str, kind: AssetKind) -> Result<String>;
}

impl<F> Transformer for F
where
  F: Fn(&str, AssetKind) -> Result<String> + Send + Sync,
{
  fn transform(&self, source: &str, kind: AssetKind) -> Result<String> {
    self(source, kind)
  }
}

/// Returns the source unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl Transformer for Passthrough {
  fn transform(&self, source: &str, _kind: AssetKind) -> Result<String> {
    Ok(source.to_string())
  }
}

/// Per-kind dispatch table. Kinds without a registered transformer pass through.
#[derive(Clone, Default)]
pub struct TransformerSet {
  by_kind: BTreeMap<AssetKind, Arc<dyn Transformer>>,
}

impl TransformerSet {
  /// Create an empty set that passes every kind through.
  pub fn new() -> Self {
    Self::default()
  }

  /// Use `transformer` for files of `kind`, replacing any previous entry.
  pub fn with(mut self, kind: AssetKind, transformer: impl Transformer + 'static) -> Self {
    self.by_kind.insert(kind, Arc::new(transformer));
    self
  }

  /// Returns `true` when a dedicated transformer is registered for `kind`.
  pub fn handles(&self, kind: AssetKind) -> bool {
    self.by_kind.contains_key(&kind)
  }
}

impl Transformer for TransformerSet {
  fn transform(&self, source: &str, kind: AssetKind) -> Result<String> {
    match self.by_kind.get(&kind) {
      Some(transformer) => transformer.transform(source, kind),
      None => Passthrough.transform(source, kind),
    }
  }
}

impl std::fmt::Debug for TransformerSet {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TransformerSet")
      .field("kinds", &self.by_kind.keys().collect::<Vec<_>>())
      .finish()
  }
}
