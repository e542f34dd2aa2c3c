//! Bundle construction: read, transform, concatenate, hash and persist source files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::asset_paths::content_tag;
use crate::bundle::BundleWriter;
use crate::error::BundleError;
use crate::models::{AssetKind, BuiltBundle, ErrorPolicy, Tag, WriteOutcome};
use crate::transform::Transformer;

/// Turns an ordered list of absolute source paths into a tagged bundle file.
///
/// Each source is transformed according to its own extension, so a stylesheet bundle may mix
/// `.css` and `.less` inputs. The bundle's target kind only decides the output file extension.
pub struct TagBuilder {
  transformer: Arc<dyn Transformer>,
  writer: BundleWriter,
  output_dir: PathBuf,
  shared_output_dir: Option<PathBuf>,
  prefix: String,
  policy: ErrorPolicy,
}

impl TagBuilder {
  /// Create a builder writing bundles into `output_dir`.
  pub fn new(transformer: Arc<dyn Transformer>, output_dir: impl Into<PathBuf>) -> Self {
    Self {
      transformer,
      writer: BundleWriter::new(),
      output_dir: output_dir.into(),
      shared_output_dir: None,
      prefix: String::new(),
      policy: ErrorPolicy::default(),
    }
  }

  /// Also persist every bundle into `shared_output_dir`.
  pub fn with_shared_output_dir(mut self, shared_output_dir: Option<PathBuf>) -> Self {
    self.shared_output_dir = shared_output_dir;
    self
  }

  /// Prepend `prefix` to every computed tag.
  pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.prefix = prefix.into();
    self
  }

  /// Select how per-file and write failures are handled.
  pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
    self.policy = policy;
    self
  }

  /// Replace the writer, e.g. to change the number of lock stripes.
  pub fn with_writer(mut self, writer: BundleWriter) -> Self {
    self.writer = writer;
    self
  }

  /// Active error policy.
  pub fn policy(&self) -> ErrorPolicy {
    self.policy
  }

  /// Absolute path of the primary bundle file for `tag`.
  pub fn bundle_path(&self, tag: &Tag, kind: AssetKind) -> PathBuf {
    self.output_dir.join(tag.file_name(kind))
  }

  /// Build the bundle and return its tag.
  pub fn build_tag<P: AsRef<Path>>(&self, paths: &[P], kind: AssetKind) -> Result<Tag, BundleError> {
    self.build(paths, kind).map(|bundle| bundle.tag)
  }

  /// Build the bundle, returning its tag, content and what happened at each destination.
  pub fn build<P: AsRef<Path>>(
    &self,
    paths: &[P],
    kind: AssetKind,
  ) -> Result<BuiltBundle, BundleError> {
    let content = self.concatenate(paths)?;
    let tag = content_tag(&self.prefix, &content);

    let mut destinations = vec![self.bundle_path(&tag, kind)];
    if let Some(shared) = &self.shared_output_dir {
      destinations.push(shared.join(tag.file_name(kind)));
    }

    let mut writes = Vec::with_capacity(destinations.len());
    for destination in destinations {
      let outcome = self.persist(&destination, &content)?;
      writes.push((destination, outcome));
    }

    Ok(BuiltBundle {
      tag,
      content,
      writes,
    })
  }

  /// Read, transform and join the sources in order.
  pub fn concatenate<P: AsRef<Path>>(&self, paths: &[P]) -> Result<String, BundleError> {
    let mut content = String::new();

    for path in paths {
      let path = path.as_ref();
      let kind = AssetKind::from_path(path);

      match self.process_file(path, kind) {
        Ok(transformed) => {
          content.push_str(&transformed);
          content.push_str(kind.concatenation_token());
        }
        Err(err) if self.policy.is_strict() => return Err(err),
        Err(err) => {
          tracing::warn!(path = %path.display(), error = %err, "skipping bundle source");
        }
      }
    }

    Ok(content)
  }

  fn process_file(&self, path: &Path, kind: AssetKind) -> Result<String, BundleError> {
    let source = match fs::read_to_string(path) {
      Ok(source) => source,
      Err(err) if err.kind() == ErrorKind::NotFound => {
        return Err(BundleError::MissingSource {
          path: path.to_path_buf(),
        });
      }
      Err(err) => {
        return Err(BundleError::Process {
          path: path.to_path_buf(),
          source: anyhow::Error::new(err).context("failed to read source"),
        });
      }
    };

    self
      .transformer
      .transform(&source, kind)
      .with_context(|| format!("failed to transform {kind:?} source"))
      .map_err(|source| BundleError::Process {
        path: path.to_path_buf(),
        source,
      })
  }

  fn persist(&self, destination: &Path, content: &str) -> Result<WriteOutcome, BundleError> {
    match self.writer.write_once(destination, content) {
      Ok(WriteOutcome::Written) => {
        tracing::info!(path = %destination.display(), bytes = content.len(), "wrote bundle");
        Ok(WriteOutcome::Written)
      }
      Ok(outcome) => {
        tracing::debug!(path = %destination.display(), "bundle already present");
        Ok(outcome)
      }
      Err(source) if self.policy.is_strict() => Err(BundleError::Write {
        path: destination.to_path_buf(),
        source,
      }),
      Err(err) => {
        tracing::warn!(path = %destination.display(), error = %err, "failed to write bundle");
        Ok(WriteOutcome::Failed)
      }
    }
  }
}

impl std::fmt::Debug for TagBuilder {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TagBuilder")
      .field("output_dir", &self.output_dir)
      .field("shared_output_dir", &self.shared_output_dir)
      .field("prefix", &self.prefix)
      .field("policy", &self.policy)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::transform::{Passthrough, TransformerSet};
  use anyhow::bail;
  use tempfile::{TempDir, tempdir};

  struct Fixture {
    temp: TempDir,
    sources: PathBuf,
    output: PathBuf,
  }

  impl Fixture {
    fn new() -> Self {
      let temp = tempdir().unwrap();
      let sources = temp.path().join("src");
      let output = temp.path().join("bundles");
      fs::create_dir_all(&sources).unwrap();
      fs::create_dir_all(&output).unwrap();
      Self {
        temp,
        sources,
        output,
      }
    }

    fn source(&self, name: &str, content: &str) -> PathBuf {
      let path = self.sources.join(name);
      fs::write(&path, content).unwrap();
      path
    }

    fn builder(&self) -> TagBuilder {
      TagBuilder::new(Arc::new(Passthrough), &self.output)
    }
  }

  #[test]
  fn joins_scripts_with_statement_terminators() {
    let fixture = Fixture::new();
    let a = fixture.source("a.js", "var a = 1");
    let b = fixture.source("b.js", "var b = 2");

    let bundle = fixture.builder().build(&[a, b], AssetKind::Script).unwrap();

    assert_eq!(bundle.content, "var a = 1;\nvar b = 2;\n");
    assert_eq!(
      fs::read_to_string(fixture.output.join(format!("{}.js", bundle.tag))).unwrap(),
      bundle.content
    );
  }

  #[test]
  fn transforms_each_file_by_its_own_kind() {
    let fixture = Fixture::new();
    let css = fixture.source("reset.css", "a { }");
    let less = fixture.source("theme.less", "@c: red;");

    let transformer = TransformerSet::new().with(
      AssetKind::StylePreprocessed,
      |_source: &str, _kind: AssetKind| -> anyhow::Result<String> { Ok("b{color:red}".into()) },
    );
    let builder = TagBuilder::new(Arc::new(transformer), &fixture.output);
    let bundle = builder.build(&[css, less], AssetKind::Style).unwrap();

    assert_eq!(bundle.content, "a { }\nb{color:red}\n");
    assert!(fixture.output.join(format!("{}.css", bundle.tag)).exists());
  }

  #[test]
  fn join_token_follows_source_kind_not_target_kind() {
    let fixture = Fixture::new();
    let script = fixture.source("inline.js", "run()");

    let bundle = fixture.builder().build(&[script], AssetKind::Style).unwrap();

    assert_eq!(bundle.content, "run();\n");
  }

  #[test]
  fn second_build_does_not_write_again() {
    let fixture = Fixture::new();
    let a = fixture.source("a.css", "a{}");
    let builder = fixture.builder();

    let first = builder.build(&[&a], AssetKind::Style).unwrap();
    let second = builder.build(&[&a], AssetKind::Style).unwrap();

    assert_eq!(first.tag, second.tag);
    assert_eq!(first.written_count(), 1);
    assert_eq!(second.written_count(), 0);
    assert_eq!(second.writes[0].1, WriteOutcome::AlreadyPresent);
  }

  #[test]
  fn prefixes_tags() {
    let fixture = Fixture::new();
    let a = fixture.source("a.js", "1");

    let tag = fixture
      .builder()
      .with_prefix("v7-")
      .build_tag(&[a], AssetKind::Script)
      .unwrap();

    assert!(tag.as_str().starts_with("v7-"));
    assert!(fixture.output.join(tag.file_name(AssetKind::Script)).exists());
  }

  #[test]
  fn lenient_policy_skips_missing_sources() {
    let fixture = Fixture::new();
    let exists = fixture.source("exists.css", "a{}");
    let missing = fixture.sources.join("missing.css");

    let bundle = fixture
      .builder()
      .build(&[exists, missing], AssetKind::Style)
      .unwrap();

    assert_eq!(bundle.content, "a{}\n");
  }

  #[test]
  fn strict_policy_reports_missing_sources() {
    let fixture = Fixture::new();
    let exists = fixture.source("exists.css", "a{}");
    let missing = fixture.sources.join("missing.css");

    let error = fixture
      .builder()
      .with_policy(ErrorPolicy::Strict)
      .build(&[exists, missing.clone()], AssetKind::Style)
      .unwrap_err();

    assert!(matches!(error, BundleError::MissingSource { ref path } if *path == missing));
    assert!(error.to_string().contains("missing.css"));
    assert_eq!(fs::read_dir(&fixture.output).unwrap().count(), 0);
  }

  #[test]
  fn transform_failures_follow_the_policy() {
    let fixture = Fixture::new();
    let good = fixture.source("good.js", "ok()");
    let bad = fixture.source("bad.js", "broken(");
    let failing = |source: &str, _kind: AssetKind| -> anyhow::Result<String> {
      if source.contains("broken") {
        bail!("unexpected end of input");
      }
      Ok(source.to_string())
    };

    let lenient = TagBuilder::new(Arc::new(failing), &fixture.output);
    let bundle = lenient.build(&[&good, &bad], AssetKind::Script).unwrap();
    assert_eq!(bundle.content, "ok();\n");

    let strict = TagBuilder::new(Arc::new(failing), &fixture.output).with_policy(ErrorPolicy::Strict);
    let error = strict.build(&[&good, &bad], AssetKind::Script).unwrap_err();
    assert!(matches!(error, BundleError::Process { .. }));
    assert!(error.to_string().contains("bad.js"));
  }

  #[test]
  fn invalid_utf8_is_a_processing_failure() {
    let fixture = Fixture::new();
    let binary = fixture.sources.join("binary.js");
    fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();

    let error = fixture
      .builder()
      .with_policy(ErrorPolicy::Strict)
      .build(&[binary], AssetKind::Script)
      .unwrap_err();

    assert!(matches!(error, BundleError::Process { .. }));
  }

  #[test]
  fn writes_copies_to_the_shared_folder() {
    let fixture = Fixture::new();
    let shared = fixture.temp.path().join("shared");
    fs::create_dir_all(&shared).unwrap();
    let a = fixture.source("a.js", "1");

    let bundle = fixture
      .builder()
      .with_shared_output_dir(Some(shared.clone()))
      .build(&[a], AssetKind::Script)
      .unwrap();

    assert_eq!(bundle.written_count(), 2);
    assert_eq!(
      fs::read_to_string(shared.join(bundle.tag.file_name(AssetKind::Script))).unwrap(),
      "1;\n"
    );
  }

  #[test]
  fn write_failures_follow_the_policy() {
    let fixture = Fixture::new();
    let a = fixture.source("a.js", "1");
    let unwritable = fixture.temp.path().join("does-not-exist");

    let lenient = TagBuilder::new(Arc::new(Passthrough), &unwritable);
    let bundle = lenient.build(&[&a], AssetKind::Script).unwrap();
    assert_eq!(bundle.writes[0].1, WriteOutcome::Failed);

    let strict = TagBuilder::new(Arc::new(Passthrough), &unwritable).with_policy(ErrorPolicy::Strict);
    let error = strict.build(&[&a], AssetKind::Script).unwrap_err();
    assert!(matches!(error, BundleError::Write { .. }));
  }

  #[test]
  fn order_changes_the_tag() {
    let fixture = Fixture::new();
    let a = fixture.source("a.js", "a()");
    let b = fixture.source("b.js", "b()");
    let builder = fixture.builder();

    let forward = builder.build_tag(&[&a, &b], AssetKind::Script).unwrap();
    let reversed = builder.build_tag(&[&b, &a], AssetKind::Script).unwrap();

    assert_ne!(forward, reversed);
  }
}
