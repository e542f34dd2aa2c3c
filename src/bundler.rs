//! The long-lived bundling service exposing the public operations.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use same_file::is_same_file;

use crate::asset_paths::{is_valid_tag_prefix, join_url, key_for_paths, normalize_paths};
use crate::builder::TagBuilder;
use crate::bundle::render_references;
use crate::cache::{FileStamp, ResolutionCache};
use crate::config::BundlerConfig;
use crate::error::{BundleError, RegistryError};
use crate::host::HostEnvironment;
use crate::models::{AssetKind, Tag};
use crate::registry::BundleRegistry;
use crate::transform::Transformer;

/// Per-request rendering switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
  /// Render individual source references even when the bundler is not in debug mode.
  pub bundle_debug: bool,
}

impl RenderOptions {
  /// Options for a regular request.
  pub fn bundled() -> Self {
    Self::default()
  }

  /// Options forcing unbundled output.
  pub fn unbundled() -> Self {
    Self { bundle_debug: true }
  }

  /// Derive options from a raw query string, e.g. `?page=2&bundle_debug`.
  ///
  /// The override is active when `param` appears as a key, with or without a value.
  pub fn from_query(query: &str, param: &str) -> Self {
    let bundle_debug = query
      .trim_start_matches('?')
      .split('&')
      .filter_map(|pair| pair.split('=').next())
      .any(|key| !key.is_empty() && key == param);
    Self { bundle_debug }
  }
}

/// Content-addressed bundling service.
///
/// Construct one per process and share it, typically behind an [`Arc`]. It owns the alias
/// registry, the resolution cache and the tag builder, and every method may be called from
/// many threads at once.
pub struct Bundler {
  config: BundlerConfig,
  host: Arc<dyn HostEnvironment>,
  registry: BundleRegistry,
  cache: ResolutionCache,
  builder: TagBuilder,
}

impl Bundler {
  /// Create the bundler, preparing output folders and registering configured bundles.
  pub fn new(
    config: BundlerConfig,
    host: Arc<dyn HostEnvironment>,
    transformer: Arc<dyn Transformer>,
  ) -> Result<Self, BundleError> {
    let prefix = config.tag_prefix();
    if !is_valid_tag_prefix(prefix) {
      return Err(BundleError::Config(format!(
        "tag prefix `{prefix}` may only contain ASCII letters, digits, `.`, `_` and `-`"
      )));
    }

    let output_dir = host.map_path(&config.output_folder);
    ensure_dir(&output_dir)?;

    let shared_output_dir = match &config.shared_output_folder {
      Some(folder) => {
        let shared = host.map_path(folder);
        ensure_dir(&shared)?;
        if is_same_file(&output_dir, &shared).unwrap_or(false) {
          tracing::debug!(
            folder = folder.as_str(),
            "shared output folder is the primary folder, skipping copies"
          );
          None
        } else {
          Some(shared)
        }
      }
      None => None,
    };

    let builder = TagBuilder::new(transformer, output_dir)
      .with_shared_output_dir(shared_output_dir)
      .with_prefix(prefix)
      .with_policy(config.error_policy());

    let bundler = Self {
      host,
      registry: BundleRegistry::new(),
      cache: ResolutionCache::new(),
      builder,
      config,
    };

    for (name, paths) in &bundler.config.bundles {
      bundler.registry.register(name, paths)?;
    }

    Ok(bundler)
  }

  /// Active configuration.
  pub fn config(&self) -> &BundlerConfig {
    &self.config
  }

  /// Alias registry.
  pub fn registry(&self) -> &BundleRegistry {
    &self.registry
  }

  /// Resolution cache.
  pub fn cache(&self) -> &ResolutionCache {
    &self.cache
  }

  /// Register a bundle alias. See [`BundleRegistry::register`].
  pub fn register_bundle<S: AsRef<str>>(&self, name: &str, paths: &[S]) -> Result<(), RegistryError> {
    self.registry.register(name, paths)
  }

  /// Resolve aliases and lowercase paths.
  pub fn normalize<S: AsRef<str>>(&self, paths: &[S]) -> Vec<String> {
    normalize_paths(paths, &self.registry)
  }

  /// Cache key for a path list or alias, computed over its normalised form.
  pub fn key_for_paths<S: AsRef<str>>(&self, paths: &[S]) -> String {
    key_for_paths(&self.normalize(paths))
  }

  /// Tag of the bundle for `paths`, building and persisting it on a cache miss.
  ///
  /// Concurrent misses for the same paths may build the bundle more than once. That is
  /// harmless: identical inputs yield identical tags and the file is only written once.
  ///
  /// The cache is keyed by the normalised paths alone, so `kind` only matters on a miss.
  /// Whichever kind first requests a path list decides the bundle file that gets written.
  /// A later request for the same paths with another kind returns the cached tag, and the
  /// file with that kind's extension may not exist.
  pub fn get_tag<S: AsRef<str>>(&self, paths: &[S], kind: AssetKind) -> Result<Tag, BundleError> {
    let normalized = self.normalize(paths);
    let key = key_for_paths(&normalized);

    if let Some(tag) = self.cache.get(&key) {
      tracing::debug!(%tag, "bundle cache hit");
      return Ok(tag);
    }

    let absolute_paths: Vec<PathBuf> = normalized
      .iter()
      .map(|path| self.host.map_path(path))
      .collect();
    let dependencies = absolute_paths.iter().map(FileStamp::capture).collect();

    let tag = self.builder.build_tag(&absolute_paths, kind)?;
    tracing::debug!(%tag, files = absolute_paths.len(), "bundle cache miss, built tag");

    self.cache.insert(key, tag.clone(), dependencies);
    Ok(tag)
  }

  /// Public URL of the bundle file for `tag`.
  pub fn bundle_url(&self, tag: &Tag, kind: AssetKind) -> String {
    join_url(&self.config.output_folder, &tag.file_name(kind))
  }

  /// Absolute path of the primary bundle file for `tag`.
  pub fn bundle_path(&self, tag: &Tag, kind: AssetKind) -> PathBuf {
    self.builder.bundle_path(tag, kind)
  }

  /// Forget the cached tag for `paths`, returning it if one was cached.
  pub fn invalidate<S: AsRef<str>>(&self, paths: &[S]) -> Option<Tag> {
    self.cache.invalidate(&self.key_for_paths(paths))
  }

  /// Render options for a request whose raw query string is `query`.
  ///
  /// The override key is the configured `debug_query_param`.
  pub fn render_options(&self, query: &str) -> RenderOptions {
    RenderOptions::from_query(query, &self.config.debug_query_param)
  }

  /// Markup referencing the stylesheet bundle for `paths`.
  ///
  /// The `.css` URL is derived from the tag cached for `paths`. See [`Bundler::get_tag`] for
  /// what happens when the same paths were first requested as scripts.
  pub fn render_styles<S: AsRef<str>>(
    &self,
    paths: &[S],
    options: RenderOptions,
  ) -> Result<String, BundleError> {
    self.render(paths, AssetKind::Style, options)
  }

  /// Markup referencing the script bundle for `paths`.
  ///
  /// Shares the path-keyed cache with [`Bundler::render_styles`], see [`Bundler::get_tag`].
  pub fn render_scripts<S: AsRef<str>>(
    &self,
    paths: &[S],
    options: RenderOptions,
  ) -> Result<String, BundleError> {
    self.render(paths, AssetKind::Script, options)
  }

  fn render<S: AsRef<str>>(
    &self,
    paths: &[S],
    kind: AssetKind,
    options: RenderOptions,
  ) -> Result<String, BundleError> {
    if self.config.debug || options.bundle_debug {
      return Ok(render_references(kind, &self.normalize(paths)));
    }

    let tag = self.get_tag(paths, kind)?;
    Ok(render_references(kind, &[self.bundle_url(&tag, kind)]))
  }
}

impl std::fmt::Debug for Bundler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Bundler")
      .field("config", &self.config)
      .field("registry", &self.registry)
      .field("cache", &self.cache)
      .field("builder", &self.builder)
      .finish_non_exhaustive()
  }
}

fn ensure_dir(path: &std::path::Path) -> Result<(), BundleError> {
  fs::create_dir_all(path).map_err(|source| BundleError::OutputFolder {
    path: path.to_path_buf(),
    source,
  })
}
