//! Bundler configuration loader.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::models::ErrorPolicy;

/// File name searched for by [`BundlerConfig::discover`].
pub const DEFAULT_CONFIG_FILE: &str = "bundle_cache.json";

/// Query string parameter that forces unbundled rendering for a single request.
pub const DEFAULT_DEBUG_QUERY_PARAM: &str = "bundle_debug";

/// Settings controlling where bundles are written and how failures are treated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Application-relative folder bundles are written to and served from.
    pub output_folder: String,
    /// Optional second folder receiving a copy of every bundle, for multi-instance deployments.
    pub shared_output_folder: Option<String>,
    /// Optional tag prefix, typically a version string bumped to bust client caches.
    pub prefix: Option<String>,
    /// Render individual sources instead of bundles and surface build failures.
    pub debug: bool,
    /// Overrides the error policy implied by `debug` when set.
    pub strict: Option<bool>,
    /// Name of the query parameter that forces debug rendering per request.
    pub debug_query_param: String,
    /// Bundle aliases registered when the bundler is constructed.
    pub bundles: BTreeMap<String, Vec<String>>,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            output_folder: "/bundles".into(),
            shared_output_folder: None,
            prefix: None,
            debug: cfg!(debug_assertions),
            strict: None,
            debug_query_param: DEFAULT_DEBUG_QUERY_PARAM.into(),
            bundles: BTreeMap::new(),
        }
    }
}

impl BundlerConfig {
    /// Load configuration from the provided directory.
    ///
    /// When the configuration file does not exist the defaults are used. A file that exists
    /// but fails to parse is an error, since silently bundling with the wrong settings would
    /// be worse than refusing to start.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if !candidate.exists() {
            return Ok(Self::default());
        }
        Self::from_path(&candidate)
    }

    /// Read configuration from a JSON or YAML file, chosen by extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display())),
            "json" | "" => serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display())),
            other => bail!("unsupported configuration format `.{other}` for {}", path.display()),
        }
    }

    /// Error policy implied by this configuration.
    pub fn error_policy(&self) -> ErrorPolicy {
        if self.strict.unwrap_or(self.debug) {
            ErrorPolicy::Strict
        } else {
            ErrorPolicy::Lenient
        }
    }

    /// Tag prefix, empty when none is configured.
    pub fn tag_prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or_default()
    }
}
