#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod asset_paths;
pub mod builder;
pub mod bundle;
pub mod bundler;
pub mod cache;
pub mod config;
pub mod error;
pub mod host;
pub mod models;
pub mod registry;
pub mod transform;

pub use builder::TagBuilder;
pub use bundler::{Bundler, RenderOptions};
pub use config::BundlerConfig;
pub use error::{BundleError, RegistryError};
pub use host::{HostEnvironment, RootedHost};
pub use models::{AssetKind, BuiltBundle, ErrorPolicy, Tag, WriteOutcome};
pub use transform::{Passthrough, Transformer, TransformerSet};
