//! bundle_cache CLI - build and reference content-addressed asset bundles
//!
//! Usage: bundle_cache [OPTIONS] <COMMAND>
//!
//! Commands:
//!   tag     Build a bundle and print its tag
//!   render  Print the markup referencing a bundle
//!   key     Print the resolution cache key for a path list

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use bundle_cache::{AssetKind, Bundler, BundlerConfig, Passthrough, RenderOptions, RootedHost};

/// Content-addressed asset bundler
#[derive(Parser, Debug)]
#[command(name = "bundle_cache")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (JSON or YAML). Defaults to bundle_cache.json in the root, if present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory virtual paths are resolved against
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a bundle and print its tag
    Tag {
        /// Kind of bundle to produce
        #[arg(short, long, value_enum)]
        kind: BundleKind,

        /// Source paths, or a single `#alias` declared in the configuration
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the markup referencing a bundle
    Render {
        /// Kind of bundle to reference
        #[arg(short, long, value_enum)]
        kind: BundleKind,

        /// Reference each source individually instead of the bundle
        #[arg(long)]
        bundle_debug: bool,

        /// Request query string; the configured debug parameter in it also disables bundling
        #[arg(short, long, default_value = "")]
        query: String,

        /// Source paths, or a single `#alias` declared in the configuration
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Print the resolution cache key for a path list
    Key {
        /// Source paths, or a single `#alias` declared in the configuration
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum BundleKind {
    Script,
    Style,
}

impl From<BundleKind> for AssetKind {
    fn from(kind: BundleKind) -> Self {
        match kind {
            BundleKind::Script => AssetKind::Script,
            BundleKind::Style => AssetKind::Style,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => BundlerConfig::from_path(path)?,
        None => BundlerConfig::discover(&cli.root)?,
    };

    let bundler = Bundler::new(
        config,
        Arc::new(RootedHost::new(&cli.root)),
        Arc::new(Passthrough),
    )
    .context("failed to initialise bundler")?;

    match cli.command {
        Commands::Tag { kind, paths } => {
            let tag = bundler.get_tag(&paths, kind.into())?;
            println!("{tag}");
        }
        Commands::Render {
            kind,
            bundle_debug,
            query,
            paths,
        } => {
            let options = if bundle_debug {
                RenderOptions::unbundled()
            } else {
                bundler.render_options(&query)
            };
            let markup = match kind {
                BundleKind::Script => bundler.render_scripts(&paths, options)?,
                BundleKind::Style => bundler.render_styles(&paths, options)?,
            };
            println!("{markup}");
        }
        Commands::Key { paths } => {
            println!("{}", bundler.key_for_paths(&paths));
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
