//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::bump::{default_nonce, BumpOptions};
use crate::config::{Config, DEFAULT_HOST, DEFAULT_PORT};
use crate::util::tools::PackageManager;

#[derive(Parser, Debug)]
#[command(name = "packserve")]
#[command(about = "Serve freshly packed npm/pnpm archives over HTTP")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the given package directories
    Serve(ServeArgs),
    /// Point a package.json at archives from a running server
    Bump(BumpArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Package directories to serve (added to those in the config file)
    pub dirs: Vec<PathBuf>,

    /// Host address to bind to
    #[arg(short = 'H', long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory receiving packed archives
    #[arg(long)]
    pub archive_dir: Option<PathBuf>,

    /// Pack tool used when a package gives no hint (npm or pnpm)
    #[arg(long, value_parser = parse_package_manager)]
    pub package_manager: Option<PackageManager>,

    /// Disable colored package labels
    #[arg(long)]
    pub no_color: bool,

    /// Config file (defaults to <config dir>/packserve/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BumpArgs {
    /// Manifest to rewrite
    #[arg(short, long, default_value = "package.json")]
    pub manifest: PathBuf,

    /// Base URL of the packserve server
    #[arg(short, long, default_value_t = default_url())]
    pub url: String,

    /// Nonce for the archive URLs (defaults to the current time in ms)
    #[arg(short, long)]
    pub nonce: Option<String>,

    /// Print the rewrites without touching the manifest
    #[arg(long)]
    pub dry_run: bool,

    /// Only bump these packages
    pub packages: Vec<String>,
}

fn default_url() -> String {
    format!("http://{DEFAULT_HOST}:{DEFAULT_PORT}")
}

fn parse_package_manager(value: &str) -> Result<PackageManager, String> {
    PackageManager::parse(value).ok_or_else(|| format!("unsupported package manager: {value}"))
}

impl ServeArgs {
    /// Load the config file and apply command-line overrides on top.
    pub fn resolve_config(&self) -> anyhow::Result<Config> {
        let config = Config::load(self.config.as_deref())?;
        Ok(self.apply(config))
    }

    fn apply(&self, mut config: Config) -> Config {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(dir) = &self.archive_dir {
            config.archive_dir = dir.clone();
        }
        if let Some(pm) = self.package_manager {
            config.package_manager = pm;
        }
        if self.no_color {
            config.color = false;
        }
        config.packages.extend(self.dirs.iter().cloned());
        config
    }
}

impl BumpArgs {
    pub fn into_options(self) -> BumpOptions {
        BumpOptions {
            manifest: self.manifest,
            url: self.url,
            nonce: self.nonce.unwrap_or_else(default_nonce),
            dry_run: self.dry_run,
            only: self.packages,
        }
    }
}
