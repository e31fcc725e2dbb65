use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::util::paths::{config_path, default_archive_dir};
use crate::util::tools::{PackageManager, ToolPaths};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4873;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Host address the HTTP server binds to
    pub host: String,
    /// Port the HTTP server listens on
    pub port: u16,
    /// Root directory for produced archives (one subdirectory per nonce)
    pub archive_dir: PathBuf,
    /// Package source directories to serve
    pub packages: Vec<PathBuf>,
    /// Color package labels in build output
    pub color: bool,
    /// Pack tool used when detection is inconclusive
    pub package_manager: PackageManager,
    /// Configured paths for external tools (npm, pnpm)
    pub tool_paths: ToolPaths,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            archive_dir: default_archive_dir(),
            packages: Vec::new(),
            color: true,
            package_manager: PackageManager::default(),
            tool_paths: ToolPaths::default(),
        }
    }
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub archive_dir: Option<PathBuf>,
    /// Package directories, relative to the config file
    pub packages: Option<Vec<PathBuf>>,
    pub color: Option<bool>,
    pub package_manager: Option<PackageManager>,
    /// Tool path configuration
    pub tools: Option<ToolPaths>,
}

impl Config {
    /// Load configuration, merging the config file over defaults.
    ///
    /// An explicitly given file must exist. Without one, the default
    /// location (`<config_dir>/packserve/config.toml`) is used if present.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = Config::default();

        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = config_path();
                if !path.exists() {
                    return Ok(config);
                }
                path
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let toml_config: TomlConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Loaded config file");
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.merge(toml_config, base);
        Ok(config)
    }

    /// Apply a parsed config file. Relative paths resolve against `base`.
    pub fn merge(&mut self, toml_config: TomlConfig, base: &Path) {
        if let Some(host) = toml_config.host {
            self.host = host;
        }
        if let Some(port) = toml_config.port {
            self.port = port;
        }
        if let Some(dir) = toml_config.archive_dir {
            self.archive_dir = base.join(dir);
        }
        if let Some(packages) = toml_config.packages {
            self.packages = packages.into_iter().map(|p| base.join(p)).collect();
        }
        if let Some(color) = toml_config.color {
            self.color = color;
        }
        if let Some(pm) = toml_config.package_manager {
            self.package_manager = pm;
        }

        // Load tool paths if configured
        if let Some(tools) = toml_config.tools {
            if let Some(npm) = tools.npm {
                self.tool_paths.set(PackageManager::Npm, base.join(npm));
            }
            if let Some(pnpm) = tools.pnpm {
                self.tool_paths.set(PackageManager::Pnpm, base.join(pnpm));
            }
        }
    }

    pub fn with_packages(mut self, packages: Vec<PathBuf>) -> Self {
        self.packages = packages;
        self
    }

    pub fn with_archive_dir(mut self, dir: PathBuf) -> Self {
        self.archive_dir = dir;
        self
    }

    /// `host:port` for binding and building URLs.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
