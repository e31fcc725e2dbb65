//! Package manager detection and binary resolution
//!
//! This module decides which pack tool (npm or pnpm) handles a package
//! directory and where its executable lives.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pack::manifest::PackageManifest;

/// Pack tools packserve knows how to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Pnpm,
}

impl PackageManager {
    /// Get the binary name for this tool
    pub fn binary_name(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
        }
    }

    /// Lockfiles and workspace markers that identify this tool
    pub fn markers(&self) -> &'static [&'static str] {
        match self {
            PackageManager::Npm => &["package-lock.json", "npm-shrinkwrap.json"],
            PackageManager::Pnpm => &["pnpm-lock.yaml", "pnpm-workspace.yaml"],
        }
    }

    /// Parse from string (`npm`, `pnpm`, or a `packageManager` value like `pnpm@9.1.0`)
    pub fn parse(s: &str) -> Option<Self> {
        let name = s.split('@').next().unwrap_or_default();
        match name.trim().to_lowercase().as_str() {
            "npm" => Some(PackageManager::Npm),
            "pnpm" => Some(PackageManager::Pnpm),
            _ => None,
        }
    }

    pub fn all() -> &'static [PackageManager] {
        &[PackageManager::Npm, PackageManager::Pnpm]
    }

    /// Detect the package manager for a package directory.
    ///
    /// The manifest's `packageManager` field wins; otherwise the nearest
    /// lockfile or workspace marker walking upward decides. Falls back to
    /// `default` when nothing is conclusive.
    pub fn detect(dir: &Path, manifest: Option<&PackageManifest>, default: Self) -> Self {
        if let Some(pm) = manifest
            .and_then(|m| m.package_manager.as_deref())
            .and_then(Self::parse)
        {
            return pm;
        }

        for ancestor in dir.ancestors() {
            for &pm in Self::all() {
                if pm.markers().iter().any(|m| ancestor.join(m).is_file()) {
                    tracing::debug!(
                        dir = %dir.display(),
                        marker_dir = %ancestor.display(),
                        tool = %pm,
                        "Detected package manager"
                    );
                    return pm;
                }
            }
        }

        default
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary_name())
    }
}

/// Configuration for tool paths from config.toml
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ToolPaths {
    pub npm: Option<PathBuf>,
    pub pnpm: Option<PathBuf>,
}

impl ToolPaths {
    /// Get the configured path for a tool
    pub fn get(&self, tool: PackageManager) -> Option<&PathBuf> {
        match tool {
            PackageManager::Npm => self.npm.as_ref(),
            PackageManager::Pnpm => self.pnpm.as_ref(),
        }
    }

    /// Set the path for a tool
    pub fn set(&mut self, tool: PackageManager, path: PathBuf) {
        match tool {
            PackageManager::Npm => self.npm = Some(path),
            PackageManager::Pnpm => self.pnpm = Some(path),
        }
    }

    /// Resolve the executable for a tool.
    ///
    /// 1. A configured path is used if it is a valid executable
    /// 2. Otherwise `which` searches PATH
    /// 3. Otherwise the bare binary name is returned and spawning reports the error
    pub fn resolve(&self, tool: PackageManager) -> PathBuf {
        if let Some(path) = self.get(tool) {
            if is_valid_executable(path) {
                return path.clone();
            }
            tracing::warn!(
                tool = %tool,
                path = %path.display(),
                "Configured tool path is not executable, searching PATH"
            );
        }

        which::which(tool.binary_name()).unwrap_or_else(|_| PathBuf::from(tool.binary_name()))
    }
}

/// Check if a path points to a valid executable
pub fn is_valid_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    // On Unix, check if the file is executable
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = path.metadata() {
            return metadata.permissions().mode() & 0o111 != 0;
        }
        false
    }

    // On Windows, existence is all we can check
    #[cfg(not(unix))]
    {
        true
    }
}
