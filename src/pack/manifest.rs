//! `package.json` lookup and the startup package index.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::PackError;

pub const MANIFEST_FILE: &str = "package.json";

/// The fields of `package.json` packserve cares about.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub package_manager: Option<String>,
}

impl PackageManifest {
    pub fn load(path: &Path) -> Result<Self, PackError> {
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents).map_err(|e| PackError::InvalidManifest {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// `name@version`, or whatever part is known.
    pub fn display_id(&self) -> String {
        match (&self.name, &self.version) {
            (Some(name), Some(version)) => format!("{name}@{version}"),
            (Some(name), None) => name.clone(),
            _ => "<unnamed>".to_string(),
        }
    }
}

/// Search `start` and its ancestors for a manifest file.
pub fn find_manifest(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_FILE))
        .find(|candidate| candidate.is_file())
}

/// Package name → source directory, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    packages: BTreeMap<String, PathBuf>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from package directories.
    ///
    /// Directories without a manifest, or whose manifest has no name, are
    /// unusable: they are logged and skipped. The first directory claiming a
    /// name keeps it.
    pub fn from_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut index = Self::new();
        for dir in dirs {
            let dir = dir.as_ref();
            match Self::package_name(dir) {
                Ok(name) => {
                    if let Some(existing) = index.get(&name) {
                        tracing::warn!(
                            name = %name,
                            kept = %existing.display(),
                            ignored = %dir.display(),
                            "Duplicate package name"
                        );
                        continue;
                    }
                    tracing::info!(name = %name, dir = %dir.display(), "Serving package");
                    index.insert(name, dir.to_path_buf());
                }
                Err(err) => {
                    tracing::error!(dir = %dir.display(), error = %err, "Skipping package directory");
                }
            }
        }
        index
    }

    fn package_name(dir: &Path) -> Result<String, PackError> {
        let path =
            find_manifest(dir).ok_or_else(|| PackError::ManifestNotFound(dir.to_path_buf()))?;
        let manifest = PackageManifest::load(&path)?;
        manifest
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| PackError::InvalidManifest {
                path,
                message: "missing \"name\"".to_string(),
            })
    }

    pub fn insert(&mut self, name: impl Into<String>, dir: PathBuf) {
        self.packages.insert(name.into(), dir);
    }

    pub fn get(&self, name: &str) -> Option<&PathBuf> {
        self.packages.get(name)
    }

    /// All package names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.packages.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}
