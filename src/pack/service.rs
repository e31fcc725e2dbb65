use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::pack::cache::{PackCache, PackKey, PackOutcome};
use crate::pack::error::PackFailure;
use crate::pack::manifest::PackageIndex;
use crate::pack::runner::PackRunner;

const MAX_NONCE_LEN: usize = 128;

/// Entry point used by the HTTP layer: package lookup plus cached,
/// serialized pack builds.
pub struct PackService {
    index: PackageIndex,
    cache: PackCache,
    runner: Arc<dyn PackRunner>,
    archive_root: PathBuf,
}

impl PackService {
    /// Must be called inside a tokio runtime (spawns the pack queue worker).
    pub fn new(index: PackageIndex, runner: Arc<dyn PackRunner>, archive_root: PathBuf) -> Self {
        Self {
            index,
            cache: PackCache::new(),
            runner,
            archive_root,
        }
    }

    pub fn archive_root(&self) -> &Path {
        &self.archive_root
    }

    pub fn index(&self) -> &PackageIndex {
        &self.index
    }

    /// All served package names, sorted.
    pub fn list(&self) -> Vec<String> {
        self.index.names()
    }

    /// Pack `source_dir` into `destination_dir` once per nonce.
    pub async fn request(
        &self,
        source_dir: &Path,
        destination_dir: &Path,
        nonce: &str,
    ) -> PackOutcome {
        let key = PackKey::new(nonce, source_dir, destination_dir);
        let runner = Arc::clone(&self.runner);
        let source = source_dir.to_path_buf();
        let destination = destination_dir.to_path_buf();

        self.cache
            .request(key, move || async move { runner.pack(&source, &destination).await })
            .await
    }

    /// Pack a package by name into `<archive_root>/<nonce>`.
    pub async fn request_package(&self, name: &str, nonce: &str) -> PackOutcome {
        validate_nonce(nonce)?;
        let source = self
            .index
            .get(name)
            .cloned()
            .ok_or_else(|| PackFailure::UnknownPackage(name.to_string()))?;
        let destination = self.archive_root.join(nonce);

        self.request(&source, &destination, nonce).await
    }
}

/// Nonces become directory names: ASCII letters, digits, `-`, `_` and `.`
/// only, and never `.` or `..`.
pub fn validate_nonce(nonce: &str) -> Result<(), PackFailure> {
    let valid = !nonce.is_empty()
        && nonce.len() <= MAX_NONCE_LEN
        && nonce != "."
        && nonce != ".."
        && nonce
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(PackFailure::InvalidNonce(nonce.to_string()))
    }
}
