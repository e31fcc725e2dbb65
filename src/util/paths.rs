//! Path utilities for packserve directories

use std::path::PathBuf;

/// Get the default archive root (<cache_dir>/packserve/archives).
/// Falls back to the system temp directory when no cache dir is known.
pub fn default_archive_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("packserve").join("archives"))
        .unwrap_or_else(|| std::env::temp_dir().join("packserve").join("archives"))
}

/// Get the config file path (<config_dir>/packserve/config.toml)
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("packserve"))
        .unwrap_or_else(|| PathBuf::from(".packserve"))
        .join("config.toml")
}
