//! Utility modules

pub mod paths;
pub mod tools;

pub use paths::{config_path, default_archive_dir};
pub use tools::{PackageManager, ToolPaths};
