//! Package directory fixtures
//!
//! Creates temporary package directories plus a fake `npm` that behaves
//! like `npm pack --json --pack-destination <dir>`: it prints noise on both
//! streams, writes `<name>-<version>.tgz` and reports it as a JSON array.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use packserve::config::Config;
use packserve::stream::MemorySink;
use packserve::util::{PackageManager, ToolPaths};
use tempfile::TempDir;

const FAKE_NPM: &str = r#"#!/bin/sh
echo "$PWD" >> "__LOG__"
name=$(sed -n 's/.*"name": *"\([^"]*\)".*/\1/p' package.json)
version=$(sed -n 's/.*"version": *"\([^"]*\)".*/\1/p' package.json)
file="$(echo "$name" | sed 's/^@//; s/\//-/')-$version.tgz"
echo "npm notice package: $name@$version" >&2
if [ -f FAIL ]; then
  echo "npm ERR! prepack script failed" >&2
  exit 1
fi
printf 'tarball for %s@%s\n' "$name" "$version" > "$4/$file"
echo "> $name@$version prepack"
printf '[\n  {\n    "name": "%s",\n    "version": "%s",\n    "filename": "%s",\n    "files": []\n  }\n]\n' "$name" "$version" "$file"
"#;

/// A temporary directory holding packages, a fake pack tool and an
/// archive root. Cleaned up on drop.
pub struct PackageWorkspace {
    _dir: TempDir,
    /// Root of the temporary directory
    pub root: PathBuf,
    /// The fake `npm` executable
    pub tool: PathBuf,
    /// One line per tool invocation: the working directory it ran in
    pub log: PathBuf,
    /// In-memory console for prefixed build output
    pub sink: Arc<MemorySink>,
}

impl PackageWorkspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir.path().to_path_buf();
        let log = root.join("invocations.log");
        let tool = root.join("bin").join("npm");

        fs::create_dir_all(root.join("bin")).unwrap();
        fs::write(&tool, FAKE_NPM.replace("__LOG__", &log.to_string_lossy())).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        Self {
            _dir: dir,
            root,
            tool,
            log,
            sink: Arc::new(MemorySink::new()),
        }
    }

    /// Create `packages/<dir>` with a one-line manifest.
    pub fn add_package(&self, name: &str, version: &str) -> PathBuf {
        let dir_name = name.trim_start_matches('@').replace('/', "-");
        let dir = self.root.join("packages").join(dir_name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("package.json"),
            format!(r#"{{"name":"{name}","version":"{version}"}}"#),
        )
        .unwrap();
        dir
    }

    /// Make the next builds of `dir` fail (or succeed again).
    pub fn set_failing(&self, dir: &Path, failing: bool) {
        let marker = dir.join("FAIL");
        if failing {
            fs::write(marker, "").unwrap();
        } else {
            let _ = fs::remove_file(marker);
        }
    }

    pub fn archives(&self) -> PathBuf {
        self.root.join("archives")
    }

    pub fn tool_paths(&self) -> ToolPaths {
        let mut tools = ToolPaths::default();
        tools.set(PackageManager::Npm, self.tool.clone());
        tools
    }

    /// Config serving `packages` with the fake tool and no colors.
    pub fn config(&self, packages: Vec<PathBuf>) -> Config {
        let mut config = Config::default()
            .with_packages(packages)
            .with_archive_dir(self.archives());
        config.tool_paths = self.tool_paths();
        config.color = false;
        config
    }

    /// Number of times the fake tool has run.
    pub fn invocations(&self) -> usize {
        fs::read_to_string(&self.log)
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }
}
