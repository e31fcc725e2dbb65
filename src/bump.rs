//! Point a consumer's manifest at freshly packed archives.
//!
//! Fetches the served package list, then rewrites matching dependency
//! entries to `<url>/<nonce>/<name>.tgz`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;

use crate::pack::validate_nonce;

/// Manifest sections whose string entries may be rewritten.
pub const DEPENDENCY_SECTIONS: &[&str] = &[
    "dependencies",
    "devDependencies",
    "optionalDependencies",
    "peerDependencies",
    "resolutions",
    "overrides",
];

#[derive(Debug, Clone)]
pub struct BumpOptions {
    pub manifest: PathBuf,
    pub url: String,
    pub nonce: String,
    pub dry_run: bool,
    /// Restrict rewriting to these packages. Empty means every served one.
    pub only: Vec<String>,
}

/// One rewritten dependency entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub section: String,
    pub name: String,
    pub from: String,
    pub to: String,
}

#[derive(Deserialize)]
struct PackagesResponse {
    packages: Vec<String>,
}

/// Current Unix time in milliseconds.
pub fn default_nonce() -> String {
    chrono::Utc::now().timestamp_millis().to_string()
}

pub fn archive_url(base: &str, nonce: &str, name: &str) -> String {
    format!("{}/{nonce}/{name}.tgz", base.trim_end_matches('/'))
}

/// Rewrite dependency entries in place and report what changed.
///
/// Entries already pointing at the target URL are left alone and not reported.
pub fn rewrite_manifest(
    manifest: &mut Value,
    served: &[String],
    only: &[String],
    base: &str,
    nonce: &str,
) -> Vec<Rewrite> {
    let wanted = |name: &str| {
        served.iter().any(|s| s == name) && (only.is_empty() || only.iter().any(|o| o == name))
    };

    let mut rewrites = Vec::new();
    for &section in DEPENDENCY_SECTIONS {
        let Some(entries) = manifest.get_mut(section).and_then(Value::as_object_mut) else {
            continue;
        };

        for (name, range) in entries.iter_mut() {
            let Some(current) = range.as_str() else {
                continue;
            };
            if !wanted(name) {
                continue;
            }

            let target = archive_url(base, nonce, name);
            if current == target {
                continue;
            }
            rewrites.push(Rewrite {
                section: section.to_string(),
                name: name.clone(),
                from: current.to_string(),
                to: target.clone(),
            });
            *range = Value::String(target);
        }
    }

    rewrites
}

/// Two-space indented JSON with a trailing newline.
pub fn render_manifest(manifest: &Value) -> anyhow::Result<String> {
    let mut out = serde_json::to_string_pretty(manifest)?;
    out.push('\n');
    Ok(out)
}

/// Fetch the names served at `base`.
pub async fn fetch_packages(client: &reqwest::Client, base: &str) -> anyhow::Result<Vec<String>> {
    let url = format!("{}/api/packages", base.trim_end_matches('/'));
    let response = client
        .get(&url)
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?
        .error_for_status()
        .with_context(|| format!("Package listing failed at {url}"))?;

    let body: PackagesResponse = response
        .json()
        .await
        .with_context(|| format!("Unexpected package listing from {url}"))?;
    Ok(body.packages)
}

fn load_manifest(path: &Path) -> anyhow::Result<Value> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Run the whole bump workflow. Returns the applied (or, for a dry run,
/// proposed) rewrites.
pub async fn run_bump(options: &BumpOptions) -> anyhow::Result<Vec<Rewrite>> {
    validate_nonce(&options.nonce)?;
    let mut manifest = load_manifest(&options.manifest)?;

    let client = reqwest::Client::new();
    let served = fetch_packages(&client, &options.url).await?;
    for name in options.only.iter().filter(|n| !served.contains(n)) {
        tracing::warn!(package = %name, url = %options.url, "Package is not served, skipping");
    }

    let rewrites = rewrite_manifest(
        &mut manifest,
        &served,
        &options.only,
        &options.url,
        &options.nonce,
    );

    if rewrites.is_empty() {
        tracing::info!(manifest = %options.manifest.display(), "Nothing to bump");
        return Ok(rewrites);
    }

    if options.dry_run {
        tracing::info!(count = rewrites.len(), "Dry run, manifest left untouched");
    } else {
        fs::write(&options.manifest, render_manifest(&manifest)?)
            .with_context(|| format!("Failed to write {}", options.manifest.display()))?;
        tracing::info!(
            manifest = %options.manifest.display(),
            count = rewrites.len(),
            nonce = %options.nonce,
            "Bumped dependencies"
        );
    }

    Ok(rewrites)
}
