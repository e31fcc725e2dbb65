use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// One archive as reported by `<tool> pack --json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ArchiveDescriptor {
    pub filename: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub files: Vec<PackedFile>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct PackedFile {
    pub path: String,
    #[serde(default)]
    pub size: Option<u64>,
}

/// Top-level JSON written by the pack tool.
///
/// npm prints an array of descriptors; pnpm prints a single object. An empty
/// array is not pack output.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PackOutput {
    Many(#[serde(deserialize_with = "non_empty")] Vec<ArchiveDescriptor>),
    One(ArchiveDescriptor),
}

impl PackOutput {
    pub fn into_descriptors(self) -> Vec<ArchiveDescriptor> {
        match self {
            PackOutput::Many(list) => list,
            PackOutput::One(single) => vec![single],
        }
    }

    /// The descriptor packserve serves. Extra entries are ignored.
    pub fn into_first(self) -> Option<ArchiveDescriptor> {
        self.into_descriptors().into_iter().next()
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<Vec<ArchiveDescriptor>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = Vec::<ArchiveDescriptor>::deserialize(deserializer)?;
    if list.is_empty() {
        return Err(D::Error::custom("empty archive list"));
    }
    Ok(list)
}

impl ArchiveDescriptor {
    /// Where the archive landed. pnpm reports an absolute filename, npm a
    /// bare one relative to the pack destination.
    pub fn archive_path(&self, destination: &Path) -> std::io::Result<PathBuf> {
        std::path::absolute(destination.join(&self.filename))
    }
}
