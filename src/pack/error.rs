use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors from running a single pack build.
#[derive(Debug, Error)]
pub enum PackError {
    #[error("no package.json found at or above {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("invalid manifest {}: {message}", .path.display())]
    InvalidManifest { path: PathBuf, message: String },

    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pack command failed ({})", exit_label(.code))]
    Exit { code: Option<i32> },

    #[error("pack command succeeded but no archive was returned")]
    NoArchive,

    #[error("pack build panicked: {0}")]
    Panicked(String),

    #[error("pack queue shut down before the build finished")]
    Interrupted,
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Failure handed to every caller of a pack request.
///
/// Cloneable so that all waiters on one build observe the same error.
#[derive(Debug, Clone, Error)]
pub enum PackFailure {
    #[error("unknown package: {0}")]
    UnknownPackage(String),

    #[error("invalid nonce {0:?}")]
    InvalidNonce(String),

    #[error(transparent)]
    Build(Arc<PackError>),
}

impl PackFailure {
    /// The underlying build error, if this failure came from a build.
    pub fn build_error(&self) -> Option<&PackError> {
        match self {
            PackFailure::Build(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<PackError> for PackFailure {
    fn from(err: PackError) -> Self {
        PackFailure::Build(Arc::new(err))
    }
}
