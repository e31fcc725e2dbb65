use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use crate::pack::descriptor::PackOutput;
use crate::pack::error::PackError;
use crate::pack::manifest::{find_manifest, PackageManifest};
use crate::stream::{extract_lines, forward_lines, ColorRegistry, LinePrefixer, OutputSink};
use crate::util::tools::{PackageManager, ToolPaths};

/// Something that can turn a package directory into an archive.
#[async_trait]
pub trait PackRunner: Send + Sync {
    /// Pack `source_dir` into `destination_dir`, returning the absolute
    /// path of the produced archive.
    async fn pack(&self, source_dir: &Path, destination_dir: &Path) -> Result<PathBuf, PackError>;
}

/// Runs `<npm|pnpm> pack --json --pack-destination <dir>` and streams its
/// output to the console.
pub struct CommandPackRunner {
    tools: ToolPaths,
    default_manager: PackageManager,
    colors: Arc<ColorRegistry>,
    sink: Arc<dyn OutputSink>,
}

impl CommandPackRunner {
    pub fn new(
        tools: ToolPaths,
        default_manager: PackageManager,
        colors: Arc<ColorRegistry>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            tools,
            default_manager,
            colors,
            sink,
        }
    }

    fn build_command(binary: &Path, source_dir: &Path, destination_dir: &Path) -> Command {
        let mut cmd = Command::new(binary);

        cmd.arg("pack")
            .arg("--json")
            .arg("--pack-destination")
            .arg(destination_dir);

        cmd.current_dir(source_dir);

        // Stdio setup for JSON capture
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd
    }
}

#[async_trait]
impl PackRunner for CommandPackRunner {
    async fn pack(&self, source_dir: &Path, destination_dir: &Path) -> Result<PathBuf, PackError> {
        let manifest_path = find_manifest(source_dir)
            .ok_or_else(|| PackError::ManifestNotFound(source_dir.to_path_buf()))?;
        let manifest = PackageManifest::load(&manifest_path)?;
        let package_root = manifest_path.parent().unwrap_or(source_dir);

        let name = manifest.name.clone().unwrap_or_else(|| {
            package_root
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "package".to_string())
        });
        let prefixer = LinePrefixer::new(self.colors.label(&name), Arc::clone(&self.sink));

        let tool = PackageManager::detect(package_root, Some(&manifest), self.default_manager);
        let binary = self.tools.resolve(tool);

        tokio::fs::create_dir_all(destination_dir).await?;

        tracing::info!(
            package = %manifest.display_id(),
            tool = %tool,
            destination = %destination_dir.display(),
            "Packing"
        );
        prefixer.emit(&format!(
            "{tool} pack --json --pack-destination {}",
            destination_dir.display()
        ));

        let mut child = Self::build_command(&binary, source_dir, destination_dir)
            .spawn()
            .map_err(|source| PackError::Spawn {
                tool: binary.display().to_string(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("pack stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::other("pack stderr was not captured"))?;

        let (captured, forwarded) = tokio::join!(
            extract_lines::<_, PackOutput>(stdout, &prefixer),
            forward_lines(stderr, &prefixer)
        );
        let status = child.wait().await?;
        let captured = captured?;
        forwarded?;

        if !status.success() {
            let err = PackError::Exit {
                code: status.code(),
            };
            prefixer.emit(&format!("✗ {err}"));
            tracing::warn!(package = %name, code = ?status.code(), "Pack command failed");
            return Err(err);
        }

        let Some(descriptor) = captured.and_then(PackOutput::into_first) else {
            prefixer.emit(&format!("✗ {}", PackError::NoArchive));
            return Err(PackError::NoArchive);
        };

        let path = descriptor.archive_path(destination_dir)?;
        prefixer.emit(&format!("✓ {}", path.display()));
        Ok(path)
    }
}
