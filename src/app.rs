//! Wiring for the `serve` command.

use std::io::IsTerminal;
use std::sync::Arc;

use anyhow::bail;

use crate::config::Config;
use crate::pack::{CommandPackRunner, PackService, PackageIndex};
use crate::stream::{ColorRegistry, OutputSink, StderrSink};
use crate::web::{run_server, ServerConfig, WebAppState};

/// Build the pack service described by `config`.
///
/// Fails when none of the configured directories holds a usable package.
pub fn build_service(config: &Config, sink: Arc<dyn OutputSink>) -> anyhow::Result<PackService> {
    let index = PackageIndex::from_dirs(&config.packages);
    if index.is_empty() {
        bail!("no usable package directories given (pass DIRS or set `packages` in the config file)");
    }

    let colors = Arc::new(ColorRegistry::new(config.color));
    let runner = CommandPackRunner::new(
        config.tool_paths.clone(),
        config.package_manager,
        colors,
        sink,
    );

    Ok(PackService::new(
        index,
        Arc::new(runner),
        config.archive_dir.clone(),
    ))
}

/// Serve until interrupted.
pub async fn serve(mut config: Config) -> anyhow::Result<()> {
    config.color &= std::io::stderr().is_terminal();

    let service = build_service(&config, Arc::new(StderrSink))?;
    tracing::info!(
        packages = service.index().len(),
        archives = %config.archive_dir.display(),
        "Archives available at http://{}/<nonce>/<package>.tgz",
        config.address()
    );

    let server_config = ServerConfig {
        host: config.host.clone(),
        port: config.port,
        ..ServerConfig::default()
    };
    run_server(WebAppState::new(service), server_config).await
}
