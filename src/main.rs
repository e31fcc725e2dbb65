use std::io::IsTerminal;

use anyhow::Result;
use clap::Parser;
use packserve::cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "packserve=info,tower_http=warn";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for command output
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    match cli.command {
        Command::Serve(args) => {
            let config = args.resolve_config()?;
            packserve::app::serve(config).await
        }
        Command::Bump(args) => {
            let options = args.into_options();
            let rewrites = packserve::bump::run_bump(&options).await?;
            for rewrite in &rewrites {
                println!(
                    "{} {}: {} -> {}",
                    rewrite.section, rewrite.name, rewrite.from, rewrite.to
                );
            }
            Ok(())
        }
    }
}
