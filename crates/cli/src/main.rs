//! mcpdesk CLI entry point.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Parse configuration** — load `mcpdesk.toml` (or `--config`) and
//!    validate it.
//! 2. **Wire observability** — install `tracing-subscriber` with a pretty or
//!    JSON layer on stderr and, when configured, an OpenTelemetry OTLP
//!    exporter.
//! 3. **Construct infrastructure** — `JsonFileStore`, `DefaultTransportFactory`,
//!    `ReplyDispatcher`, `ConnectionManager`, and the `Bridge` over them.
//! 4. **Run one command** — every bridge response is printed as JSON on
//!    stdout; an error response makes the process exit non-zero.

mod commands;
mod config;
mod observability;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use bridge::Bridge;
use clap::Parser;
use connection::{ConnectionManager, ReplyDispatcher};
use registry::JsonFileStore;
use transport::DefaultTransportFactory;

use crate::commands::Command;
use crate::config::CliConfig;

#[derive(Debug, Parser)]
#[command(name = "mcpdesk", version, about = "Manage MCP endpoints and talk to the connected one")]
struct Cli {
    /// Configuration file (defaults to ./mcpdesk.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server registry document, overriding the configured path
    #[arg(long, global = true, env = "MCPDESK_REGISTRY")]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(path) = cli.registry {
        config.registry_path = path;
    }

    let _telemetry = observability::init(&config.logging)?;
    tracing::debug!(registry = %config.registry_path.display(), "Configuration loaded");

    let store = Arc::new(JsonFileStore::new(&config.registry_path));
    let factory = DefaultTransportFactory::new(config.transport.settings())
        .context("failed to initialise transports")?;
    let connections = Arc::new(ConnectionManager::new(
        store.clone(),
        Arc::new(factory),
        Arc::new(ReplyDispatcher::new()),
    ));
    let bridge = Bridge::new(store, connections);

    commands::execute(&bridge, cli.command, config.reply_buffer).await
}
