//! AutoAI prediction service CLI

use anyhow::{Context, Result};
use autoai_service::{init_logging, start_server, ServiceConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "autoai-serve")]
#[command(author = "AutoAI Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve predictions from a trained AutoAI artifact", long_about = None)]
struct Cli {
    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    port: Option<u16>,

    /// Artifact written by autoai-train
    #[arg(short, long)]
    artifact: Option<PathBuf>,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServiceConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(artifact) = cli.artifact {
        config.artifact_path = artifact;
    }

    init_logging(&config.logging, false).context("Failed to set tracing subscriber")?;
    info!("AutoAI service v{}", env!("CARGO_PKG_VERSION"));

    start_server(&config).await
}
