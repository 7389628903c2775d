use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ecowatch_proxy::{ProxyConfig, ProxyServer, ThingsBoardSettings};

#[derive(Parser, Debug)]
#[command(name = "ecowatch-proxy")]
#[command(about = "Proxy exposing ThingsBoard asset telemetry to the ecowatch dashboard")]
struct Args {
    /// Optional TOML file with ThingsBoard settings (THINGSBOARD_* env vars override it)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    info!("Starting server...");
    let settings = ThingsBoardSettings::load(args.config.as_deref())?;
    let adapter = settings.adapter()?;

    let server = ProxyServer::new(ProxyConfig::with_port(args.port), Arc::new(adapter));

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
