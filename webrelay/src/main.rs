mod server;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use webrelay_core::{logging, Config, FanOut, SubscriberRegistry};

use server::RelayServer;

#[derive(Parser, Debug)]
#[command(name = "webrelay")]
#[command(about = "HTTP publish/subscribe relay", long_about = None)]
struct Args {
    /// TCP port to listen on (overrides the config file)
    port: Option<u16>,

    /// Optional config file (yaml, toml or json)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Merge CLI arguments over the loaded configuration
fn load_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref()).map_err(|e| {
        anyhow::anyhow!("Failed to load configuration: {e}")
    })?;

    if let Some(port) = args.port {
        config.server.port = port;
    }

    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 1. Load configuration
    let config = load_config(&args)?;

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;
    info!("webrelay starting...");
    info!("HTTP address: {}", config.http_address());

    // 3. Registry and fan-out
    let registry = Arc::new(SubscriberRegistry::new());
    let fanout = Arc::new(FanOut::new(registry, &config.delivery)?);
    info!(
        timeout_seconds = config.delivery.timeout_seconds,
        max_concurrent = config.delivery.max_concurrent,
        "Fan-out initialized"
    );

    // 4. Serve until shutdown; bind failures surface as a non-zero exit
    RelayServer::new(config, fanout).start().await
}
