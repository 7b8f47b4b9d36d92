use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use mate::config::Config;
use mate::init::{init_provider, setup_logging};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Load Config
    let config_path = std::env::args().nth(1).unwrap_or("config.toml".to_string());
    let config_exists = std::path::Path::new(&config_path).exists();
    let config = if config_exists {
        Config::load(&config_path).await?
    } else {
        Config::default()
    };

    // 2. Setup Logging
    setup_logging(&config);
    info!("Starting mate...");

    if !config_exists {
        info!("Config file not found, using defaults.");
    }

    // 3. Build Provider & Spawn Refresh Loop
    let provider = init_provider(&config)?;
    let cancel = CancellationToken::new();

    // Channel for forcing refresh
    let (refresh_tx, refresh_rx) = tokio::sync::mpsc::channel::<()>(1);
    let refresher = provider.spawn(cancel.clone(), refresh_rx);

    // 4. Start API Server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid host/port in config")?;
    let mut server = tokio::spawn(mate::api::start_api_server(
        provider.clone(),
        refresh_tx,
        addr,
        cancel.clone(),
    ));

    // 5. Graceful Shutdown
    tokio::select! {
        res = &mut server => {
            cancel.cancel();
            let _ = refresher.await;
            return res.context("API server task panicked")?;
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received.");
        }
    }

    cancel.cancel();
    let _ = refresher.await;
    server.await.context("API server task panicked")??;

    Ok(())
}
