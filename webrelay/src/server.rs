//! Server lifecycle management
//!
//! Binds the HTTP listener, serves the relay API and shuts down gracefully
//! on Ctrl+C or SIGTERM.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use webrelay_api::AppState;
use webrelay_core::{Config, FanOut};

/// webrelay server
pub struct RelayServer {
    config: Config,
    fanout: Arc<FanOut>,
}

impl RelayServer {
    /// Create a new server instance
    pub const fn new(config: Config, fanout: Arc<FanOut>) -> Self {
        Self { config, fanout }
    }

    /// Bind, serve, and wait for a shutdown signal
    pub async fn start(self) -> anyhow::Result<()> {
        let http_address = self.config.http_address();

        let listener = TcpListener::bind(&http_address).await.map_err(|e| {
            error!("Failed to bind HTTP address {}: {}", http_address, e);
            anyhow::anyhow!("Failed to bind HTTP address {http_address}: {e}")
        })?;

        info!("HTTP server listening on {}", listener.local_addr()?);

        let router = webrelay_api::create_router(
            AppState::new(self.fanout.clone()),
            self.config.server.max_body_bytes,
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("HTTP server error: {}", e);
                anyhow::anyhow!("HTTP server error: {e}")
            })?;

        info!(
            subscribers = self.fanout.registry().len(),
            "HTTP server shut down gracefully"
        );

        Ok(())
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C signal");
            }
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received SIGTERM signal");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
