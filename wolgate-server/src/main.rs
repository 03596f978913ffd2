//! wolgate-server daemon entry point.
//!
//! Loads the gateway config (fatal if missing or malformed), initializes the
//! credentials store, and serves the router on the configured port.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use wolgate_core::config::GatewayConfig;
use wolgate_core::creds::AdminCredentials;
use wolgate_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wolgate_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; the gateway cannot run without a valid roster.
    let config_path = GatewayConfig::config_path()?;
    let config = GatewayConfig::load_from(&config_path)
        .with_context(|| format!("cannot start without a valid config at {}", config_path.display()))?;

    // Credentials: created disabled-by-default on first run.
    let creds_path = AdminCredentials::credentials_path()?;
    let creds = AdminCredentials::load_or_init(&creds_path)?;

    tracing::info!(
        "loaded {} server(s) from {}",
        config.servers.len(),
        config_path.display()
    );
    for server in &config.servers {
        tracing::info!(
            "  {} -> wake {} via {}, redirect {} after {}s",
            server.name,
            server.mac_address,
            server.broadcast_address,
            server.site_url,
            server.wait_seconds
        );
    }
    if !creds.enabled {
        tracing::info!("admin panel is disabled");
    }

    let port = config.port;
    let state = Arc::new(AppState::new(config, config_path, creds, creds_path));
    let app = wolgate_server::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("wolgate-server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
