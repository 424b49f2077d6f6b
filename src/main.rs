//! Edge Gateway
//!
//! A production-ready API gateway built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                  EDGE GATEWAY                     │
//!                      │                                                   │
//!   Client Request     │  ┌─────────┐   ┌──────────────┐   ┌───────────┐  │
//!   ───────────────────┼─▶│  http   │──▶│ authenticate │──▶│ authorize │  │
//!                      │  │ server  │   │  (identity)  │   │  (guard)  │  │
//!                      │  └─────────┘   └──────┬───────┘   └─────┬─────┘  │
//!                      │                       │                 │        │
//!                      │                       ▼                 ▼        │
//!                      │                ┌─────────────────────────────┐   │
//!                      │                │      service registry       │   │
//!                      │                │  (copy-on-write snapshots)  │   │
//!                      │                └─────────────────────────────┘   │
//!                      │                                 │                │
//!   Client Response    │  ┌──────────┐                   ▼                │
//!   ◀──────────────────┼──│  relay   │◀───────── proxy forwarder ◀───────┼── Downstream
//!                      │  └──────────┘      (single call, bounded)       │    Service
//!                      │                                                   │
//!                      │  ┌────────────────────────────────────────────┐  │
//!                      │  │            Cross-Cutting Concerns           │  │
//!                      │  │  config │ health │ observability │ admin    │  │
//!                      │  │         │ checks │               │ surface  │  │
//!                      │  └────────────────────────────────────────────┘  │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::path::Path;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edge_gateway::config::loader::load_config;
use edge_gateway::http::HttpServer;
use edge_gateway::lifecycle::{signals, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edge_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("edge-gateway v0.1.0 starting");

    // Load configuration; the routing table is rebuilt from it on every start.
    let config_path =
        std::env::var("GATEWAY_CONFIG").unwrap_or_else(|_| "gateway.toml".to_string());
    let config = load_config(Path::new(&config_path))?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        forward_timeout_ms = config.timeouts.forward_ms,
        "Configuration loaded"
    );

    // Initialize metrics exporter
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            edge_gateway::observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    // Create and run HTTP server
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
