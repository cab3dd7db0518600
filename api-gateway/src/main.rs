// api-gateway/src/main.rs

//! Coin node HTTP adapter.
//!
//! This binary exposes the node core over HTTP:
//!
//! - wallet management (`/wallet`, `/balance`),
//! - transaction submission and gossip intake (`/transaction`,
//!   `/broadcast`, `/transactions`),
//! - mining, block intake, and conflict resolution (`/mine`,
//!   `/broadcastBlock`, `/resolveConflicts`, `/chain`),
//! - peer registry management (`/node`, `/nodes`).
//!
//! It embeds a `DefaultNode` (flat-file state + blocking HTTP gossip)
//! and a Prometheus metrics exporter. The `--port` flag selects both the
//! listen port and the persistence filenames, so several nodes can run
//! side by side from one directory.

mod config;
mod routes;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use clap::Parser;
use tokio::signal;

use chain::{
    DefaultNode, FileStateStore, HttpPeerClient, MetricsRegistry, NodeConfig,
    run_prometheus_http_server,
};
use config::ApiConfig;
use state::{AppState, SharedState};

#[derive(Debug, Parser)]
#[command(name = "coin-node", about = "Proof-of-work coin node")]
struct Cli {
    /// Listen port; also selects the persistence filenames.
    #[arg(long, default_value_t = 5000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "api_gateway=info,chain=info".to_string()),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), String> {
    let cli = Cli::parse();
    let node_cfg = NodeConfig::for_port(cli.port);
    let api_cfg = ApiConfig::for_port(cli.port);

    // ---------------------------
    // Metrics
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new().map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    if node_cfg.metrics.enabled {
        let metrics_clone = metrics.clone();
        let addr = node_cfg.metrics.listen_addr;
        tokio::spawn(async move {
            if let Err(e) = run_prometheus_http_server(metrics_clone, addr).await {
                eprintln!("metrics HTTP server error: {e}");
            }
        });
        tracing::info!("metrics exporter listening on http://{}/metrics", addr);
    }

    // ---------------------------
    // Node core (storage + gossip)
    // ---------------------------

    let store = FileStateStore::new(node_cfg.state_file());
    let gossip = HttpPeerClient::new(node_cfg.gossip.timeout)
        .map_err(|e| format!("failed to build gossip client: {e}"))?;

    let node = DefaultNode::open(node_cfg, store, gossip)
        .map_err(|e| format!("failed to open node state: {e}"))?;

    // ---------------------------
    // Shared state
    // ---------------------------

    let app_state: SharedState = Arc::new(AppState {
        node: Arc::new(node),
        metrics: metrics.clone(),
    });

    // ---------------------------
    // HTTP router
    // ---------------------------

    let app = Router::new()
        .route("/", get(routes::ui::node_page))
        .route("/network", get(routes::ui::network_page))
        .route(
            "/wallet",
            post(routes::wallet::create_wallet).get(routes::wallet::load_wallet),
        )
        .route("/balance", get(routes::wallet::get_balance))
        .route("/transaction", post(routes::transactions::add_transaction))
        .route("/broadcast", post(routes::transactions::receive_broadcast))
        .route(
            "/transactions",
            get(routes::transactions::open_transactions),
        )
        .route("/mine", post(routes::blocks::mine))
        .route("/broadcastBlock", post(routes::blocks::receive_block))
        .route(
            "/resolveConflicts",
            post(routes::blocks::resolve_conflicts),
        )
        .route("/chain", get(routes::blocks::get_chain))
        .route("/node", post(routes::nodes::add_node))
        .route("/node/{node_url}", delete(routes::nodes::remove_node))
        .route("/nodes", get(routes::nodes::list_nodes))
        .with_state(app_state);

    // ---------------------------
    // axum 0.8 server (hyper 1 style)
    // ---------------------------

    tracing::info!("node listening on http://{}", api_cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(api_cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", api_cfg.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("API server error: {e}"))?;

    Ok(())
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
