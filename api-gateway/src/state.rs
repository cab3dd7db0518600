//! Shared application state for the HTTP adapter.

use std::sync::Arc;

use chain::{DefaultNode, MetricsRegistry};

/// Shared state held by the API handlers.
///
/// This is wrapped in an [`Arc`] and passed to request handlers via Axum's
/// `State` extractor. The node serializes its own mutations internally;
/// handlers hold no extra locks.
pub struct AppState {
    /// The running node (file-backed state + HTTP gossip).
    pub node: Arc<DefaultNode>,
    /// Metrics registry shared between the node endpoints and the
    /// exporter.
    pub metrics: Arc<MetricsRegistry>,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;

/// Runs a blocking node operation off the async runtime.
///
/// Node calls block on file I/O, mining, and outbound peer HTTP, so they
/// are moved onto the blocking thread pool.
pub async fn with_node<T, F>(state: &SharedState, f: F) -> T
where
    F: FnOnce(&DefaultNode) -> T + Send + 'static,
    T: Send + 'static,
{
    let node = state.node.clone();
    tokio::task::spawn_blocking(move || f(&node))
        .await
        .expect("node operation should not panic")
}
