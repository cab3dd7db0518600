//! Prometheus-backed metrics and HTTP exporter.
//!
//! This module defines a [`MetricsRegistry`] that owns a Prometheus
//! registry and a set of strongly-typed node metrics, and an async HTTP
//! exporter that serves `/metrics` using `hyper`.

use std::{convert::Infallible, net::SocketAddr, sync::Arc};

use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    Method, Request, Response, StatusCode, body::Incoming, header, server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder,
};

/// Node-level Prometheus metrics.
///
/// These are registered into a [`Registry`] and updated by the HTTP
/// adapter around ledger operations.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Wall-clock duration of the proof-of-work search plus block
    /// sealing, in seconds.
    pub mining_seconds: Histogram,
    /// Number of blocks mined locally.
    pub blocks_mined: IntCounter,
    /// Number of peer blocks appended to the local chain.
    pub blocks_received: IntCounter,
    /// Number of transactions admitted to the pending pool.
    pub transactions_admitted: IntCounter,
    /// Number of times conflict resolution replaced the local chain.
    pub chain_replacements: IntCounter,
}

impl NodeMetrics {
    /// Registers node metrics into the given `Registry`.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let mining_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "mining_seconds",
                "Time to find a proof and seal a block, in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )?;
        registry.register(Box::new(mining_seconds.clone()))?;

        let blocks_mined = IntCounter::with_opts(Opts::new(
            "blocks_mined_total",
            "Total number of blocks mined locally",
        ))?;
        registry.register(Box::new(blocks_mined.clone()))?;

        let blocks_received = IntCounter::with_opts(Opts::new(
            "blocks_received_total",
            "Total number of peer blocks appended to the local chain",
        ))?;
        registry.register(Box::new(blocks_received.clone()))?;

        let transactions_admitted = IntCounter::with_opts(Opts::new(
            "transactions_admitted_total",
            "Total number of transactions admitted to the pending pool",
        ))?;
        registry.register(Box::new(transactions_admitted.clone()))?;

        let chain_replacements = IntCounter::with_opts(Opts::new(
            "chain_replacements_total",
            "Total number of chain replacements during conflict resolution",
        ))?;
        registry.register(Box::new(chain_replacements.clone()))?;

        Ok(Self {
            mining_seconds,
            blocks_mined,
            blocks_received,
            transactions_admitted,
            chain_replacements,
        })
    }
}

/// Wrapper around a Prometheus registry and the node metrics.
///
/// This is the main handle you pass around in the node. It can be wrapped
/// in an [`Arc`] and shared across threads/tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    pub node: NodeMetrics,
}

impl MetricsRegistry {
    /// Creates a new `MetricsRegistry` with a fresh underlying `Registry`
    /// and registers the node metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("node".to_string()), None)?;
        let node = NodeMetrics::register(&registry)?;
        Ok(Self { registry, node })
    }

    /// Encodes all metrics in this registry into the Prometheus text format.
    pub fn gather_text(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::warn!("failed to encode Prometheus metrics: {e}");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Runs an HTTP server that exposes Prometheus metrics.
///
/// The server listens on `addr` and serves `GET /metrics` with the
/// Prometheus text exposition format. All other paths return 404.
///
/// This function is `async` and is intended to be spawned onto a Tokio
/// runtime, e.g.:
///
/// ```ignore
/// let registry = Arc::new(MetricsRegistry::new()?);
/// let addr: SocketAddr = "127.0.0.1:9898".parse()?;
/// tokio::spawn(run_prometheus_http_server(registry.clone(), addr));
/// ```
pub async fn run_prometheus_http_server(
    metrics: Arc<MetricsRegistry>,
    addr: SocketAddr,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = TcpListener::bind(addr).await?;

    loop {
        let (stream, _) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let metrics = metrics.clone();

        tokio::spawn(async move {
            let svc = service_fn(move |req| {
                let metrics = metrics.clone();
                handle_request(req, metrics)
            });

            if let Err(err) = http1::Builder::new().serve_connection(io, svc).await {
                tracing::warn!("prometheus HTTP server error: {err}");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    metrics: Arc<MetricsRegistry>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match (req.method(), req.uri().path()) {
        (&Method::GET, "/metrics") => {
            let body = metrics.gather_text();
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
                .body(Full::new(Bytes::from(body)))
                .unwrap())
        }
        _ => Ok(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::from("not found")))
            .unwrap()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn node_metrics_register_and_record() {
        let registry = Registry::new();
        let metrics = NodeMetrics::register(&registry).expect("register metrics");

        metrics.mining_seconds.observe(0.123);
        metrics.blocks_mined.inc();
        metrics.blocks_received.inc();
        metrics.transactions_admitted.inc();
        metrics.chain_replacements.inc();

        let metric_families = registry.gather();
        assert!(!metric_families.is_empty());
    }

    #[test]
    fn metrics_registry_gather_text_works() {
        let registry = MetricsRegistry::new().expect("create metrics registry");
        registry.node.mining_seconds.observe(0.01);
        let text = registry.gather_text();
        assert!(text.contains("node_mining_seconds"));
        assert!(text.contains("node_blocks_mined_total"));
    }
}
