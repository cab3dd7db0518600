//! Top-level configuration for a coin node.
//!
//! This module aggregates configuration for:
//!
//! - the node identity and persistence filenames (port + data dir),
//! - the gossip client (per-peer HTTP timeout),
//! - the metrics exporter (enable flag + listen address).
//!
//! The goal is to have a single `NodeConfig` struct that higher-level
//! binaries (e.g. the HTTP gateway) can construct from a `--port` flag,
//! defaults, or environment variables as needed.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the peer gossip client.
#[derive(Clone, Debug)]
pub struct GossipConfig {
    /// Per-peer request timeout. Calls that exceed it are treated as
    /// "peer unreachable" and skipped.
    pub timeout: Duration,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
        }
    }
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Clone, Debug)]
pub struct MetricsConfig {
    /// Whether to run a `/metrics` HTTP exporter.
    pub enabled: bool,
    /// Address to bind the metrics HTTP server to.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 9898)),
        }
    }
}

/// Top-level configuration for a coin node.
///
/// The port doubles as the node identity on a shared host: it selects the
/// listen port of the HTTP adapter and the names of the persistence files,
/// so several nodes can run side by side in one directory.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Listen port; also keyed into the persistence filenames.
    pub port: u16,
    /// Directory holding the state and wallet files.
    pub data_dir: PathBuf,
    pub gossip: GossipConfig,
    pub metrics: MetricsConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            data_dir: PathBuf::from("."),
            gossip: GossipConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Builds a config for `port`, with the metrics exporter offset so
    /// that several nodes on one host do not collide.
    pub fn for_port(port: u16) -> Self {
        Self {
            port,
            metrics: MetricsConfig {
                listen_addr: SocketAddr::from(([127, 0, 0, 1], port.saturating_add(4898))),
                ..MetricsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Path of the node state file (`blockchain-<port>.txt`).
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join(format!("blockchain-{}.txt", self.port))
    }

    /// Path of the wallet key file (`wallet-<port>.txt`).
    pub fn wallet_file(&self) -> PathBuf {
        self.data_dir.join(format!("wallet-{}.txt", self.port))
    }
}
