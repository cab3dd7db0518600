//! API gateway configuration.
//!
//! For now this only configures the HTTP listen address; the node-level
//! configuration (persistence filenames, gossip timeout, metrics) comes
//! from `chain::NodeConfig::for_port`.

use std::net::SocketAddr;

/// Configuration for the gateway HTTP server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
}

impl ApiConfig {
    /// Binds to all interfaces on `port`, so peers on other hosts can
    /// reach the gossip endpoints.
    pub fn for_port(port: u16) -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], port)),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::for_port(5000)
    }
}
