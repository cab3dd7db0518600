//! Chain library crate.
//!
//! This crate provides the core building blocks for a small proof-of-work
//! cryptocurrency node:
//!
//! - on-chain records with canonical serialization (`types`),
//! - the RSA wallet and signatures (`wallet`),
//! - stateless validity predicates (`validation`),
//! - the replicated ledger and mining (`ledger`),
//! - the peer gossip client (`gossip`),
//! - storage backends (`storage`),
//! - Prometheus-based metrics (`metrics`),
//! - the node facade (`node`) and its configuration (`config`).
//!
//! Higher-level binaries (typically the HTTP gateway) compose these
//! pieces into a running node.

pub mod config;
pub mod gossip;
pub mod ledger;
pub mod metrics;
pub mod node;
pub mod storage;
pub mod types;
pub mod validation;
pub mod wallet;

// Re-export top-level configuration types.
pub use config::{GossipConfig, MetricsConfig, NodeConfig};

// Re-export the node facade and its surface types.
pub use node::{BlockIngest, Node, NodeError, WalletSummary};

// Re-export ledger types and constants.
pub use ledger::{Ledger, LedgerError, MINING_REWARD};

// Re-export gossip interfaces and the HTTP client.
pub use gossip::{BroadcastAck, GossipError, HttpPeerClient, PeerClient};

// Re-export storage backends.
pub use storage::{FileStateStore, InMemoryStateStore, NodeState, StateStore, StorageError};

// Re-export metrics registry and exporter.
pub use metrics::{MetricsRegistry, NodeMetrics, run_prometheus_http_server};

// Re-export wallet and validation interfaces.
pub use validation::BalanceSource;
pub use wallet::{Wallet, WalletError};

// Re-export domain types at the crate root for convenience.
pub use types::*;

/// Type alias for the default gossip client of a running node.
pub type DefaultPeerClient = HttpPeerClient;

/// Type alias for the default storage backend (the flat state file).
pub type DefaultStateStore = FileStateStore;

/// Type alias for the default node stack.
///
/// This uses:
///
/// - [`DefaultStateStore`] (flat file keyed by port),
/// - [`DefaultPeerClient`] (blocking HTTP gossip).
pub type DefaultNode = Node<DefaultStateStore, DefaultPeerClient>;
