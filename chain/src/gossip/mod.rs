//! Peer gossip interfaces.
//!
//! The node talks to its peers through the [`PeerClient`] trait: it can
//! broadcast a transaction, broadcast a block, and fetch a peer's full
//! chain for conflict resolution. The concrete HTTP implementation lives
//! in [`http::HttpPeerClient`]; tests substitute scripted clients.

pub mod http;

pub use http::HttpPeerClient;

use std::fmt;

use crate::types::{Block, Transaction};

/// Outcome of delivering a gossip payload to a single peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastAck {
    /// The peer accepted the payload.
    Accepted,
    /// The peer declined with a client or server error.
    Rejected,
    /// The peer answered 409: its chain disagrees with ours.
    Conflict,
}

/// Errors from talking to a peer.
#[derive(Debug)]
pub enum GossipError {
    /// Connection refused or timed out; the peer is treated as
    /// unreachable and skipped.
    Unreachable(String),
    /// The peer answered, but the payload could not be understood.
    Protocol(String),
}

impl fmt::Display for GossipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GossipError::Unreachable(msg) => write!(f, "peer unreachable: {msg}"),
            GossipError::Protocol(msg) => write!(f, "peer protocol error: {msg}"),
        }
    }
}

impl std::error::Error for GossipError {}

/// Outbound calls to a peer node.
///
/// Implementations should apply a bounded timeout per call; a failed or
/// timed-out call surfaces as [`GossipError::Unreachable`] and the caller
/// moves on to the next peer.
pub trait PeerClient {
    /// POSTs a transaction to the peer's `/broadcast` endpoint.
    fn send_transaction(
        &self,
        peer: &str,
        tx: &Transaction,
    ) -> Result<BroadcastAck, GossipError>;

    /// POSTs a block to the peer's `/broadcastBlock` endpoint.
    fn send_block(&self, peer: &str, block: &Block) -> Result<BroadcastAck, GossipError>;

    /// GETs the peer's full chain from its `/chain` endpoint.
    fn fetch_chain(&self, peer: &str) -> Result<Vec<Block>, GossipError>;
}
