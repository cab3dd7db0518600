//! HTTP-based peer gossip client.
//!
//! Peers are addressed as bare `host:port` strings; this client prefixes
//! the scheme and talks JSON to the peer's node adapter:
//!
//! - `POST /broadcast` with the transaction record,
//! - `POST /broadcastBlock` with `{"block": ...}`,
//! - `GET /chain` returning the peer's block list.
//!
//! The client is thread-safe (`Send + Sync`) and uses the blocking
//! `reqwest` client internally; async layers wrap calls in dedicated
//! threads or `spawn_blocking` tasks.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Serialize;

use super::{BroadcastAck, GossipError, PeerClient};
use crate::types::{Block, Transaction};

/// HTTP implementation of [`PeerClient`].
pub struct HttpPeerClient {
    client: Client,
}

impl HttpPeerClient {
    /// Constructs a client with a per-call `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, GossipError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GossipError::Unreachable(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    fn endpoint(peer: &str, path: &str) -> String {
        // Avoid accidental double slashes.
        format!(
            "http://{}/{}",
            peer.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn ack_for(status: StatusCode) -> BroadcastAck {
        if status.is_success() {
            BroadcastAck::Accepted
        } else if status == StatusCode::CONFLICT {
            BroadcastAck::Conflict
        } else {
            BroadcastAck::Rejected
        }
    }
}

/// Wire envelope for block broadcasts.
#[derive(Debug, Serialize)]
struct BlockEnvelope<'a> {
    block: &'a Block,
}

impl PeerClient for HttpPeerClient {
    fn send_transaction(
        &self,
        peer: &str,
        tx: &Transaction,
    ) -> Result<BroadcastAck, GossipError> {
        let url = Self::endpoint(peer, "broadcast");
        let resp = self
            .client
            .post(&url)
            .json(tx)
            .send()
            .map_err(|e| GossipError::Unreachable(format!("POST {url} failed: {e}")))?;
        Ok(Self::ack_for(resp.status()))
    }

    fn send_block(&self, peer: &str, block: &Block) -> Result<BroadcastAck, GossipError> {
        let url = Self::endpoint(peer, "broadcastBlock");
        let resp = self
            .client
            .post(&url)
            .json(&BlockEnvelope { block })
            .send()
            .map_err(|e| GossipError::Unreachable(format!("POST {url} failed: {e}")))?;
        Ok(Self::ack_for(resp.status()))
    }

    fn fetch_chain(&self, peer: &str) -> Result<Vec<Block>, GossipError> {
        let url = Self::endpoint(peer, "chain");
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| GossipError::Unreachable(format!("GET {url} failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GossipError::Protocol(format!(
                "peer returned HTTP status {status}"
            )));
        }

        resp.json::<Vec<Block>>()
            .map_err(|e| GossipError::Protocol(format!("failed to parse chain JSON: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        assert_eq!(
            HttpPeerClient::endpoint("localhost:5001", "broadcast"),
            "http://localhost:5001/broadcast"
        );
        assert_eq!(
            HttpPeerClient::endpoint("localhost:5001/", "/chain"),
            "http://localhost:5001/chain"
        );
    }

    #[test]
    fn status_codes_map_to_acks() {
        assert_eq!(
            HttpPeerClient::ack_for(StatusCode::OK),
            BroadcastAck::Accepted
        );
        assert_eq!(
            HttpPeerClient::ack_for(StatusCode::CREATED),
            BroadcastAck::Accepted
        );
        assert_eq!(
            HttpPeerClient::ack_for(StatusCode::CONFLICT),
            BroadcastAck::Conflict
        );
        assert_eq!(
            HttpPeerClient::ack_for(StatusCode::BAD_REQUEST),
            BroadcastAck::Rejected
        );
        assert_eq!(
            HttpPeerClient::ack_for(StatusCode::INTERNAL_SERVER_ERROR),
            BroadcastAck::Rejected
        );
    }

    #[test]
    fn block_envelope_wraps_the_block_field() {
        let block = Block::genesis();
        let json = serde_json::to_string(&BlockEnvelope { block: &block }).expect("encode");
        assert!(json.starts_with(r#"{"block":{"index":0,"#));
    }
}
