//! Storage backends for node state.
//!
//! This module provides the [`StateStore`] abstraction over durable node
//! state and two implementations:
//!
//! - a flat-file store ([`file::FileStateStore`]) matching the node's
//!   on-disk format, and
//! - an in-memory store ([`mem::InMemoryStateStore`]) suitable for tests.

pub mod file;
pub mod mem;

pub use file::FileStateStore;
pub use mem::InMemoryStateStore;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Block, Transaction};

/// Everything a node persists between restarts.
///
/// The conflict flag and the wallet are deliberately not part of this
/// record: the flag is transient, and wallet keys live in their own file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeState {
    /// The full chain, genesis first. Never empty.
    pub chain: Vec<Block>,
    /// Accepted but unmined transactions, in admission order.
    pub pending: Vec<Transaction>,
    /// Known peer endpoints (`host:port`).
    pub peer_nodes: Vec<String>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
            peer_nodes: Vec::new(),
        }
    }
}

/// Errors from loading or saving node state.
#[derive(Debug)]
pub enum StorageError {
    /// Underlying filesystem failure.
    Io(String),
    /// The stored state could not be decoded.
    Corrupt(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "storage I/O error: {msg}"),
            StorageError::Corrupt(msg) => write!(f, "corrupt node state: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

/// Abstract persistence interface for node state.
///
/// The interface is intentionally small: the node facade only needs to
/// load the previous state at startup and snapshot the current state
/// after mutations.
pub trait StateStore {
    /// Loads the persisted state. `Ok(None)` means nothing was persisted
    /// yet (a fresh node), which callers treat as the default state.
    fn load(&self) -> Result<Option<NodeState>, StorageError>;

    /// Persists a snapshot of the state.
    fn save(&self, state: &NodeState) -> Result<(), StorageError>;
}
