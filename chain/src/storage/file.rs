//! Flat-file state store.
//!
//! The node persists its state into a single text file of three
//! newline-terminated lines:
//!
//! 1. JSON array of blocks,
//! 2. JSON array of pending transactions,
//! 3. JSON array of peer endpoint strings.
//!
//! Saves go through a temp file followed by a rename so a crash mid-write
//! never leaves a half-written state file behind.

use std::fs;
use std::io;
use std::path::PathBuf;

use super::{NodeState, StateStore, StorageError};
use crate::types::{Block, Transaction};

/// [`StateStore`] backed by the node's `blockchain-<port>.txt` file.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    /// Creates a store reading and writing `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Option<NodeState>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        let mut lines = content.lines();
        let chain_line = lines
            .next()
            .ok_or_else(|| StorageError::Corrupt("missing chain line".into()))?;
        let pending_line = lines
            .next()
            .ok_or_else(|| StorageError::Corrupt("missing pending line".into()))?;
        let peers_line = lines
            .next()
            .ok_or_else(|| StorageError::Corrupt("missing peers line".into()))?;

        let chain: Vec<Block> = serde_json::from_str(chain_line)
            .map_err(|e| StorageError::Corrupt(format!("chain line: {e}")))?;
        let pending: Vec<Transaction> = serde_json::from_str(pending_line)
            .map_err(|e| StorageError::Corrupt(format!("pending line: {e}")))?;
        let peer_nodes: Vec<String> = serde_json::from_str(peers_line)
            .map_err(|e| StorageError::Corrupt(format!("peers line: {e}")))?;

        Ok(Some(NodeState {
            chain,
            pending,
            peer_nodes,
        }))
    }

    fn save(&self, state: &NodeState) -> Result<(), StorageError> {
        let chain = serde_json::to_string(&state.chain)
            .map_err(|e| StorageError::Corrupt(format!("chain: {e}")))?;
        let pending = serde_json::to_string(&state.pending)
            .map_err(|e| StorageError::Corrupt(format!("pending: {e}")))?;
        let peers = serde_json::to_string(&state.peer_nodes)
            .map_err(|e| StorageError::Corrupt(format!("peers: {e}")))?;

        let body = format!("{chain}\n{pending}\n{peers}\n");

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body).map_err(|e| StorageError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Block, Transaction};

    fn sample_state() -> NodeState {
        let genesis = Block::genesis();
        let block = Block::new(
            1,
            genesis.hash_hex(),
            vec![
                Transaction::new("alice", "bob", 2.0, "sig"),
                Transaction::coinbase("alice", 10.0),
            ],
            23,
            1_700_000_000.0,
        );
        NodeState {
            chain: vec![genesis, block],
            pending: vec![Transaction::new("alice", "carol", 1.5, "sig2")],
            peer_nodes: vec!["localhost:5001".into(), "localhost:5002".into()],
        }
    }

    #[test]
    fn save_then_load_roundtrips_field_by_field() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path().join("blockchain-5000.txt"));

        let state = sample_state();
        store.save(&state).expect("save");
        let loaded = store.load().expect("load").expect("state present");

        assert_eq!(loaded, state);
        // Hashes must survive the trip unchanged.
        assert_eq!(loaded.chain[1].hash_hex(), state.chain[1].hash_hex());
    }

    #[test]
    fn missing_file_means_fresh_node() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path().join("blockchain-5000.txt"));
        assert!(store.load().expect("load").is_none());
    }

    #[test]
    fn file_has_three_json_lines() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blockchain-5000.txt");
        let store = FileStateStore::new(path.clone());

        store.save(&sample_state()).expect("save");
        let content = std::fs::read_to_string(&path).expect("read");

        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with('['));
        assert!(lines[1].starts_with('['));
        assert_eq!(lines[2], r#"["localhost:5001","localhost:5002"]"#);
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn truncated_file_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("blockchain-5000.txt");
        std::fs::write(&path, "[]\n").expect("write");

        let store = FileStateStore::new(path);
        assert!(matches!(store.load(), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn save_overwrites_previous_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStateStore::new(dir.path().join("blockchain-5000.txt"));

        store.save(&NodeState::default()).expect("first save");
        let state = sample_state();
        store.save(&state).expect("second save");

        let loaded = store.load().expect("load").expect("present");
        assert_eq!(loaded, state);
    }
}
