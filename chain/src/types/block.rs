// chain/src/types/block.rs

//! Block type, canonical serialization, and hashing.
//!
//! A block bundles a batch of transactions, a back-pointer to its
//! predecessor by hash, a proof-of-work nonce, and a timestamp.
//!
//! Serialization is compact JSON with keys in declaration order
//! (`index`, `previous_hash`, `transactions`, `proof`, `timestamp`).
//! The same canonical encoding is used everywhere block bytes are needed:
//! hashing, the wire format, and the persistence file.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Transaction;

/// Proof value of the fixed genesis block.
pub const GENESIS_PROOF: u64 = 100;

/// One link in the chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Zero-based position in the chain; equals the number of prior blocks.
    pub index: u64,

    /// Hash of the predecessor block's canonical serialization.
    ///
    /// Empty string only for the genesis block.
    pub previous_hash: String,

    /// Ordered transactions. At mining time the last element is the
    /// coinbase reward; all others come from the pending pool.
    pub transactions: Vec<Transaction>,

    /// Proof-of-work nonce satisfying the validity predicate.
    pub proof: u64,

    /// Wall-clock time at block construction, seconds since Unix epoch.
    pub timestamp: f64,
}

impl Block {
    /// Creates a new block from its fields.
    pub fn new(
        index: u64,
        previous_hash: impl Into<String>,
        transactions: Vec<Transaction>,
        proof: u64,
        timestamp: f64,
    ) -> Self {
        Self {
            index,
            previous_hash: previous_hash.into(),
            transactions,
            proof,
            timestamp,
        }
    }

    /// Returns the fixed first block of every chain.
    pub fn genesis() -> Self {
        Self::new(0, "", Vec::new(), GENESIS_PROOF, 0.0)
    }

    /// Returns the canonical compact-JSON form of this block.
    ///
    /// Keys appear in declaration order; transactions are embedded in
    /// their own canonical form. This must remain stable across nodes for
    /// hashes to agree.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails. This is considered a programming error,
    /// because all fields are required to be serializable.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self).expect("Block should always be serializable as JSON")
    }

    /// Computes the SHA-256 hash of this block's canonical form.
    ///
    /// Returned as the lowercase hex digest. Block identity and the
    /// `previous_hash` linkage are defined in terms of this value.
    pub fn hash_hex(&self) -> String {
        hex::encode(Sha256::digest(self.canonical_json().as_bytes()))
    }

    /// Returns the transactions covered by the proof-of-work.
    ///
    /// The coinbase is appended after the proof is found, so the proof
    /// binds to every transaction except the last. For the genesis block
    /// (no transactions) this is the empty slice.
    pub fn user_transactions(&self) -> &[Transaction] {
        match self.transactions.split_last() {
            Some((_, rest)) => rest,
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_has_fixed_canonical_form() {
        let genesis = Block::genesis();
        assert_eq!(
            genesis.canonical_json(),
            r#"{"index":0,"previous_hash":"","transactions":[],"proof":100,"timestamp":0.0}"#
        );
    }

    #[test]
    fn genesis_hash_is_deterministic() {
        let h1 = Block::genesis().hash_hex();
        let h2 = Block::genesis().hash_hex();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert!(h1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn changing_any_field_changes_the_hash() {
        let block = Block::new(
            1,
            Block::genesis().hash_hex(),
            vec![Transaction::coinbase("miner", 10.0)],
            42,
            1_700_000_000.0,
        );
        let original = block.hash_hex();

        let mut tampered = block.clone();
        tampered.proof = 43;
        assert_ne!(tampered.hash_hex(), original);

        let mut tampered = block.clone();
        tampered.transactions[0].amount = 11.0;
        assert_ne!(tampered.hash_hex(), original);
    }

    #[test]
    fn user_transactions_exclude_the_trailing_coinbase() {
        let user = Transaction::new("alice", "bob", 1.0, "sig");
        let block = Block::new(
            1,
            "prev",
            vec![user.clone(), Transaction::coinbase("miner", 10.0)],
            0,
            0.0,
        );
        assert_eq!(block.user_transactions(), &[user]);

        assert!(Block::genesis().user_transactions().is_empty());
    }

    #[test]
    fn hash_survives_a_wire_roundtrip() {
        // A peer that deserializes and re-serializes the block must arrive
        // at the same hash.
        let block = Block::new(
            3,
            "00ab",
            vec![Transaction::new("alice", "bob", 2.0, "sig")],
            7,
            1_700_000_123.5,
        );
        let json = serde_json::to_string(&block).expect("encode");
        let back: Block = serde_json::from_str(&json).expect("decode");
        assert_eq!(back.hash_hex(), block.hash_hex());
    }
}
