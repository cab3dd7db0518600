// chain/src/types/tx.rs

//! Transaction type and canonical serialization.
//!
//! A transaction is a fixed-field record. The field declaration order is
//! significant: `serde_json` emits keys in declaration order, and the
//! resulting compact JSON is the canonical form used for block hashing
//! and the proof-of-work input. Reordering the fields changes every block
//! hash on the chain.

use serde::{Deserialize, Serialize};

/// Sentinel `sender` value marking a coinbase (mining reward) transaction.
///
/// Coinbase transactions carry an empty signature and are accepted by rule
/// rather than by signature verification.
pub const MINING_SENDER: &str = "MINING";

/// A signed value transfer between two participants.
///
/// `sender` and `recipient` are hex-encoded DER public keys (or the
/// [`MINING_SENDER`] sentinel); `signature` is the hex-encoded PKCS#1 v1.5
/// signature over [`Transaction::signing_payload`], empty for coinbase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hex-encoded DER public key of the signer, or `"MINING"`.
    pub sender: String,

    /// Hex-encoded DER public key of the receiving participant.
    pub recipient: String,

    /// Hex-encoded signature bytes; empty string for coinbase.
    pub signature: String,

    /// Transferred amount. Non-negative; displayed with two decimals.
    pub amount: f64,
}

impl Transaction {
    /// Creates a new transaction from its four fields.
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            signature: signature.into(),
            amount,
        }
    }

    /// Creates the miner's reward transaction.
    pub fn coinbase(recipient: impl Into<String>, amount: f64) -> Self {
        Self::new(MINING_SENDER, recipient, amount, "")
    }

    /// Returns `true` if this is a coinbase reward transaction.
    pub fn is_coinbase(&self) -> bool {
        self.sender == MINING_SENDER
    }

    /// Returns the canonical compact-JSON form of this transaction.
    ///
    /// Keys appear in declaration order (`sender`, `recipient`,
    /// `signature`, `amount`). This is the form embedded into block
    /// hashes and proof-of-work guesses.
    ///
    /// # Panics
    ///
    /// Panics if encoding fails. This is considered a programming error,
    /// because all fields are plain strings and numbers.
    pub fn canonical_json(&self) -> String {
        serde_json::to_string(self)
            .expect("Transaction should always be serializable as JSON")
    }

    /// Returns the UTF-8 string that is digested and signed.
    ///
    /// The payload is the concatenation of the decimal representations of
    /// `sender`, `recipient`, and `amount`, with no separators. Signer and
    /// verifier must build it identically.
    pub fn signing_payload(&self) -> String {
        format!("{}{}{}", self.sender, self.recipient, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_json_keeps_declared_field_order() {
        let tx = Transaction::new("alice", "bob", 2.5, "ab01");
        assert_eq!(
            tx.canonical_json(),
            r#"{"sender":"alice","recipient":"bob","signature":"ab01","amount":2.5}"#
        );
    }

    #[test]
    fn coinbase_has_sentinel_sender_and_empty_signature() {
        let tx = Transaction::coinbase("miner-key", 10.0);
        assert!(tx.is_coinbase());
        assert_eq!(tx.sender, MINING_SENDER);
        assert_eq!(tx.signature, "");
        assert_eq!(tx.amount, 10.0);
    }

    #[test]
    fn signing_payload_concatenates_sender_recipient_amount() {
        let tx = Transaction::new("alice", "bob", 4.2, "");
        assert_eq!(tx.signing_payload(), "alicebob4.2");

        // Whole amounts use the plain decimal form.
        let tx = Transaction::new("a", "b", 10.0, "");
        assert_eq!(tx.signing_payload(), "ab10");
    }

    #[test]
    fn wire_json_roundtrips() {
        let tx = Transaction::new("alice", "bob", 1.25, "deadbeef");
        let json = serde_json::to_string(&tx).expect("encode");
        let back: Transaction = serde_json::from_str(&json).expect("decode");
        assert_eq!(back, tx);
    }

    #[test]
    fn deserialization_accepts_any_key_order() {
        // Peers may emit keys in another order; only our own serializer is
        // canonical.
        let json = r#"{"amount":3.0,"signature":"","recipient":"bob","sender":"MINING"}"#;
        let tx: Transaction = serde_json::from_str(json).expect("decode");
        assert!(tx.is_coinbase());
        assert_eq!(tx.recipient, "bob");
    }
}
