//! Core domain types shared across the node.
//!
//! This module defines the two on-chain records, [`Transaction`] and
//! [`Block`], together with their canonical serialization and hashing.
//! Field declaration order is load-bearing: the canonical form is compact
//! JSON with keys in declaration order, and every hash on the chain is
//! computed over it.

pub mod block;
pub mod tx;

pub use block::{Block, GENESIS_PROOF};
pub use tx::{MINING_SENDER, Transaction};
