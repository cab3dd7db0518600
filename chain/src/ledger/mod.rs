//! The replicated ledger: chain, pending pool, peer set, and the
//! operations that mutate them.
//!
//! The ledger is a pure in-memory state machine. Persistence and gossip
//! are orchestrated by the node facade, which snapshots state and the
//! peer set under its lock and performs all I/O with the lock released.
//! The ledger itself never touches the disk or the network.

mod error;

pub use error::LedgerError;

use std::collections::BTreeSet;

use crate::storage::NodeState;
use crate::types::{Block, Transaction};
use crate::validation::{self, BalanceSource};
use crate::wallet::Wallet;

/// Reward credited to the miner's wallet in every mined block.
pub const MINING_REWARD: f64 = 10.0;

/// The ordered chain of blocks plus everything that feeds the next one.
pub struct Ledger {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    peer_nodes: BTreeSet<String>,
    hosting_node: Option<String>,
    resolve_conflicts: bool,
}

impl Ledger {
    /// Creates a ledger with a fresh genesis chain.
    ///
    /// `hosting_node` is the public key of the local wallet, used as the
    /// coinbase recipient and the default balance participant; `None`
    /// while no wallet exists yet.
    pub fn new(hosting_node: Option<String>) -> Self {
        Self::from_state(NodeState::default(), hosting_node)
    }

    /// Rebuilds a ledger from persisted state.
    pub fn from_state(state: NodeState, hosting_node: Option<String>) -> Self {
        let chain = if state.chain.is_empty() {
            vec![Block::genesis()]
        } else {
            state.chain
        };
        Self {
            chain,
            pending: state.pending,
            peer_nodes: state.peer_nodes.into_iter().collect(),
            hosting_node,
            resolve_conflicts: false,
        }
    }

    /// Clones the durable parts of the state for persistence.
    pub fn snapshot(&self) -> NodeState {
        NodeState {
            chain: self.chain.clone(),
            pending: self.pending.clone(),
            peer_nodes: self.peer_nodes.iter().cloned().collect(),
        }
    }

    /// Binds (or clears) the hosting wallet identity.
    pub fn bind_identity(&mut self, hosting_node: Option<String>) {
        self.hosting_node = hosting_node;
    }

    /// The full chain, genesis first.
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Accepted but unmined transactions, in admission order.
    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    /// The current tip. The chain is never empty.
    pub fn last_block(&self) -> &Block {
        self.chain.last().expect("chain always contains genesis")
    }

    /// The hosting wallet's public key, if bound.
    pub fn hosting_node(&self) -> Option<&str> {
        self.hosting_node.as_deref()
    }

    /// Whether a peer has signalled that our chain diverges from theirs.
    pub fn needs_resolution(&self) -> bool {
        self.resolve_conflicts
    }

    /// Raises the conflict flag; cleared by [`Ledger::resolve_with`].
    pub fn flag_conflict(&mut self) {
        self.resolve_conflicts = true;
    }

    /// Balance of the hosting wallet, or `None` when no wallet is bound.
    pub fn balance(&self) -> Option<f64> {
        self.hosting_node
            .as_deref()
            .map(|participant| self.balance_of(participant))
    }

    /// Balance of an arbitrary participant.
    ///
    /// Confirmed inflow minus confirmed outflow minus pending outflow:
    /// unconfirmed incoming amounts are not spendable, while outgoing
    /// pending amounts are already debited to block double spending.
    pub fn balance_of(&self, participant: &str) -> f64 {
        let confirmed = self.chain.iter().flat_map(|block| &block.transactions);

        let received: f64 = confirmed
            .clone()
            .filter(|tx| tx.recipient == participant)
            .map(|tx| tx.amount)
            .sum();
        let sent: f64 = confirmed
            .filter(|tx| tx.sender == participant)
            .map(|tx| tx.amount)
            .sum();
        let sent_pending: f64 = self
            .pending
            .iter()
            .filter(|tx| tx.sender == participant)
            .map(|tx| tx.amount)
            .sum();

        received - sent - sent_pending
    }

    /// Admits a transaction into the pending pool.
    ///
    /// Requires a hosting wallet, a verifying signature (coinbase never
    /// reaches this path from the adapters), and sufficient sender funds.
    pub fn admit_transaction(&mut self, tx: Transaction) -> Result<(), LedgerError> {
        if self.hosting_node.is_none() {
            return Err(LedgerError::WalletMissing);
        }
        if !Wallet::verify_transaction(&tx) {
            return Err(LedgerError::InvalidSignature);
        }
        if !validation::verify_transaction(&tx, self) {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance_of(&tx.sender),
                amount: tx.amount,
                participant: tx.sender,
            });
        }
        self.pending.push(tx);
        Ok(())
    }

    /// Runs the proof-of-work search for the current pending pool.
    pub fn proof_of_work(&self) -> u64 {
        validation::find_proof(&self.pending, &self.last_block().hash_hex())
    }

    /// Mines the next block from the pending pool.
    ///
    /// Snapshots the pool, solves the proof against the tip hash, appends
    /// the coinbase reward, and re-verifies every included signature
    /// before mutating anything. On success the block is appended and the
    /// pool is emptied.
    pub fn mine_block(&mut self, timestamp: f64) -> Result<Block, LedgerError> {
        let recipient = self
            .hosting_node
            .clone()
            .ok_or(LedgerError::WalletMissing)?;

        let last_hash = self.last_block().hash_hex();
        let proof = validation::find_proof(&self.pending, &last_hash);

        let mut transactions = self.pending.clone();
        transactions.push(Transaction::coinbase(recipient, MINING_REWARD));

        // A signature that went bad since admission (e.g. tampered state
        // loaded from disk) must not end up in a sealed block.
        if !transactions.iter().all(Wallet::verify_transaction) {
            return Err(LedgerError::InvalidSignature);
        }

        let block = Block::new(
            self.chain.len() as u64,
            last_hash,
            transactions,
            proof,
            timestamp,
        );
        self.chain.push(block.clone());
        self.pending.clear();
        Ok(block)
    }

    /// Appends a block received from a peer.
    ///
    /// The proof is validated over the block's transactions minus the
    /// trailing coinbase, and the block must link to our current tip. On
    /// success, pending transactions confirmed by the block are dropped
    /// from the pool; entries with no match are left untouched.
    pub fn receive_block(&mut self, block: Block) -> Result<(), LedgerError> {
        if !validation::valid_proof(block.user_transactions(), &block.previous_hash, block.proof)
        {
            return Err(LedgerError::InvalidProof);
        }
        if block.previous_hash != self.last_block().hash_hex() {
            return Err(LedgerError::TipMismatch);
        }

        self.pending
            .retain(|open| !block.transactions.iter().any(|confirmed| confirmed == open));
        self.chain.push(block);
        Ok(())
    }

    /// Adopts the longest valid chain among `candidates`.
    ///
    /// A candidate wins only if it is strictly longer than the current
    /// winner AND passes full chain validation. When a replacement
    /// happens the pending pool is dropped, because its transactions may
    /// conflict with the new history. The conflict flag is cleared either
    /// way. Returns whether the local chain was replaced.
    pub fn resolve_with(&mut self, candidates: Vec<Vec<Block>>) -> bool {
        let mut winner: Option<Vec<Block>> = None;
        let mut winner_len = self.chain.len();

        for candidate in candidates {
            if candidate.len() > winner_len && validation::valid_chain(&candidate) {
                winner_len = candidate.len();
                winner = Some(candidate);
            }
        }

        let replaced = winner.is_some();
        if let Some(chain) = winner {
            self.chain = chain;
            self.pending.clear();
        }
        self.resolve_conflicts = false;
        replaced
    }

    /// Adds a peer endpoint. Returns `false` if it was already known.
    pub fn add_peer_node(&mut self, peer: impl Into<String>) -> bool {
        self.peer_nodes.insert(peer.into())
    }

    /// Removes a peer endpoint. Unknown peers are ignored.
    pub fn remove_peer_node(&mut self, peer: &str) -> bool {
        self.peer_nodes.remove(peer)
    }

    /// All known peer endpoints.
    pub fn peer_nodes(&self) -> Vec<String> {
        self.peer_nodes.iter().cloned().collect()
    }
}

impl BalanceSource for Ledger {
    fn balance_of(&self, participant: &str) -> f64 {
        Ledger::balance_of(self, participant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::Wallet;

    /// A funded ledger hosted by `wallet`: one mined block crediting the
    /// wallet with the mining reward.
    fn funded_ledger(wallet: &Wallet) -> Ledger {
        let public_key = wallet.public_key().expect("wallet has keys").to_owned();
        let mut ledger = Ledger::new(Some(public_key));
        ledger.mine_block(1.0).expect("mining succeeds");
        ledger
    }

    fn signed_transaction(wallet: &Wallet, recipient: &str, amount: f64) -> Transaction {
        let sender = wallet.public_key().expect("wallet has keys").to_owned();
        let signature = wallet
            .sign_transaction(&sender, recipient, amount)
            .expect("signing succeeds");
        Transaction::new(sender, recipient, amount, signature)
    }

    #[test]
    fn fresh_ledger_starts_with_genesis_only() {
        let ledger = Ledger::new(None);
        assert_eq!(ledger.chain().len(), 1);
        assert_eq!(ledger.last_block(), &Block::genesis());
        assert!(ledger.pending().is_empty());
        assert!(ledger.balance().is_none());
    }

    #[test]
    fn mined_block_pays_the_reward_and_empties_the_pool() {
        let wallet = Wallet::create().expect("keygen");
        let public_key = wallet.public_key().expect("keys").to_owned();
        let mut ledger = Ledger::new(Some(public_key.clone()));

        let block = ledger.mine_block(2.0).expect("mining succeeds");

        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, Block::genesis().hash_hex());
        assert!(ledger.pending().is_empty());

        let coinbase = block.transactions.last().expect("coinbase present");
        assert!(coinbase.is_coinbase());
        assert_eq!(coinbase.recipient, public_key);
        assert_eq!(coinbase.amount, MINING_REWARD);

        assert_eq!(ledger.balance(), Some(MINING_REWARD));
        assert!(validation::valid_chain(ledger.chain()));
    }

    #[test]
    fn mining_without_a_wallet_is_refused() {
        let mut ledger = Ledger::new(None);
        assert!(matches!(
            ledger.mine_block(0.0),
            Err(LedgerError::WalletMissing)
        ));
        assert_eq!(ledger.chain().len(), 1);
    }

    #[test]
    fn admission_checks_signature_and_funds() {
        let wallet = Wallet::create().expect("keygen");
        let mut ledger = funded_ledger(&wallet);

        // Unsigned transaction: rejected, never reaches the pool.
        let forged = Transaction::new(
            wallet.public_key().expect("keys"),
            "bob",
            1.0,
            "deadbeef",
        );
        assert!(matches!(
            ledger.admit_transaction(forged),
            Err(LedgerError::InvalidSignature)
        ));
        assert!(ledger.pending().is_empty());

        // More than the reward: insufficient funds.
        let too_big = signed_transaction(&wallet, "bob", MINING_REWARD + 1.0);
        assert!(matches!(
            ledger.admit_transaction(too_big),
            Err(LedgerError::InsufficientFunds { .. })
        ));

        // Within funds: admitted in order.
        let ok = signed_transaction(&wallet, "bob", 2.0);
        ledger.admit_transaction(ok.clone()).expect("admitted");
        assert_eq!(ledger.pending(), &[ok]);
    }

    #[test]
    fn balance_debits_pending_but_ignores_unconfirmed_inflow() {
        let wallet = Wallet::create().expect("keygen");
        let mut ledger = funded_ledger(&wallet);

        let tx = signed_transaction(&wallet, "bob", 2.0);
        ledger.admit_transaction(tx).expect("admitted");

        // Sender: 10 mined - 2 pending out.
        assert_eq!(ledger.balance(), Some(8.0));
        // Recipient: pending inflow is not credited yet.
        assert_eq!(ledger.balance_of("bob"), 0.0);

        ledger.mine_block(3.0).expect("mining succeeds");
        assert_eq!(ledger.balance_of("bob"), 2.0);
        // Sender: 20 mined - 2 confirmed out.
        assert_eq!(ledger.balance(), Some(18.0));
    }

    #[test]
    fn received_block_confirms_matching_pending_entries() {
        let wallet = Wallet::create().expect("keygen");

        // Miner node produces a block containing a transaction.
        let mut miner = funded_ledger(&wallet);
        let tx = signed_transaction(&wallet, "bob", 2.0);
        miner.admit_transaction(tx.clone()).expect("admitted");
        let unrelated = signed_transaction(&wallet, "carol", 1.0);

        // Receiver node has the same chain and both transactions pending.
        let mut receiver = Ledger::from_state(miner.snapshot(), None);
        receiver.bind_identity(miner.hosting_node().map(str::to_owned));

        let block = miner.mine_block(4.0).expect("mining succeeds");

        receiver
            .admit_transaction(unrelated.clone())
            .expect("admitted");
        receiver.receive_block(block).expect("appended");

        // The mined transaction left the pool; the unrelated one stayed.
        assert_eq!(receiver.pending(), &[unrelated]);
        assert_eq!(receiver.chain().len(), 3);
    }

    #[test]
    fn received_block_must_link_to_the_tip() {
        let wallet = Wallet::create().expect("keygen");
        let mut miner = funded_ledger(&wallet);
        let mut stale = Ledger::from_state(miner.snapshot(), None);

        // Mine twice on the miner; the second block does not link to the
        // stale node's tip once it missed the first.
        let first = miner.mine_block(5.0).expect("block 2");
        let second = miner.mine_block(6.0).expect("block 3");

        assert!(matches!(
            stale.receive_block(second),
            Err(LedgerError::TipMismatch)
        ));
        stale.receive_block(first).expect("in-order block appends");
    }

    #[test]
    fn received_block_with_bad_proof_is_rejected() {
        let wallet = Wallet::create().expect("keygen");
        let mut miner = funded_ledger(&wallet);
        let mut receiver = Ledger::from_state(miner.snapshot(), None);

        let mut block = miner.mine_block(7.0).expect("mined");
        block.proof = (0..)
            .find(|p| {
                !validation::valid_proof(block.user_transactions(), &block.previous_hash, *p)
            })
            .expect("an invalid proof exists");

        assert!(matches!(
            receiver.receive_block(block),
            Err(LedgerError::InvalidProof)
        ));
        assert_eq!(receiver.chain().len(), 2);
    }

    #[test]
    fn resolve_adopts_only_strictly_longer_valid_chains() {
        let wallet = Wallet::create().expect("keygen");
        let mut remote = funded_ledger(&wallet);
        remote.mine_block(8.0).expect("block 2");
        remote.mine_block(9.0).expect("block 3");

        let mut local = funded_ledger(&wallet);
        let pending = signed_transaction(&wallet, "bob", 1.0);
        local.admit_transaction(pending).expect("admitted");
        local.flag_conflict();

        let replaced = local.resolve_with(vec![remote.chain().to_vec()]);

        assert!(replaced);
        assert_eq!(local.chain().len(), 4);
        assert!(local.pending().is_empty());
        assert!(!local.needs_resolution());
    }

    #[test]
    fn resolve_without_longer_chains_keeps_state_intact() {
        let wallet = Wallet::create().expect("keygen");
        let mut ledger = funded_ledger(&wallet);
        let pending = signed_transaction(&wallet, "bob", 1.0);
        ledger.admit_transaction(pending.clone()).expect("admitted");

        // Same length: not adopted.
        let same_length = ledger.chain().to_vec();
        let replaced = ledger.resolve_with(vec![same_length]);

        assert!(!replaced);
        assert_eq!(ledger.pending(), &[pending]);
        assert_eq!(ledger.chain().len(), 2);
    }

    #[test]
    fn resolve_rejects_longer_but_invalid_chains() {
        let wallet = Wallet::create().expect("keygen");
        let mut remote = funded_ledger(&wallet);
        remote.mine_block(10.0).expect("block 2");

        let mut forged = remote.chain().to_vec();
        forged[2].proof = (0..)
            .find(|p| {
                !validation::valid_proof(
                    forged[2].user_transactions(),
                    &forged[2].previous_hash,
                    *p,
                )
            })
            .expect("an invalid proof exists");

        let mut local = funded_ledger(&wallet);
        assert!(!local.resolve_with(vec![forged]));
        assert_eq!(local.chain().len(), 2);
    }

    #[test]
    fn peer_set_has_set_semantics() {
        let mut ledger = Ledger::new(None);
        assert!(ledger.add_peer_node("localhost:5001"));
        assert!(!ledger.add_peer_node("localhost:5001"));
        assert!(ledger.add_peer_node("localhost:5002"));
        assert_eq!(
            ledger.peer_nodes(),
            vec!["localhost:5001".to_owned(), "localhost:5002".to_owned()]
        );

        assert!(ledger.remove_peer_node("localhost:5001"));
        assert!(!ledger.remove_peer_node("localhost:5001"));
        assert_eq!(ledger.peer_nodes(), vec!["localhost:5002".to_owned()]);
    }

    #[test]
    fn snapshot_roundtrips_through_from_state() {
        let wallet = Wallet::create().expect("keygen");
        let mut ledger = funded_ledger(&wallet);
        ledger.add_peer_node("localhost:5001");
        let tx = signed_transaction(&wallet, "bob", 1.0);
        ledger.admit_transaction(tx).expect("admitted");

        let snapshot = ledger.snapshot();
        let restored = Ledger::from_state(snapshot.clone(), ledger.hosting_node().map(str::to_owned));

        assert_eq!(restored.chain(), ledger.chain());
        assert_eq!(restored.pending(), ledger.pending());
        assert_eq!(restored.peer_nodes(), ledger.peer_nodes());
        assert_eq!(restored.snapshot(), snapshot);
    }
}
