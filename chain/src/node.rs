// chain/src/node.rs

//! Node facade: binds a wallet identity to the ledger, the state store,
//! and the gossip client.
//!
//! This is the surface the HTTP adapter consumes. All ledger state lives
//! behind a single mutex; every public operation locks, mutates, persists
//! a snapshot, and releases the lock BEFORE any outbound peer I/O. The
//! peer set is snapshotted under the lock for exactly that reason.
//!
//! Persistence failures are logged and swallowed: the in-memory mutation
//! already happened and a flaky disk must not take the node down.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::NodeConfig;
use crate::gossip::{BroadcastAck, PeerClient};
use crate::ledger::{Ledger, LedgerError};
use crate::storage::{StateStore, StorageError};
use crate::types::{Block, Transaction};
use crate::wallet::{Wallet, WalletError};

/// How an incoming peer block was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockIngest {
    /// The block extended the local chain.
    Appended,
    /// The peer is ahead of us; the conflict flag was raised.
    Behind,
    /// Proof or hash linkage failed.
    Invalid,
    /// The block is older than our tip: the peer's chain is shorter.
    Stale,
}

/// Errors surfaced by node operations.
#[derive(Debug)]
pub enum NodeError {
    /// The operation requires a wallet and none exists.
    WalletMissing,
    /// Mining is blocked until conflicts are resolved.
    ConflictPending,
    /// A peer actively declined a locally originated transaction.
    PeerRejected { peer: String },
    Wallet(WalletError),
    Ledger(LedgerError),
    Storage(StorageError),
}

impl fmt::Display for NodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeError::WalletMissing => write!(f, "no wallet is set up on this node"),
            NodeError::ConflictPending => {
                write!(f, "chain conflicts must be resolved before mining")
            }
            NodeError::PeerRejected { peer } => {
                write!(f, "peer {peer} declined the transaction")
            }
            NodeError::Wallet(e) => write!(f, "{e}"),
            NodeError::Ledger(e) => write!(f, "{e}"),
            NodeError::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for NodeError {}

impl From<WalletError> for NodeError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::Missing => NodeError::WalletMissing,
            other => NodeError::Wallet(other),
        }
    }
}

impl From<LedgerError> for NodeError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::WalletMissing => NodeError::WalletMissing,
            other => NodeError::Ledger(other),
        }
    }
}

impl From<StorageError> for NodeError {
    fn from(e: StorageError) -> Self {
        NodeError::Storage(e)
    }
}

/// Key material and funds of the hosting wallet, as reported to clients.
#[derive(Clone, Debug)]
pub struct WalletSummary {
    pub public_key: String,
    pub private_key: String,
    pub funds: f64,
}

struct NodeInner {
    wallet: Wallet,
    ledger: Ledger,
}

/// A running node: wallet + ledger behind one lock, plus storage and
/// gossip collaborators.
///
/// Generic over the storage backend `S` and the gossip client `P` so
/// tests can run against in-memory stores and scripted peers.
pub struct Node<S, P> {
    config: NodeConfig,
    store: S,
    gossip: P,
    inner: Mutex<NodeInner>,
}

impl<S, P> Node<S, P>
where
    S: StateStore,
    P: PeerClient,
{
    /// Opens a node: loads wallet keys (absent is fine) and the persisted
    /// state (a missing state file yields a fresh genesis chain).
    pub fn open(config: NodeConfig, store: S, gossip: P) -> Result<Self, NodeError> {
        let wallet = Wallet::load(&config.wallet_file())?;
        let state = store.load()?.unwrap_or_default();
        let ledger = Ledger::from_state(state, wallet.public_key().map(str::to_owned));
        Ok(Self {
            config,
            store,
            gossip,
            inner: Mutex::new(NodeInner { wallet, ledger }),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, NodeInner> {
        // Recover the guard if a handler panicked mid-operation; ledger
        // operations never leave partial mutations behind.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, inner: &NodeInner) {
        if let Err(e) = self.store.save(&inner.ledger.snapshot()) {
            tracing::warn!("failed to persist node state: {e}");
        }
    }

    fn summary(inner: &NodeInner) -> Result<WalletSummary, NodeError> {
        let public_key = inner
            .wallet
            .public_key()
            .ok_or(NodeError::WalletMissing)?
            .to_owned();
        let private_key = inner
            .wallet
            .private_key()
            .ok_or(NodeError::WalletMissing)?
            .to_owned();
        let funds = inner.ledger.balance().ok_or(NodeError::WalletMissing)?;
        Ok(WalletSummary {
            public_key,
            private_key,
            funds,
        })
    }

    /// Generates a fresh key pair, saves it, and rebinds the ledger to
    /// the new identity.
    pub fn create_wallet(&self) -> Result<WalletSummary, NodeError> {
        let wallet = Wallet::create()?;
        wallet.save(&self.config.wallet_file())?;

        let mut inner = self.lock();
        inner.wallet = wallet;
        let identity = inner.wallet.public_key().map(str::to_owned);
        inner.ledger.bind_identity(identity);
        Self::summary(&inner)
    }

    /// Loads the key pair from the wallet file and rebinds the ledger.
    ///
    /// A missing wallet file surfaces as [`NodeError::WalletMissing`].
    pub fn load_wallet(&self) -> Result<WalletSummary, NodeError> {
        let wallet = Wallet::load(&self.config.wallet_file())?;
        if !wallet.has_keys() {
            return Err(NodeError::WalletMissing);
        }

        let mut inner = self.lock();
        inner.wallet = wallet;
        let identity = inner.wallet.public_key().map(str::to_owned);
        inner.ledger.bind_identity(identity);
        Self::summary(&inner)
    }

    pub fn has_wallet(&self) -> bool {
        self.lock().wallet.has_keys()
    }

    /// Balance of the hosting wallet; `None` when no wallet exists.
    pub fn balance(&self) -> Option<f64> {
        self.lock().ledger.balance()
    }

    /// Balance of an arbitrary participant.
    pub fn balance_of(&self, participant: &str) -> f64 {
        self.lock().ledger.balance_of(participant)
    }

    /// A copy of the full chain.
    pub fn chain(&self) -> Vec<Block> {
        self.lock().ledger.chain().to_vec()
    }

    /// A copy of the pending pool.
    pub fn open_transactions(&self) -> Vec<Transaction> {
        self.lock().ledger.pending().to_vec()
    }

    /// Whether a peer flagged our chain as divergent.
    pub fn needs_resolution(&self) -> bool {
        self.lock().ledger.needs_resolution()
    }

    /// Signs and admits a locally originated transaction, then broadcasts
    /// it to every peer.
    ///
    /// Unreachable peers are skipped. A peer that actively declines the
    /// transaction stops the broadcast and surfaces
    /// [`NodeError::PeerRejected`]; the locally admitted transaction stays
    /// in the pending pool either way.
    pub fn submit_transaction(
        &self,
        recipient: &str,
        amount: f64,
    ) -> Result<Transaction, NodeError> {
        let (tx, peers) = {
            let mut inner = self.lock();
            let sender = inner
                .wallet
                .public_key()
                .ok_or(NodeError::WalletMissing)?
                .to_owned();
            let signature = inner.wallet.sign_transaction(&sender, recipient, amount)?;
            let tx = Transaction::new(sender, recipient, amount, signature);
            inner.ledger.admit_transaction(tx.clone())?;
            self.persist(&inner);
            (tx, inner.ledger.peer_nodes())
        };

        for peer in peers {
            match self.gossip.send_transaction(&peer, &tx) {
                Ok(BroadcastAck::Rejected) => {
                    tracing::warn!(peer = %peer, "transaction declined by peer");
                    return Err(NodeError::PeerRejected { peer });
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(peer = %peer, "skipping unreachable peer: {e}");
                }
            }
        }
        Ok(tx)
    }

    /// Admits a transaction broadcast by a peer. No re-broadcast.
    pub fn receive_transaction(&self, tx: Transaction) -> Result<(), NodeError> {
        let mut inner = self.lock();
        inner.ledger.admit_transaction(tx)?;
        self.persist(&inner);
        Ok(())
    }

    /// Mines the next block and broadcasts it to every peer.
    ///
    /// Refused while the conflict flag is set. A 409 from any peer raises
    /// the conflict flag; declines and unreachable peers are logged and
    /// skipped.
    pub fn mine(&self) -> Result<Block, NodeError> {
        let (block, peers) = {
            let mut inner = self.lock();
            if inner.ledger.needs_resolution() {
                return Err(NodeError::ConflictPending);
            }
            let block = inner.ledger.mine_block(unix_timestamp())?;
            self.persist(&inner);
            (block, inner.ledger.peer_nodes())
        };

        for peer in peers {
            match self.gossip.send_block(&peer, &block) {
                Ok(BroadcastAck::Conflict) => {
                    tracing::info!(peer = %peer, "peer reports a diverging chain");
                    self.lock().ledger.flag_conflict();
                }
                Ok(BroadcastAck::Rejected) => {
                    tracing::warn!(peer = %peer, "mined block declined by peer");
                }
                Ok(BroadcastAck::Accepted) => {}
                Err(e) => {
                    tracing::debug!(peer = %peer, "skipping unreachable peer: {e}");
                }
            }
        }
        Ok(block)
    }

    /// Handles a block broadcast by a peer.
    ///
    /// Blocks that extend the tip are validated and appended. A block
    /// further ahead raises the conflict flag (we are behind). Anything
    /// older is stale. Rejecting a peer's block never raises OUR flag;
    /// the peer learns about the divergence from the 409 we send.
    pub fn receive_block(&self, block: Block) -> BlockIngest {
        let mut inner = self.lock();
        let tip_index = inner.ledger.last_block().index;

        if block.index == tip_index + 1 {
            match inner.ledger.receive_block(block) {
                Ok(()) => {
                    self.persist(&inner);
                    BlockIngest::Appended
                }
                Err(e) => {
                    tracing::warn!("rejected peer block: {e}");
                    BlockIngest::Invalid
                }
            }
        } else if block.index > tip_index {
            inner.ledger.flag_conflict();
            BlockIngest::Behind
        } else {
            BlockIngest::Stale
        }
    }

    /// Fetches every peer's chain and adopts the longest valid one.
    ///
    /// Returns whether the local chain was replaced. Unreachable peers
    /// are skipped; the conflict flag is cleared regardless of outcome.
    pub fn resolve(&self) -> bool {
        let peers = self.lock().ledger.peer_nodes();

        let mut candidates = Vec::new();
        for peer in peers {
            match self.gossip.fetch_chain(&peer) {
                Ok(chain) => candidates.push(chain),
                Err(e) => {
                    tracing::debug!(peer = %peer, "could not fetch chain: {e}");
                }
            }
        }

        let mut inner = self.lock();
        let replaced = inner.ledger.resolve_with(candidates);
        self.persist(&inner);
        replaced
    }

    /// Adds a peer endpoint and returns the updated peer list.
    pub fn add_peer_node(&self, peer: &str) -> Vec<String> {
        let mut inner = self.lock();
        inner.ledger.add_peer_node(peer);
        self.persist(&inner);
        inner.ledger.peer_nodes()
    }

    /// Removes a peer endpoint and returns the updated peer list.
    pub fn remove_peer_node(&self, peer: &str) -> Vec<String> {
        let mut inner = self.lock();
        inner.ledger.remove_peer_node(peer);
        self.persist(&inner);
        inner.ledger.peer_nodes()
    }

    /// All known peer endpoints.
    pub fn peer_nodes(&self) -> Vec<String> {
        self.lock().ledger.peer_nodes()
    }
}

/// Returns the current wall-clock time as seconds since Unix epoch.
///
/// On error (system clock before epoch) this falls back to 0.
fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
