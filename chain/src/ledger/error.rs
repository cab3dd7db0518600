use std::fmt;

/// Reasons the ledger rejects a transaction or block.
///
/// These are permanent rejections: retrying the same input cannot
/// succeed.
#[derive(Debug)]
pub enum LedgerError {
    /// The operation requires a hosting wallet and none is bound.
    WalletMissing,
    /// A transaction signature did not verify against its sender key.
    InvalidSignature,
    /// The sender cannot cover the transferred amount.
    InsufficientFunds {
        participant: String,
        balance: f64,
        amount: f64,
    },
    /// A block's proof-of-work does not solve the puzzle.
    InvalidProof,
    /// A block's `previous_hash` does not match the local tip.
    TipMismatch,
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::WalletMissing => write!(f, "no hosting wallet is bound to this node"),
            LedgerError::InvalidSignature => write!(f, "transaction signature did not verify"),
            LedgerError::InsufficientFunds {
                participant,
                balance,
                amount,
            } => write!(
                f,
                "insufficient funds for {participant}: balance {balance:.2}, amount {amount:.2}"
            ),
            LedgerError::InvalidProof => write!(f, "block proof of work is invalid"),
            LedgerError::TipMismatch => {
                write!(f, "block previous hash does not match the local tip")
            }
        }
    }
}

impl std::error::Error for LedgerError {}
