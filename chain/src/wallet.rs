// chain/src/wallet.rs

//! RSA wallet: key generation, per-port key files, and transaction
//! signatures.
//!
//! A wallet is a 1024-bit RSA key pair. Both halves are carried as
//! hex-encoded PKCS#1 DER so they can live in JSON bodies and flat text
//! files. The public key doubles as the node's on-chain identity.
//!
//! Signatures are PKCS#1 v1.5 over the SHA-256 digest of
//! [`Transaction::signing_payload`]. Every cryptographic failure
//! (malformed key, malformed signature, digest mismatch) surfaces as
//! `false` or an error value, never a panic.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use rsa::pkcs1::{
    DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey,
};
use rsa::{Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::types::Transaction;

/// RSA modulus size used for wallet key pairs.
pub const RSA_KEY_BITS: usize = 1024;

/// Errors from wallet operations.
#[derive(Debug)]
pub enum WalletError {
    /// Key generation failed.
    KeyGeneration(String),
    /// A stored or supplied key could not be decoded.
    MalformedKey,
    /// Signing was requested for a sender other than this wallet's key.
    ForeignSender,
    /// Producing the signature failed.
    Signing(String),
    /// The operation requires keys but the wallet is absent.
    Missing,
    /// Reading or writing the key file failed.
    Io(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::KeyGeneration(msg) => write!(f, "key generation failed: {msg}"),
            WalletError::MalformedKey => write!(f, "malformed wallet key"),
            WalletError::ForeignSender => {
                write!(f, "sender does not match this wallet's public key")
            }
            WalletError::Signing(msg) => write!(f, "signing failed: {msg}"),
            WalletError::Missing => write!(f, "no wallet keys available"),
            WalletError::Io(msg) => write!(f, "wallet file error: {msg}"),
        }
    }
}

impl std::error::Error for WalletError {}

/// A decoded key pair plus its hex-DER representations.
struct KeyPair {
    public_key: String,
    private_key: String,
    signing_key: RsaPrivateKey,
}

/// The node's key pair; `absent` before first creation or load.
pub struct Wallet {
    keys: Option<KeyPair>,
}

impl Wallet {
    /// Returns a wallet with no keys.
    pub fn absent() -> Self {
        Self { keys: None }
    }

    /// Generates a fresh [`RSA_KEY_BITS`]-bit key pair.
    pub fn create() -> Result<Self, WalletError> {
        let mut rng = rand::thread_rng();
        let signing_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
            .map_err(|e| WalletError::KeyGeneration(e.to_string()))?;
        let public = RsaPublicKey::from(&signing_key);

        let private_der = signing_key
            .to_pkcs1_der()
            .map_err(|e| WalletError::KeyGeneration(e.to_string()))?;
        let public_der = public
            .to_pkcs1_der()
            .map_err(|e| WalletError::KeyGeneration(e.to_string()))?;

        Ok(Self {
            keys: Some(KeyPair {
                public_key: hex::encode(public_der.as_bytes()),
                private_key: hex::encode(private_der.as_bytes()),
                signing_key,
            }),
        })
    }

    /// Rebuilds a wallet from hex-encoded DER key halves.
    pub fn from_hex(public_key: &str, private_key: &str) -> Result<Self, WalletError> {
        let der = hex::decode(private_key).map_err(|_| WalletError::MalformedKey)?;
        let signing_key =
            RsaPrivateKey::from_pkcs1_der(&der).map_err(|_| WalletError::MalformedKey)?;
        Ok(Self {
            keys: Some(KeyPair {
                public_key: public_key.to_owned(),
                private_key: private_key.to_owned(),
                signing_key,
            }),
        })
    }

    /// Loads the wallet from its key file.
    ///
    /// A missing file is the expected "no wallet yet" condition and yields
    /// an absent wallet, not an error. The file holds the public key on
    /// line 1 and the private key on line 2.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::absent()),
            Err(e) => return Err(WalletError::Io(e.to_string())),
        };
        let mut lines = content.lines();
        let public_key = lines.next().ok_or(WalletError::MalformedKey)?;
        let private_key = lines.next().ok_or(WalletError::MalformedKey)?;
        Self::from_hex(public_key, private_key)
    }

    /// Writes the key file: public key on line 1, private key on line 2.
    pub fn save(&self, path: &Path) -> Result<(), WalletError> {
        let keys = self.keys.as_ref().ok_or(WalletError::Missing)?;
        fs::write(path, format!("{}\n{}\n", keys.public_key, keys.private_key))
            .map_err(|e| WalletError::Io(e.to_string()))
    }

    /// Returns `true` once keys are present.
    pub fn has_keys(&self) -> bool {
        self.keys.is_some()
    }

    /// The hex-DER public key, if present. This is the node's identity.
    pub fn public_key(&self) -> Option<&str> {
        self.keys.as_ref().map(|k| k.public_key.as_str())
    }

    /// The hex-DER private key, if present.
    pub fn private_key(&self) -> Option<&str> {
        self.keys.as_ref().map(|k| k.private_key.as_str())
    }

    /// Signs `(sender, recipient, amount)` and returns the hex signature.
    ///
    /// `sender` must equal this wallet's own public key; signing on behalf
    /// of another identity is refused.
    pub fn sign_transaction(
        &self,
        sender: &str,
        recipient: &str,
        amount: f64,
    ) -> Result<String, WalletError> {
        let keys = self.keys.as_ref().ok_or(WalletError::Missing)?;
        if sender != keys.public_key {
            return Err(WalletError::ForeignSender);
        }
        let digest = Sha256::digest(format!("{sender}{recipient}{amount}").as_bytes());
        let signature = keys
            .signing_key
            .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
            .map_err(|e| WalletError::Signing(e.to_string()))?;
        Ok(hex::encode(signature))
    }

    /// Verifies a transaction's signature against its `sender` key.
    ///
    /// Coinbase transactions pass by rule. Anything that fails to decode
    /// or verify yields `false`.
    pub fn verify_transaction(tx: &Transaction) -> bool {
        if tx.is_coinbase() {
            return true;
        }
        let Ok(der) = hex::decode(&tx.sender) else {
            return false;
        };
        let Ok(public) = RsaPublicKey::from_pkcs1_der(&der) else {
            return false;
        };
        let Ok(signature) = hex::decode(&tx.signature) else {
            return false;
        };
        let digest = Sha256::digest(tx.signing_payload().as_bytes());
        public
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
            .is_ok()
    }
}
