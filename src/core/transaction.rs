//! Transaction handling for the ledger
//!
//! Implements an account-balance transaction model: a transaction moves an
//! integer amount from the sender's public key to the recipient's public key
//! and is authorised by an ECDSA signature over its canonical payload.
//! Coinbase transactions mint the block reward and carry no signature.

use crate::core::codec::{Canonical, CanonicalWriter};
use crate::crypto::{public_key_from_hex, sha256_hex, verify_signature, KeyPair};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sender sentinel marking a coinbase (reward) transaction
pub const COINBASE_SENDER: &str = "COINBASE";

/// Compact ECDSA signature length in bytes
pub const SIGNATURE_LEN: usize = 64;

/// Transaction-related errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Insufficient funds: available {available}, required {required}")]
    InsufficientFunds { available: u64, required: u64 },
    #[error("Invalid coinbase: {0}")]
    InvalidCoinbase(String),
}

/// A ledger transaction (wire shape: sender, recipient, amount, signature)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Hex compressed public key of the payer, or [`COINBASE_SENDER`]
    pub sender: String,
    /// Hex compressed public key of the payee
    pub recipient: String,
    /// Amount in the smallest unit
    pub amount: u64,
    /// Hex compact ECDSA signature; empty for coinbase
    #[serde(default)]
    pub signature: String,
}

impl Transaction {
    /// Create a payment signed by `key_pair`.
    ///
    /// Fails if the result would not be well formed (zero amount, recipient
    /// that is not a public key).
    pub fn new_signed(
        key_pair: &KeyPair,
        recipient: &str,
        amount: u64,
    ) -> Result<Self, TransactionError> {
        let mut tx = Self {
            sender: key_pair.address(),
            recipient: recipient.to_string(),
            amount,
            signature: String::new(),
        };
        tx.sign(key_pair);
        tx.check_well_formed()?;
        Ok(tx)
    }

    /// Create a coinbase (mining reward) transaction
    pub fn coinbase(recipient: &str, amount: u64) -> Self {
        Self {
            sender: COINBASE_SENDER.to_string(),
            recipient: recipient.to_string(),
            amount,
            signature: String::new(),
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.sender == COINBASE_SENDER
    }

    /// Canonical bytes covered by the signature: {sender, recipient, amount}
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut writer = CanonicalWriter::with_capacity(160);
        self.encode_payload(&mut writer);
        writer.into_bytes()
    }

    fn encode_payload(&self, writer: &mut CanonicalWriter) {
        writer
            .put_str(&self.sender)
            .put_str(&self.recipient)
            .put_u64(self.amount);
    }

    /// Transaction id: hex SHA-256 of the full canonical encoding
    pub fn id(&self) -> String {
        sha256_hex(&self.canonical_bytes())
    }

    /// Sign the payload, replacing any previous signature
    pub fn sign(&mut self, key_pair: &KeyPair) {
        self.signature = hex::encode(key_pair.sign(&self.signing_payload()));
    }

    /// Stateless shape checks: amount, key encodings, sentinel misuse
    pub fn check_well_formed(&self) -> Result<(), TransactionError> {
        if self.amount == 0 {
            return Err(TransactionError::MalformedTransaction(
                "amount must be positive".to_string(),
            ));
        }

        public_key_from_hex(&self.recipient).map_err(|_| {
            TransactionError::MalformedTransaction(format!(
                "recipient is not a public key: {:?}",
                self.recipient
            ))
        })?;

        if self.is_coinbase() {
            return Ok(());
        }

        public_key_from_hex(&self.sender).map_err(|_| {
            TransactionError::MalformedTransaction(format!(
                "sender is not a public key: {:?}",
                self.sender
            ))
        })?;

        if self.signature.is_empty() {
            return Err(TransactionError::MalformedTransaction(
                "missing signature".to_string(),
            ));
        }

        // The id hashes the signature text, so only one spelling may verify
        let canonical = hex::decode(&self.signature)
            .ok()
            .filter(|bytes| bytes.len() == SIGNATURE_LEN)
            .map(hex::encode);
        if canonical.as_deref() != Some(self.signature.as_str()) {
            return Err(TransactionError::MalformedTransaction(format!(
                "signature must be {} bytes of lowercase hex",
                SIGNATURE_LEN
            )));
        }

        Ok(())
    }

    /// Verify the signature under the sender's public key
    pub fn verify_signature(&self) -> Result<(), TransactionError> {
        let public_key = public_key_from_hex(&self.sender).map_err(|_| {
            TransactionError::MalformedTransaction("sender is not a public key".to_string())
        })?;
        let signature =
            hex::decode(&self.signature).map_err(|_| TransactionError::InvalidSignature)?;

        match verify_signature(&public_key, &self.signing_payload(), &signature) {
            Ok(true) => Ok(()),
            Ok(false) | Err(_) => Err(TransactionError::InvalidSignature),
        }
    }
}

impl Canonical for Transaction {
    fn encode_into(&self, writer: &mut CanonicalWriter) {
        self.encode_payload(writer);
        writer.put_str(&self.signature);
    }
}
