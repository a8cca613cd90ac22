//! In-memory wallet: one key pair, its address, and signed payments
//!
//! Nothing here touches disk; exporting the private key is the caller's job.

use crate::core::{Ledger, Transaction, TransactionError};
use crate::crypto::{KeyError, KeyPair};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// A labelled key pair that pays from its address
pub struct Wallet {
    key_pair: KeyPair,
    /// Display name, never part of any transaction
    pub label: Option<String>,
}

impl Wallet {
    /// Fresh random key pair, unlabelled
    pub fn new() -> Self {
        Self::from(KeyPair::generate())
    }

    pub fn with_label(label: &str) -> Self {
        let mut wallet = Self::new();
        wallet.label = Some(label.to_string());
        wallet
    }

    /// Restore a wallet from `private_key()` output
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, WalletError> {
        Ok(KeyPair::from_private_key_hex(private_key_hex)?.into())
    }

    /// The wallet's address (compressed public key hex)
    pub fn address(&self) -> String {
        self.key_pair.address()
    }

    /// Hex secret key; anyone holding it can spend from this address
    pub fn private_key(&self) -> String {
        self.key_pair.private_key_hex()
    }

    /// Confirmed balance on `ledger`
    pub fn balance(&self, ledger: &Ledger) -> u64 {
        ledger.balance_of(&self.address())
    }

    /// Balance left after the ledger's pending transactions settle
    pub fn spendable(&self, ledger: &Ledger) -> u64 {
        ledger
            .pending()
            .projected_state(&ledger.state())
            .balance_of(&self.address())
    }

    /// Sign a payment of `amount` to `recipient`
    pub fn pay(&self, recipient: &str, amount: u64) -> Result<Transaction, WalletError> {
        Ok(Transaction::new_signed(&self.key_pair, recipient, amount)?)
    }

    /// Sign a payment after checking it is fundable on `ledger`
    pub fn create_transaction(
        &self,
        recipient: &str,
        amount: u64,
        ledger: &Ledger,
    ) -> Result<Transaction, WalletError> {
        let have = self.spendable(ledger);
        if have < amount {
            return Err(WalletError::InsufficientFunds { have, need: amount });
        }
        self.pay(recipient, amount)
    }
}

impl From<KeyPair> for Wallet {
    fn from(key_pair: KeyPair) -> Self {
        Self {
            key_pair,
            label: None,
        }
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use crate::mining::Miner;
    use tokio_util::sync::CancellationToken;

    fn funded_ledger(wallet: &Wallet) -> Ledger {
        let mut ledger = Ledger::new(ChainConfig::with_difficulty(1)).unwrap();
        let block = Miner::new(&wallet.address())
            .mine(&[], ledger.tip(), ledger.config(), &CancellationToken::new())
            .into_block()
            .unwrap();
        ledger.append(block).unwrap();
        ledger
    }

    #[test]
    fn test_wallet_creation() {
        let wallet = Wallet::with_label("alice");
        assert_eq!(wallet.address().len(), 66);
        assert_eq!(wallet.label.as_deref(), Some("alice"));
    }

    #[test]
    fn test_import_from_private_key() {
        let wallet = Wallet::new();
        let imported = Wallet::from_private_key(&wallet.private_key()).unwrap();
        assert_eq!(imported.address(), wallet.address());

        assert!(matches!(
            Wallet::from_private_key("not hex"),
            Err(WalletError::CryptoError(_))
        ));
    }

    #[test]
    fn test_pay_is_signed() {
        let wallet = Wallet::new();
        let tx = wallet.pay(&Wallet::new().address(), 7).unwrap();
        assert_eq!(tx.sender, wallet.address());
        assert!(tx.verify_signature().is_ok());
    }

    #[test]
    fn test_create_transaction_checks_spendable() {
        let alice = Wallet::new();
        let bob = Wallet::new();
        let mut ledger = funded_ledger(&alice);
        assert_eq!(alice.balance(&ledger), 50);

        let tx = alice.create_transaction(&bob.address(), 30, &ledger).unwrap();
        ledger.submit_transaction(tx).unwrap();
        assert_eq!(alice.spendable(&ledger), 20);

        assert!(matches!(
            alice.create_transaction(&bob.address(), 30, &ledger),
            Err(WalletError::InsufficientFunds { have: 20, need: 30 })
        ));
    }
}
