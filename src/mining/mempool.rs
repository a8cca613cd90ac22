//! Transaction pool (mempool) for pending transactions
//!
//! Holds validated, unconfirmed transactions in arrival order. Admission is
//! cumulative: a new transaction is checked against the confirmed state with
//! every already-pending transaction applied, so the pool as a whole always
//! forms a valid block body on top of the current tip.

use crate::core::validator::verify_transaction;
use crate::core::{LedgerState, Transaction, TransactionError};
use std::collections::HashSet;
use thiserror::Error;

/// Mempool errors
#[derive(Error, Debug)]
pub enum MempoolError {
    #[error("Duplicate transaction: {0}")]
    DuplicateTransaction(String),
    #[error("Transaction rejected: {0}")]
    Rejected(#[from] TransactionError),
    #[error("Mempool full ({0} transactions)")]
    MempoolFull(usize),
}

/// Memory pool for pending transactions
#[derive(Debug, Clone)]
pub struct Mempool {
    /// Transactions in order of arrival
    entries: Vec<Transaction>,
    /// Ids of `entries`
    ids: HashSet<String>,
    /// Maximum pool size
    max_size: usize,
}

impl Mempool {
    /// Create a new mempool bounded to `max_size` transactions
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            ids: HashSet::new(),
            max_size,
        }
    }

    /// Confirmed state plus the effect of every pending transaction
    pub fn projected_state(&self, confirmed: &LedgerState) -> LedgerState {
        let mut state = confirmed.clone();
        for tx in &self.entries {
            state.apply(tx);
        }
        state
    }

    /// Validate and append a transaction, returning its id.
    ///
    /// On error the pool is left untouched.
    pub fn add(
        &mut self,
        tx: Transaction,
        confirmed: &LedgerState,
        mining_reward: u64,
    ) -> Result<String, MempoolError> {
        if self.entries.len() >= self.max_size {
            return Err(MempoolError::MempoolFull(self.max_size));
        }

        if tx.is_coinbase() {
            return Err(TransactionError::InvalidCoinbase(
                "coinbase transactions are created by miners only".to_string(),
            )
            .into());
        }

        let id = tx.id();
        if self.ids.contains(&id) || confirmed.contains(&id) {
            return Err(MempoolError::DuplicateTransaction(id));
        }

        verify_transaction(&tx, &self.projected_state(confirmed), mining_reward)?;

        self.ids.insert(id.clone());
        self.entries.push(tx);
        Ok(id)
    }

    /// Pending transactions in arrival order
    pub fn transactions(&self) -> &[Transaction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-admit every pending transaction against a new confirmed state,
    /// keeping arrival order. Entries the new state already confirms or can
    /// no longer fund are dropped; returns how many.
    pub fn readmit(&mut self, confirmed: &LedgerState, mining_reward: u64) -> usize {
        let previous = std::mem::take(&mut self.entries);
        self.ids.clear();

        let mut dropped = 0;
        for tx in previous {
            if let Err(e) = self.add(tx, confirmed, mining_reward) {
                log::debug!("Dropping pending transaction: {}", e);
                dropped += 1;
            }
        }
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn funded(address: &str, amount: u64) -> LedgerState {
        let mut state = LedgerState::new();
        state.apply(&Transaction::coinbase(address, amount));
        state
    }

    #[test]
    fn test_add_and_order() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let state = funded(&alice.address(), 50);
        let mut pool = Mempool::new(10);

        let first = Transaction::new_signed(&alice, &bob.address(), 10).unwrap();
        let second = Transaction::new_signed(&alice, &bob.address(), 20).unwrap();
        pool.add(first.clone(), &state, 50).unwrap();
        pool.add(second.clone(), &state, 50).unwrap();

        assert_eq!(pool.transactions(), &[first, second]);
    }

    #[test]
    fn test_insufficient_funds_leaves_pool_unchanged() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let state = funded(&alice.address(), 10);
        let mut pool = Mempool::new(10);

        let tx = Transaction::new_signed(&alice, &bob.address(), 25).unwrap();
        let err = pool.add(tx, &state, 50).unwrap_err();

        assert!(matches!(
            err,
            MempoolError::Rejected(TransactionError::InsufficientFunds { .. })
        ));
        assert!(pool.is_empty());
    }

    #[test]
    fn test_cumulative_admission_prevents_overcommit() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let state = funded(&alice.address(), 50);
        let mut pool = Mempool::new(10);

        pool.add(Transaction::new_signed(&alice, &bob.address(), 30).unwrap(), &state, 50)
            .unwrap();
        let err = pool
            .add(Transaction::new_signed(&alice, &bob.address(), 30).unwrap(), &state, 50)
            .unwrap_err();

        assert!(matches!(
            err,
            MempoolError::Rejected(TransactionError::InsufficientFunds {
                available: 20,
                required: 30
            })
        ));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_rejects_duplicates_and_coinbase() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let state = funded(&alice.address(), 50);
        let mut pool = Mempool::new(10);

        let tx = Transaction::new_signed(&alice, &bob.address(), 5).unwrap();
        pool.add(tx.clone(), &state, 50).unwrap();
        assert!(matches!(
            pool.add(tx, &state, 50),
            Err(MempoolError::DuplicateTransaction(_))
        ));

        assert!(matches!(
            pool.add(Transaction::coinbase(&bob.address(), 50), &state, 50),
            Err(MempoolError::Rejected(TransactionError::InvalidCoinbase(_)))
        ));
    }

    #[test]
    fn test_pool_capacity() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let state = funded(&alice.address(), 50);
        let mut pool = Mempool::new(1);

        pool.add(Transaction::new_signed(&alice, &bob.address(), 1).unwrap(), &state, 50)
            .unwrap();
        assert!(matches!(
            pool.add(Transaction::new_signed(&alice, &bob.address(), 1).unwrap(), &state, 50),
            Err(MempoolError::MempoolFull(1))
        ));
    }

    #[test]
    fn test_readmit_after_tip_change() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let state = funded(&alice.address(), 50);
        let mut pool = Mempool::new(10);

        let a = Transaction::new_signed(&alice, &bob.address(), 20).unwrap();
        let b = Transaction::new_signed(&alice, &bob.address(), 20).unwrap();
        pool.add(a.clone(), &state, 50).unwrap();
        pool.add(b.clone(), &state, 50).unwrap();

        // a block confirmed `a`
        let mut confirmed = state.clone();
        confirmed.apply(&a);
        assert_eq!(pool.readmit(&confirmed, 50), 1);
        assert_eq!(pool.transactions(), &[b.clone()]);

        // alice lost her funds on a replacement chain: b no longer fits
        let dropped = pool.readmit(&funded(&alice.address(), 5), 50);
        assert_eq!(dropped, 1);
        assert!(pool.is_empty());
    }
}
