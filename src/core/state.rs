//! Ledger state replayed from blocks
//!
//! Balances and the set of confirmed transaction ids at some point of a
//! chain. Validators run against a `LedgerState` built strictly from the
//! blocks that precede the one under examination.

use crate::core::block::Block;
use crate::core::transaction::Transaction;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct LedgerState {
    balances: HashMap<String, u64>,
    confirmed: HashSet<String>,
}

impl LedgerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replay every transaction of `blocks` from the first to the last
    pub fn from_blocks(blocks: &[Block]) -> Self {
        let mut state = Self::new();
        for block in blocks {
            state.apply_block(block);
        }
        state
    }

    pub fn balance_of(&self, address: &str) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Whether a non-coinbase transaction with this id is already recorded
    pub fn contains(&self, tx_id: &str) -> bool {
        self.confirmed.contains(tx_id)
    }

    /// Credit the recipient, debit the sender unless this is a coinbase.
    ///
    /// Callers validate first; the saturating arithmetic only keeps an
    /// unvalidated replay from panicking.
    pub fn apply(&mut self, tx: &Transaction) {
        if !tx.is_coinbase() {
            let sender = self.balances.entry(tx.sender.clone()).or_insert(0);
            *sender = sender.saturating_sub(tx.amount);
            self.confirmed.insert(tx.id());
        }

        let recipient = self.balances.entry(tx.recipient.clone()).or_insert(0);
        *recipient = recipient.saturating_add(tx.amount);
    }

    pub fn apply_block(&mut self, block: &Block) {
        for tx in &block.transactions {
            self.apply(tx);
        }
    }

    /// Number of addresses that ever held a balance entry
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    /// Sum of all balances
    pub fn total_supply(&self) -> u64 {
        self.balances.values().sum()
    }
}
