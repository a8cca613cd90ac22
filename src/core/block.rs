//! Block implementation for the ledger
//!
//! A block carries an ordered list of transactions (coinbase first), the
//! hash of its predecessor and the nonce that satisfies proof of work.

use crate::core::codec::{Canonical, CanonicalWriter};
use crate::core::transaction::{Transaction, TransactionError};
use crate::crypto::{hex_meets_difficulty, sha256_hex};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Previous-hash sentinel carried by the genesis block
pub const GENESIS_PREVIOUS_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";

/// Fixed genesis timestamp (ms since the Unix epoch), shared by every node
pub const GENESIS_TIMESTAMP: i64 = 1_700_000_000_000;

// =============================================================================
// Block Errors
// =============================================================================

/// Block validation errors
#[derive(Error, Debug)]
pub enum BlockError {
    #[error("Invalid block hash: stored {stored}, computed {computed}")]
    InvalidBlockHash { stored: String, computed: String },
    #[error("Invalid proof of work: hash {hash} has fewer than {difficulty} leading zeros")]
    InvalidProofOfWork { hash: String, difficulty: u32 },
    #[error("Invalid block linkage: {0}")]
    InvalidBlockLinkage(String),
    #[error("Invalid coinbase: {0}")]
    InvalidCoinbase(String),
    #[error("Duplicate transaction: {0}")]
    DuplicateTransaction(String),
    #[error("Invalid genesis block: {0}")]
    InvalidGenesis(String),
    #[error("Transaction {position} rejected: {source}")]
    Transaction {
        position: usize,
        #[source]
        source: TransactionError,
    },
}

/// A block in the chain (wire shape: index, transactions, timestamp,
/// previous_hash, nonce, hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block height, sequential from 0
    pub index: u64,
    /// Transactions; the coinbase is always first
    pub transactions: Vec<Transaction>,
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Hash of the previous block
    pub previous_hash: String,
    /// Nonce used for proof of work
    pub nonce: u64,
    /// Hash of the canonical encoding of every other field
    pub hash: String,
}

impl Block {
    /// Create a new block (unmined, nonce 0)
    pub fn new(
        index: u64,
        previous_hash: String,
        transactions: Vec<Transaction>,
        timestamp: i64,
    ) -> Self {
        let mut block = Self {
            index,
            transactions,
            timestamp,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    /// The genesis block: identical on every node, never mined
    pub fn genesis() -> Self {
        Self::new(
            0,
            GENESIS_PREVIOUS_HASH.to_string(),
            Vec::new(),
            GENESIS_TIMESTAMP,
        )
    }

    /// Timestamp for a successor of `previous`: now, but never earlier
    /// than the predecessor even if the local clock went backwards
    pub fn next_timestamp(previous: &Block) -> i64 {
        Utc::now().timestamp_millis().max(previous.timestamp)
    }

    /// Encode every field except the nonce and the hash
    pub fn encode_prefix(&self, writer: &mut CanonicalWriter) {
        writer
            .put_u64(self.index)
            .put_u32(self.transactions.len() as u32);
        for tx in &self.transactions {
            tx.encode_into(writer);
        }
        writer.put_i64(self.timestamp).put_str(&self.previous_hash);
    }

    /// Calculate the hash of the block
    pub fn calculate_hash(&self) -> String {
        sha256_hex(&self.canonical_bytes())
    }

    /// Verify the stored hash against the block contents
    pub fn verify_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }

    /// Check if the stored hash meets `difficulty`
    pub fn is_valid_pow(&self, difficulty: u32) -> bool {
        hex_meets_difficulty(&self.hash, difficulty)
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0
    }

    /// Get the coinbase transaction (first transaction)
    pub fn coinbase_tx(&self) -> Option<&Transaction> {
        self.transactions.first().filter(|tx| tx.is_coinbase())
    }

    /// Get the mining reward paid by this block
    pub fn mining_reward(&self) -> u64 {
        self.coinbase_tx().map(|tx| tx.amount).unwrap_or(0)
    }

    /// Get number of transactions in this block
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }
}

impl Canonical for Block {
    fn encode_into(&self, writer: &mut CanonicalWriter) {
        self.encode_prefix(writer);
        writer.put_u64(self.nonce);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_genesis_block() {
        let genesis = Block::genesis();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.nonce, 0);
        assert_eq!(genesis.previous_hash, GENESIS_PREVIOUS_HASH);
        assert!(genesis.transactions.is_empty());
        assert!(genesis.verify_hash());
        assert_eq!(genesis, Block::genesis());
    }

    #[test]
    fn test_hash_is_deterministic() {
        let miner = KeyPair::generate();
        let block = Block::new(
            1,
            Block::genesis().hash,
            vec![Transaction::coinbase(&miner.address(), 50)],
            GENESIS_TIMESTAMP + 1,
        );

        let copy: Block = serde_json::from_str(&serde_json::to_string(&block).unwrap()).unwrap();
        assert_eq!(block.calculate_hash(), copy.calculate_hash());
        assert_eq!(block.hash, copy.calculate_hash());
    }

    #[test]
    fn test_block_hash_verification() {
        let mut block = Block::genesis();
        assert!(block.verify_hash());

        // Tamper with nonce
        block.nonce += 1;
        assert!(!block.verify_hash());
    }

    #[test]
    fn test_every_field_feeds_the_hash() {
        let miner = KeyPair::generate();
        let base = Block::new(
            3,
            "ab".repeat(32),
            vec![Transaction::coinbase(&miner.address(), 50)],
            GENESIS_TIMESTAMP + 10,
        );

        let mut index = base.clone();
        index.index += 1;
        let mut timestamp = base.clone();
        timestamp.timestamp += 1;
        let mut previous = base.clone();
        previous.previous_hash = "cd".repeat(32);
        let mut amount = base.clone();
        amount.transactions[0].amount += 1;

        for tampered in [index, timestamp, previous, amount] {
            assert!(!tampered.verify_hash());
        }
    }

    #[test]
    fn test_coinbase_accessors() {
        let miner = KeyPair::generate();
        let block = Block::new(
            1,
            Block::genesis().hash,
            vec![Transaction::coinbase(&miner.address(), 50)],
            GENESIS_TIMESTAMP,
        );
        assert_eq!(block.mining_reward(), 50);
        assert_eq!(block.tx_count(), 1);
        assert_eq!(Block::genesis().mining_reward(), 0);
    }

    #[test]
    fn test_next_timestamp_never_regresses() {
        let mut previous = Block::genesis();
        previous.timestamp = i64::MAX;
        assert_eq!(Block::next_timestamp(&previous), i64::MAX);
    }
}
