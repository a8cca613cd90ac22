//! Mining engine for the ledger
//!
//! The nonce search is pure computation over a snapshot of the tip and the
//! pending transactions. It never touches shared state, and it polls a
//! [`CancellationToken`] every `check_interval` attempts so a competing
//! block or a chain replacement can interrupt it promptly.

use crate::config::ChainConfig;
use crate::core::codec::CanonicalWriter;
use crate::core::{Block, Transaction};
use crate::crypto::{meets_difficulty, sha256};
use log::info;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Nonce attempts between two cancellation checks
pub const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// Mining statistics
#[derive(Debug, Clone)]
pub struct MiningStats {
    /// Number of hash attempts
    pub hash_attempts: u64,
    /// Time taken in milliseconds
    pub time_ms: u128,
    /// Hash rate (hashes per second)
    pub hash_rate: f64,
}

impl MiningStats {
    fn new(attempts: u64, start: Instant) -> Self {
        let elapsed = start.elapsed().as_millis();
        let hash_rate = if elapsed > 0 {
            (attempts as f64) / (elapsed as f64 / 1000.0)
        } else {
            attempts as f64
        };
        Self {
            hash_attempts: attempts,
            time_ms: elapsed,
            hash_rate,
        }
    }
}

/// Result of a nonce search
#[derive(Debug)]
pub enum MiningOutcome {
    /// A block meeting the difficulty target
    Found { block: Block, stats: MiningStats },
    /// The search was cancelled; nothing was produced
    Cancelled { stats: MiningStats },
}

impl MiningOutcome {
    pub fn into_block(self) -> Option<Block> {
        match self {
            MiningOutcome::Found { block, .. } => Some(block),
            MiningOutcome::Cancelled { .. } => None,
        }
    }
}

/// Miner for creating new blocks
#[derive(Debug, Clone)]
pub struct Miner {
    /// Miner's address for receiving rewards
    pub address: String,
    check_interval: u64,
}

impl Miner {
    /// Create a new miner
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            check_interval: CANCEL_CHECK_INTERVAL,
        }
    }

    /// Override how many attempts run between cancellation checks
    pub fn with_check_interval(mut self, interval: u64) -> Self {
        self.check_interval = interval.max(1);
        self
    }

    /// Unmined successor of `previous`: coinbase first, then `pending`
    /// in the order given
    pub fn build_candidate(
        &self,
        pending: &[Transaction],
        previous: &Block,
        mining_reward: u64,
    ) -> Block {
        let mut transactions = Vec::with_capacity(pending.len() + 1);
        transactions.push(Transaction::coinbase(&self.address, mining_reward));
        transactions.extend_from_slice(pending);

        Block::new(
            previous.index + 1,
            previous.hash.clone(),
            transactions,
            Block::next_timestamp(previous),
        )
    }

    /// Build a candidate on top of `previous` and search for a nonce
    pub fn mine(
        &self,
        pending: &[Transaction],
        previous: &Block,
        config: &ChainConfig,
        cancel: &CancellationToken,
    ) -> MiningOutcome {
        let block = self.build_candidate(pending, previous, config.mining_reward);

        info!(
            "Mining block {} with difficulty {} ({} transactions)...",
            block.index,
            config.difficulty,
            block.tx_count()
        );

        self.search(block, config.difficulty, cancel)
    }

    /// Iterate nonces from 0 upward until the hash meets `difficulty`
    pub fn search(
        &self,
        mut block: Block,
        difficulty: u32,
        cancel: &CancellationToken,
    ) -> MiningOutcome {
        let start = Instant::now();

        // Everything but the nonce is fixed for the whole search.
        let mut writer = CanonicalWriter::new();
        block.encode_prefix(&mut writer);
        let prefix_len = writer.len();

        let mut attempts = 0u64;
        for nonce in 0..=u64::MAX {
            if attempts % self.check_interval == 0 && cancel.is_cancelled() {
                let stats = MiningStats::new(attempts, start);
                info!(
                    "Mining of block {} cancelled after {} attempts",
                    block.index, attempts
                );
                return MiningOutcome::Cancelled { stats };
            }

            writer.truncate(prefix_len);
            writer.put_u64(nonce);
            let digest = sha256(writer.as_bytes());
            attempts += 1;

            if meets_difficulty(&digest, difficulty) {
                block.nonce = nonce;
                block.hash = hex::encode(digest);

                let stats = MiningStats::new(attempts, start);
                info!(
                    "Block {} mined in {}ms ({} attempts, {:.2} H/s)",
                    block.index, stats.time_ms, attempts, stats.hash_rate
                );
                return MiningOutcome::Found { block, stats };
            }
        }

        // nonce space exhausted
        MiningOutcome::Cancelled {
            stats: MiningStats::new(attempts, start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validator::verify_block;
    use crate::core::LedgerState;
    use crate::crypto::KeyPair;

    #[test]
    fn test_miner() {
        let wallet = KeyPair::generate();
        let genesis = Block::genesis();
        let miner = Miner::new(&wallet.address());

        let outcome = miner.mine(
            &[],
            &genesis,
            &ChainConfig::with_difficulty(2),
            &CancellationToken::new(),
        );

        match outcome {
            MiningOutcome::Found { block, stats } => {
                assert_eq!(block.index, 1);
                assert!(block.is_valid_pow(2));
                assert!(block.verify_hash());
                assert!(stats.hash_attempts > 0);
                assert_eq!(block.coinbase_tx().unwrap().recipient, wallet.address());
            }
            MiningOutcome::Cancelled { .. } => panic!("search was not cancelled"),
        }
    }

    #[test]
    fn test_difficulty_respected() {
        let wallet = KeyPair::generate();
        let genesis = Block::genesis();

        for difficulty in 1..=4 {
            let config = ChainConfig::with_difficulty(difficulty);
            let block = Miner::new(&wallet.address())
                .mine(&[], &genesis, &config, &CancellationToken::new())
                .into_block()
                .unwrap();

            assert!(block.hash.starts_with(&"0".repeat(difficulty as usize)));
            let state = LedgerState::from_blocks(&[genesis.clone()]);
            assert!(verify_block(&block, &genesis, &state, &config).is_ok());
        }
    }

    #[test]
    fn test_candidate_layout() {
        let alice = KeyPair::generate();
        let bob = KeyPair::generate();
        let genesis = Block::genesis();
        let first = Transaction::new_signed(&alice, &bob.address(), 1).unwrap();
        let second = Transaction::new_signed(&alice, &bob.address(), 2).unwrap();

        let block = Miner::new(&bob.address()).build_candidate(
            &[first.clone(), second.clone()],
            &genesis,
            50,
        );

        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, genesis.hash);
        assert!(block.transactions[0].is_coinbase());
        assert_eq!(block.transactions[0].amount, 50);
        assert_eq!(&block.transactions[1..], &[first, second]);
        assert!(block.timestamp >= genesis.timestamp);
    }

    #[test]
    fn test_cancelled_search_produces_nothing() {
        let wallet = KeyPair::generate();
        let genesis = Block::genesis();
        let cancel = CancellationToken::new();
        cancel.cancel();

        // 64 leading zeros is unreachable; only cancellation ends the search
        let outcome = Miner::new(&wallet.address()).with_check_interval(16).mine(
            &[],
            &genesis,
            &ChainConfig::with_difficulty(64),
            &cancel,
        );

        match outcome {
            MiningOutcome::Cancelled { stats } => assert_eq!(stats.hash_attempts, 0),
            MiningOutcome::Found { .. } => panic!("cancelled search produced a block"),
        }
    }

    #[test]
    fn test_cancellation_observed_mid_search() {
        let wallet = KeyPair::generate();
        let genesis = Block::genesis();
        let cancel = CancellationToken::new();

        let handle = {
            let cancel = cancel.clone();
            let address = wallet.address();
            std::thread::spawn(move || {
                Miner::new(&address).with_check_interval(64).mine(
                    &[],
                    &genesis,
                    &ChainConfig::with_difficulty(64),
                    &cancel,
                )
            })
        };

        std::thread::sleep(std::time::Duration::from_millis(50));
        cancel.cancel();

        match handle.join().unwrap() {
            MiningOutcome::Cancelled { stats } => assert_eq!(stats.hash_attempts % 64, 0),
            MiningOutcome::Found { .. } => panic!("cancelled search produced a block"),
        }
    }
}
