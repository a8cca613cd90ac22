//! Ledger implementation
//!
//! The ledger owns the active chain and the pending transaction pool. Every
//! mutation is all-or-nothing: a rejected block or chain leaves both exactly
//! as they were.

use crate::config::{ChainConfig, ConfigError};
use crate::core::block::{Block, BlockError};
use crate::core::state::LedgerState;
use crate::core::transaction::Transaction;
use crate::core::validator::{validate_chain, verify_block, ChainError};
use crate::mining::{Mempool, MempoolError};
use log::info;

/// The ledger: active chain plus pending set
#[derive(Debug, Clone)]
pub struct Ledger {
    config: ChainConfig,
    /// The chain of blocks, never empty
    blocks: Vec<Block>,
    pending: Mempool,
}

impl Ledger {
    /// Create a ledger holding only the genesis block.
    ///
    /// Fails if `config` is outside the allowed difficulty or reward range.
    pub fn new(config: ChainConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::genesis_only(config))
    }

    fn genesis_only(config: ChainConfig) -> Self {
        let pending = Mempool::new(config.max_pending);
        Self {
            config,
            blocks: vec![Block::genesis()],
            pending,
        }
    }

    /// Rebuild a ledger from externally supplied blocks.
    ///
    /// The config must be in range, and the chain must start at this node's
    /// genesis and pass full validation.
    pub fn from_chain(config: ChainConfig, blocks: Vec<Block>) -> Result<Self, ChainError> {
        config.validate()?;
        let genesis = Block::genesis();
        match blocks.first() {
            None => return Err(ChainError::Empty),
            Some(first) if first.hash != genesis.hash => {
                return Err(ChainError::GenesisMismatch {
                    expected: genesis.hash,
                    found: first.hash.clone(),
                })
            }
            Some(_) => {}
        }

        validate_chain(&blocks, &config)?;

        let pending = Mempool::new(config.max_pending);
        Ok(Self {
            config,
            blocks,
            pending,
        })
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// The active chain, genesis first
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn genesis(&self) -> &Block {
        &self.blocks[0]
    }

    /// Get the latest block
    pub fn tip(&self) -> &Block {
        // `blocks` always holds at least the genesis block
        &self.blocks[self.blocks.len() - 1]
    }

    /// Number of blocks, genesis included
    pub fn length(&self) -> usize {
        self.blocks.len()
    }

    pub fn pending(&self) -> &Mempool {
        &self.pending
    }

    /// Balances and confirmed ids replayed from genesis to tip
    pub fn state(&self) -> LedgerState {
        LedgerState::from_blocks(&self.blocks)
    }

    /// Confirmed balance of `address`, replayed from genesis to tip
    pub fn balance_of(&self, address: &str) -> u64 {
        self.state().balance_of(address)
    }

    /// Append a block on top of the current tip.
    ///
    /// Pending transactions the block confirmed, or that it left unfundable,
    /// are dropped from the pool.
    pub fn append(&mut self, block: Block) -> Result<(), BlockError> {
        let mut state = self.state();
        verify_block(&block, self.tip(), &state, &self.config)?;

        state.apply_block(&block);
        info!(
            "Appended block {} ({} transactions) hash {}",
            block.index,
            block.tx_count(),
            block.hash
        );
        self.blocks.push(block);
        self.pending.readmit(&state, self.config.mining_reward);

        Ok(())
    }

    /// Validate and queue a transaction for the next block
    pub fn submit_transaction(&mut self, tx: Transaction) -> Result<String, MempoolError> {
        let state = self.state();
        self.pending.add(tx, &state, self.config.mining_reward)
    }

    /// Full re-walk from genesis
    pub fn is_valid(&self) -> Result<(), ChainError> {
        validate_chain(&self.blocks, &self.config).map(|_| ())
    }

    /// Swap in an already validated chain whose tip state is `state`
    pub(crate) fn replace_chain(&mut self, blocks: Vec<Block>, state: &LedgerState) {
        info!(
            "Replacing chain of length {} with chain of length {}",
            self.blocks.len(),
            blocks.len()
        );
        self.blocks = blocks;

        let dropped = self.pending.readmit(state, self.config.mining_reward);
        if dropped > 0 {
            info!("Dropped {} pending transactions after chain replacement", dropped);
        }
    }

    /// Get chain statistics
    pub fn stats(&self) -> ChainStats {
        let state = self.state();
        ChainStats {
            length: self.blocks.len(),
            total_transactions: self.blocks.iter().map(|b| b.tx_count()).sum(),
            pending_transactions: self.pending.len(),
            total_supply: state.total_supply(),
            accounts: state.account_count(),
            difficulty: self.config.difficulty,
            latest_hash: self.tip().hash.clone(),
        }
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::genesis_only(ChainConfig::default())
    }
}

/// Chain statistics
#[derive(Debug, Clone)]
pub struct ChainStats {
    pub length: usize,
    pub total_transactions: usize,
    pub pending_transactions: usize,
    pub total_supply: u64,
    pub accounts: usize,
    pub difficulty: u32,
    pub latest_hash: String,
}
