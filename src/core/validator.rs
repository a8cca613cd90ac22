//! Transaction and block validation
//!
//! Both validators are pure functions of their inputs: the entity under
//! test, its predecessor, and the [`LedgerState`] replayed from everything
//! before it. They return the first violation found.

use crate::config::{ChainConfig, ConfigError};
use crate::core::block::{Block, BlockError, GENESIS_PREVIOUS_HASH};
use crate::core::state::LedgerState;
use crate::core::transaction::{Transaction, TransactionError};
use std::collections::HashSet;
use thiserror::Error;

/// Whole-chain validation errors
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Chain has no blocks")]
    Empty,
    #[error("Genesis mismatch: expected {expected}, found {found}")]
    GenesisMismatch { expected: String, found: String },
    #[error("Block {index} is invalid: {source}")]
    InvalidBlock {
        index: u64,
        #[source]
        source: BlockError,
    },
    #[error("Invalid chain configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl ChainError {
    /// Index of the first block that failed; genesis problems report 0
    pub fn first_invalid_index(&self) -> u64 {
        match self {
            ChainError::Empty
            | ChainError::GenesisMismatch { .. }
            | ChainError::InvalidConfig(_) => 0,
            ChainError::InvalidBlock { index, .. } => *index,
        }
    }
}

/// Transaction Validator.
///
/// Coinbase transactions must pay exactly `mining_reward`; their position in
/// the block is checked by [`verify_block`]. Everything else needs a valid
/// signature, a positive amount, and a sender balance in `state` covering
/// the amount.
pub fn verify_transaction(
    tx: &Transaction,
    state: &LedgerState,
    mining_reward: u64,
) -> Result<(), TransactionError> {
    if tx.is_coinbase() {
        if tx.amount != mining_reward {
            return Err(TransactionError::InvalidCoinbase(format!(
                "reward {} does not match {}",
                tx.amount, mining_reward
            )));
        }
        if !tx.signature.is_empty() {
            return Err(TransactionError::InvalidCoinbase(
                "coinbase must not be signed".to_string(),
            ));
        }
        return tx.check_well_formed();
    }

    tx.check_well_formed()?;
    tx.verify_signature()?;

    let available = state.balance_of(&tx.sender);
    if available < tx.amount {
        return Err(TransactionError::InsufficientFunds {
            available,
            required: tx.amount,
        });
    }

    Ok(())
}

/// Genesis checks: sentinel linkage, no transactions, untampered hash
pub fn verify_genesis(block: &Block) -> Result<(), BlockError> {
    if block.index != 0 {
        return Err(BlockError::InvalidGenesis(format!(
            "index is {}",
            block.index
        )));
    }
    if block.previous_hash != GENESIS_PREVIOUS_HASH {
        return Err(BlockError::InvalidGenesis(
            "previous hash is not the sentinel".to_string(),
        ));
    }
    if !block.transactions.is_empty() {
        return Err(BlockError::InvalidGenesis(
            "genesis carries transactions".to_string(),
        ));
    }
    if !block.verify_hash() {
        return Err(BlockError::InvalidGenesis("hash mismatch".to_string()));
    }
    Ok(())
}

/// Block Validator.
///
/// `state` must be replayed from the blocks strictly before `block`.
/// Transactions are checked in order; each one sees the effects of the
/// non-coinbase transactions before it in the same block, so a sender can
/// not spend the same funds twice inside one block. The block's own reward
/// only becomes spendable in later blocks.
pub fn verify_block(
    block: &Block,
    previous: &Block,
    state: &LedgerState,
    config: &ChainConfig,
) -> Result<(), BlockError> {
    let computed = block.calculate_hash();
    if block.hash != computed {
        return Err(BlockError::InvalidBlockHash {
            stored: block.hash.clone(),
            computed,
        });
    }

    if !block.is_valid_pow(config.difficulty) {
        return Err(BlockError::InvalidProofOfWork {
            hash: block.hash.clone(),
            difficulty: config.difficulty,
        });
    }

    if block.index != previous.index + 1 {
        return Err(BlockError::InvalidBlockLinkage(format!(
            "expected index {}, got {}",
            previous.index + 1,
            block.index
        )));
    }

    if block.previous_hash != previous.hash {
        return Err(BlockError::InvalidBlockLinkage(format!(
            "previous hash {} does not match {}",
            block.previous_hash, previous.hash
        )));
    }

    if block.timestamp < previous.timestamp {
        return Err(BlockError::InvalidBlockLinkage(format!(
            "timestamp {} precedes previous block timestamp {}",
            block.timestamp, previous.timestamp
        )));
    }

    if block.coinbase_tx().is_none() {
        return Err(BlockError::InvalidCoinbase(
            "first transaction must be a coinbase".to_string(),
        ));
    }
    if block.transactions.iter().skip(1).any(|tx| tx.is_coinbase()) {
        return Err(BlockError::InvalidCoinbase(
            "more than one coinbase in block".to_string(),
        ));
    }

    let mut working = state.clone();
    let mut seen = HashSet::new();

    for (position, tx) in block.transactions.iter().enumerate() {
        if !tx.is_coinbase() {
            let id = tx.id();
            if working.contains(&id) || !seen.insert(id.clone()) {
                return Err(BlockError::DuplicateTransaction(id));
            }
        }

        verify_transaction(tx, &working, config.mining_reward)
            .map_err(|source| BlockError::Transaction { position, source })?;

        if !tx.is_coinbase() {
            working.apply(tx);
        }
    }

    Ok(())
}

/// Walk a whole chain from genesis, returning the state at its tip
pub fn validate_chain(blocks: &[Block], config: &ChainConfig) -> Result<LedgerState, ChainError> {
    let genesis = blocks.first().ok_or(ChainError::Empty)?;
    verify_genesis(genesis).map_err(|source| ChainError::InvalidBlock { index: 0, source })?;

    let mut state = LedgerState::from_blocks(std::slice::from_ref(genesis));

    for (offset, pair) in blocks.windows(2).enumerate() {
        let (previous, block) = (&pair[0], &pair[1]);
        verify_block(block, previous, &state, config).map_err(|source| {
            ChainError::InvalidBlock {
                index: offset as u64 + 1,
                source,
            }
        })?;
        state.apply_block(block);
    }

    Ok(state)
}
