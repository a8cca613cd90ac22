//! PoW Ledger: the ledger-integrity core of a minimal proof-of-work currency
//!
//! This crate provides:
//! - A fixed canonical encoding for block hashing and transaction signing
//! - Account-balance transactions signed with ECDSA (secp256k1)
//! - Transaction and block validation with replay and double-spend protection
//! - Proof-of-work mining with cooperative cancellation
//! - Longest-valid-chain consensus between competing chains
//! - A `Node` facade that serializes chain access across tasks
//!
//! # Example
//!
//! ```rust
//! use pow_ledger::config::ChainConfig;
//! use pow_ledger::core::Ledger;
//! use pow_ledger::mining::Miner;
//! use pow_ledger::wallet::Wallet;
//! use tokio_util::sync::CancellationToken;
//!
//! let mut ledger = Ledger::new(ChainConfig::with_difficulty(2)).unwrap();
//! let wallet = Wallet::new();
//!
//! // Mine a block paying the wallet
//! let miner = Miner::new(&wallet.address());
//! let outcome = miner.mine(&[], ledger.tip(), ledger.config(), &CancellationToken::new());
//! let block = outcome.into_block().unwrap();
//! ledger.append(block).unwrap();
//!
//! assert_eq!(wallet.balance(&ledger), 50);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod crypto;
pub mod mining;
pub mod node;
pub mod storage;
pub mod wallet;

// Re-export commonly used types
pub use config::{ChainConfig, BLOCK_REWARD, DEFAULT_DIFFICULTY};
pub use core::{resolve, Block, Ledger, Resolution, Transaction};
pub use crypto::KeyPair;
pub use mining::{Mempool, Miner};
pub use node::{MineOutcome, Node, NodeError};
pub use storage::{load_chain, save_chain};
pub use wallet::Wallet;
