//! Core ledger components
//!
//! This module contains the fundamental building blocks:
//! - Canonical encoding for hashing and signing
//! - Transactions (account-balance model, secp256k1 signatures)
//! - Blocks (with proof of work)
//! - Transaction and block validation
//! - The ledger (chain + pending set)
//! - Consensus resolution between competing chains

pub mod block;
pub mod codec;
pub mod consensus;
pub mod ledger;
pub mod state;
pub mod transaction;
pub mod validator;

pub use block::{Block, BlockError, GENESIS_PREVIOUS_HASH, GENESIS_TIMESTAMP};
pub use codec::{Canonical, CanonicalWriter};
pub use consensus::{resolve, ConsensusError, Resolution};
pub use ledger::{ChainStats, Ledger};
pub use state::LedgerState;
pub use transaction::{Transaction, TransactionError, COINBASE_SENDER};
pub use validator::{validate_chain, verify_block, verify_transaction, ChainError};
