//! Storage module for ledger persistence

pub mod persistence;

pub use persistence::{
    load_chain, load_ledger, save_chain, save_ledger, LedgerSnapshot, StorageError,
};
