//! Wallet module for key and payment management

pub mod wallet;

pub use wallet::{Wallet, WalletError};
