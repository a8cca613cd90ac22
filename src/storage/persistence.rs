//! Ledger persistence layer
//!
//! Chains are stored as pretty JSON. Writes go to a temporary file first and
//! are renamed into place; reads are never trusted and pass full validation
//! before a ledger is rebuilt from them.

use crate::config::ChainConfig;
use crate::core::{Block, ChainError, Ledger, Transaction};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid chain: {0}")]
    InvalidChain(#[from] ChainError),
}

/// On-disk form of a ledger: its config, blocks and pending set
#[derive(Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub config: ChainConfig,
    pub chain: Vec<Block>,
    #[serde(default)]
    pub pending_transactions: Vec<Transaction>,
}

impl LedgerSnapshot {
    pub fn of(ledger: &Ledger) -> Self {
        Self {
            config: ledger.config().clone(),
            chain: ledger.blocks().to_vec(),
            pending_transactions: ledger.pending().transactions().to_vec(),
        }
    }

    /// Validate the chain and re-admit the pending set against it.
    ///
    /// Pending entries that no longer pass admission are dropped.
    pub fn into_ledger(self) -> Result<Ledger, ChainError> {
        let mut ledger = Ledger::from_chain(self.config, self.chain)?;
        for tx in self.pending_transactions {
            if let Err(e) = ledger.submit_transaction(tx) {
                warn!("Dropping stored pending transaction: {}", e);
            }
        }
        Ok(ledger)
    }
}

/// Write `value` as pretty JSON, replacing `path` atomically
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let temp_path = temp_path_for(path);
    {
        let file = fs::File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
    }
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Save a bare chain (array of blocks), the form peers exchange
pub fn save_chain(path: &Path, blocks: &[Block]) -> Result<(), StorageError> {
    write_json_atomic(path, &blocks)?;
    info!("Saved chain of {} blocks to {}", blocks.len(), path.display());
    Ok(())
}

/// Load a bare chain. The blocks are not validated here.
pub fn load_chain(path: &Path) -> Result<Vec<Block>, StorageError> {
    let reader = BufReader::new(fs::File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Save a ledger with its config and pending transactions
pub fn save_ledger(path: &Path, ledger: &Ledger) -> Result<(), StorageError> {
    write_json_atomic(path, &LedgerSnapshot::of(ledger))?;
    info!(
        "Saved ledger of {} blocks ({} pending) to {}",
        ledger.length(),
        ledger.pending().len(),
        path.display()
    );
    Ok(())
}

/// Load and fully validate a ledger saved by [`save_ledger`]
pub fn load_ledger(path: &Path) -> Result<Ledger, StorageError> {
    let reader = BufReader::new(fs::File::open(path)?);
    let snapshot: LedgerSnapshot = serde_json::from_reader(reader)?;
    Ok(snapshot.into_ledger()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::mining::Miner;
    use tokio_util::sync::CancellationToken;

    fn mine(ledger: &mut Ledger, miner: &KeyPair) {
        let block = Miner::new(&miner.address())
            .mine(
                ledger.pending().transactions(),
                ledger.tip(),
                ledger.config(),
                &CancellationToken::new(),
            )
            .into_block()
            .unwrap();
        ledger.append(block).unwrap();
    }

    #[test]
    fn test_save_load_chain() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("chain.json");

        let mut ledger = Ledger::new(ChainConfig::with_difficulty(1)).unwrap();
        mine(&mut ledger, &KeyPair::generate());

        save_chain(&path, ledger.blocks()).unwrap();
        assert!(!temp_path_for(&path).exists());

        let loaded = load_chain(&path).unwrap();
        assert_eq!(loaded, ledger.blocks());
    }

    #[test]
    fn test_save_load_ledger_with_pending() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ledger.json");

        let m = KeyPair::generate();
        let n = KeyPair::generate();
        let mut ledger = Ledger::new(ChainConfig::with_difficulty(1)).unwrap();
        mine(&mut ledger, &m);
        ledger
            .submit_transaction(Transaction::new_signed(&m, &n.address(), 12).unwrap())
            .unwrap();

        save_ledger(&path, &ledger).unwrap();
        let loaded = load_ledger(&path).unwrap();

        assert_eq!(loaded.blocks(), ledger.blocks());
        assert_eq!(loaded.config(), ledger.config());
        assert_eq!(
            loaded.pending().transactions(),
            ledger.pending().transactions()
        );
        assert_eq!(loaded.balance_of(&m.address()), 50);
    }

    #[test]
    fn test_tampered_file_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ledger.json");

        let m = KeyPair::generate();
        let mut ledger = Ledger::new(ChainConfig::with_difficulty(1)).unwrap();
        mine(&mut ledger, &m);
        mine(&mut ledger, &m);

        let mut snapshot = LedgerSnapshot::of(&ledger);
        snapshot.chain[1].transactions[0].amount = 5_000;
        write_json_atomic(&path, &snapshot).unwrap();

        match load_ledger(&path) {
            Err(StorageError::InvalidChain(e)) => assert_eq!(e.first_invalid_index(), 1),
            other => panic!("expected invalid chain, got {:?}", other.map(|l| l.length())),
        }
    }

    #[test]
    fn test_snapshot_cannot_choose_its_own_rules() {
        use crate::config::ConfigError;

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("ledger.json");

        let mut ledger = Ledger::new(ChainConfig::with_difficulty(1)).unwrap();
        mine(&mut ledger, &KeyPair::generate());

        let mut snapshot = LedgerSnapshot::of(&ledger);
        snapshot.config.difficulty = 0;
        snapshot.config.mining_reward = 1_000_000_000;
        write_json_atomic(&path, &snapshot).unwrap();

        assert!(matches!(
            load_ledger(&path),
            Err(StorageError::InvalidChain(ChainError::InvalidConfig(
                ConfigError::InvalidDifficulty(0)
            )))
        ));
    }

    #[test]
    fn test_missing_and_garbled_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert!(matches!(load_chain(&missing), Err(StorageError::IoError(_))));

        let garbled = temp_dir.path().join("garbled.json");
        fs::write(&garbled, "{ not json").unwrap();
        assert!(matches!(
            load_chain(&garbled),
            Err(StorageError::SerializationError(_))
        ));
    }
}
