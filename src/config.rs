//! Chain configuration
//!
//! Difficulty and mining reward are fixed when a ledger is created and never
//! change for the lifetime of that chain.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default mining difficulty (number of leading zero hex characters)
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Block reward in the smallest unit
pub const BLOCK_REWARD: u64 = 50;

/// Default maximum pending transaction count
pub const DEFAULT_MEMPOOL_SIZE: usize = 10_000;

/// A SHA-256 digest renders as 64 hex characters
pub const MAX_DIFFICULTY: u32 = 64;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid difficulty {0}: must be between 1 and {}", MAX_DIFFICULTY)]
    InvalidDifficulty(u32),
    #[error("Invalid mining reward: must be positive")]
    InvalidReward,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Required leading zero hex characters in a block hash
    #[serde(default = "default_difficulty")]
    pub difficulty: u32,
    /// Coinbase amount paid to the miner of each block
    #[serde(default = "default_mining_reward")]
    pub mining_reward: u64,
    /// Maximum number of pending transactions
    #[serde(default = "default_max_pending")]
    pub max_pending: usize,
}

fn default_difficulty() -> u32 {
    DEFAULT_DIFFICULTY
}

fn default_mining_reward() -> u64 {
    BLOCK_REWARD
}

fn default_max_pending() -> usize {
    DEFAULT_MEMPOOL_SIZE
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: BLOCK_REWARD,
            max_pending: DEFAULT_MEMPOOL_SIZE,
        }
    }
}

impl ChainConfig {
    /// Default configuration with a custom difficulty
    pub fn with_difficulty(difficulty: u32) -> Self {
        Self {
            difficulty,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty == 0 || self.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::InvalidDifficulty(self.difficulty));
        }
        if self.mining_reward == 0 {
            return Err(ConfigError::InvalidReward);
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }
}
