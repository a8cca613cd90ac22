//! Node: synchronized access to one ledger
//!
//! All reads and writes of the chain and pending set go through one
//! `RwLock`, so no caller ever observes a chain mid-append or
//! mid-replacement. Mining takes a snapshot under the read lock, searches on
//! the blocking pool with no lock held, then re-checks the tip under the
//! write lock before appending.

use crate::config::{ChainConfig, ConfigError};
use crate::core::{resolve, Block, BlockError, ChainError, ChainStats, Ledger, Resolution, Transaction};
use crate::mining::{MempoolError, Miner, MiningOutcome, MiningStats};
use log::{debug, info};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Transaction rejected: {0}")]
    Mempool(#[from] MempoolError),
    #[error("Block rejected: {0}")]
    Block(#[from] BlockError),
    #[error("Mining task failed: {0}")]
    MiningTask(#[from] tokio::task::JoinError),
}

/// Result of [`Node::mine`]
#[derive(Debug)]
pub enum MineOutcome {
    Mined { block: Block, stats: MiningStats },
    NoBlockProduced,
}

struct NodeState {
    ledger: Ledger,
    /// Cancelled whenever the tip moves; searches hold a clone
    tip_changed: CancellationToken,
}

/// A ledger shared between the miner and the external API/network layer
#[derive(Clone)]
pub struct Node {
    state: Arc<RwLock<NodeState>>,
    shutdown: CancellationToken,
}

impl Node {
    /// Create a node whose ledger holds only the genesis block
    pub fn new(config: ChainConfig) -> Result<Self, ConfigError> {
        Ok(Self::from_ledger(Ledger::new(config)?))
    }

    pub fn from_ledger(ledger: Ledger) -> Self {
        let shutdown = CancellationToken::new();
        let state = NodeState {
            ledger,
            tip_changed: shutdown.child_token(),
        };
        Self {
            state: Arc::new(RwLock::new(state)),
            shutdown,
        }
    }

    /// Validate a transaction and add it to the pending set
    pub async fn submit_transaction(&self, tx: Transaction) -> Result<String, NodeError> {
        let mut state = self.state.write().await;
        let id = state.ledger.submit_transaction(tx)?;
        debug!("Accepted pending transaction {}", id);
        Ok(id)
    }

    /// Mine one block paying `miner_address`.
    ///
    /// Restarts against the new tip whenever the tip moves during the search.
    /// Returns [`MineOutcome::NoBlockProduced`] once the node shuts down.
    pub async fn mine(&self, miner_address: &str) -> Result<MineOutcome, NodeError> {
        let miner = Miner::new(miner_address);

        loop {
            if self.shutdown.is_cancelled() {
                return Ok(MineOutcome::NoBlockProduced);
            }

            let (previous, pending, config, cancel) = {
                let state = self.state.read().await;
                (
                    state.ledger.tip().clone(),
                    state.ledger.pending().transactions().to_vec(),
                    state.ledger.config().clone(),
                    state.tip_changed.clone(),
                )
            };
            let previous_hash = previous.hash.clone();

            let search = miner.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                search.mine(&pending, &previous, &config, &cancel)
            })
            .await?;

            match outcome {
                MiningOutcome::Found { block, stats } => {
                    if self.commit_mined(&previous_hash, block.clone()).await? {
                        return Ok(MineOutcome::Mined { block, stats });
                    }
                }
                MiningOutcome::Cancelled { .. } => {
                    debug!("Tip moved during search, restarting");
                }
            }
        }
    }

    /// Append a freshly mined block if the tip it was built on is still the
    /// tip. Returns `false` for a stale result.
    async fn commit_mined(&self, previous_hash: &str, block: Block) -> Result<bool, NodeError> {
        let mut state = self.state.write().await;
        if state.ledger.tip().hash != previous_hash {
            debug!(
                "Discarding stale block {}: tip moved to {}",
                block.index,
                state.ledger.tip().hash
            );
            return Ok(false);
        }

        state.ledger.append(block)?;
        state.advance_tip(&self.shutdown);
        Ok(true)
    }

    /// Append a block mined elsewhere on top of the current tip
    pub async fn receive_block(&self, block: Block) -> Result<(), NodeError> {
        let mut state = self.state.write().await;
        state.ledger.append(block)?;
        state.advance_tip(&self.shutdown);
        Ok(())
    }

    /// Longest-valid-chain resolution against candidate chains
    pub async fn resolve_consensus(&self, candidates: Vec<Vec<Block>>) -> Resolution {
        let mut state = self.state.write().await;
        let resolution = resolve(&mut state.ledger, candidates);
        if resolution.replaced {
            state.advance_tip(&self.shutdown);
        }
        resolution
    }

    /// Snapshot of the active chain
    pub async fn get_chain(&self) -> Vec<Block> {
        self.state.read().await.ledger.blocks().to_vec()
    }

    pub async fn get_balance(&self, address: &str) -> u64 {
        self.state.read().await.ledger.balance_of(address)
    }

    /// Full validation of the active chain
    pub async fn validate_chain(&self) -> Result<(), ChainError> {
        self.state.read().await.ledger.is_valid()
    }

    pub async fn pending_transactions(&self) -> Vec<Transaction> {
        self.state
            .read()
            .await
            .ledger
            .pending()
            .transactions()
            .to_vec()
    }

    pub async fn tip(&self) -> Block {
        self.state.read().await.ledger.tip().clone()
    }

    pub async fn length(&self) -> usize {
        self.state.read().await.ledger.length()
    }

    pub async fn stats(&self) -> ChainStats {
        self.state.read().await.ledger.stats()
    }

    pub async fn config(&self) -> ChainConfig {
        self.state.read().await.ledger.config().clone()
    }

    /// Stop in-flight and future searches; `mine` returns `NoBlockProduced`
    pub fn shutdown(&self) {
        info!("Node shutting down, cancelling mining");
        self.shutdown.cancel();
    }
}

impl NodeState {
    /// Interrupt searches built on the old tip
    fn advance_tip(&mut self, shutdown: &CancellationToken) {
        self.tip_changed.cancel();
        self.tip_changed = shutdown.child_token();
    }
}
