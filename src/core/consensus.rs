//! Consensus resolution (longest valid chain)
//!
//! Candidate chains arrive already deserialized from the network layer. Each
//! is validated in full from its own genesis; a bad candidate is reported and
//! skipped without affecting the others. The longest valid chain wins and
//! ties keep the incumbent, so two equally long chains never oscillate.

use crate::config::ChainConfig;
use crate::core::block::Block;
use crate::core::ledger::Ledger;
use crate::core::state::LedgerState;
use crate::core::validator::{validate_chain, ChainError};
use log::{info, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("Candidate chain {candidate} rejected: {source}")]
    ChainRejected {
        candidate: usize,
        #[source]
        source: ChainError,
    },
}

/// Outcome of one resolution round
#[derive(Debug, Default)]
pub struct Resolution {
    /// Whether the local chain was replaced
    pub replaced: bool,
    /// Length of the active chain after resolution
    pub length: usize,
    /// Candidates excluded for failing validation
    pub rejected: Vec<ConsensusError>,
}

/// Validate a candidate against the local genesis, returning its tip state
pub fn evaluate_candidate(
    local_genesis: &Block,
    candidate: &[Block],
    config: &ChainConfig,
) -> Result<LedgerState, ChainError> {
    let genesis = candidate.first().ok_or(ChainError::Empty)?;
    if genesis.hash != local_genesis.hash {
        return Err(ChainError::GenesisMismatch {
            expected: local_genesis.hash.clone(),
            found: genesis.hash.clone(),
        });
    }
    validate_chain(candidate, config)
}

/// Adopt the longest fully valid chain among the ledger's own and `candidates`.
///
/// The replacement happens in one step under the caller's exclusive borrow;
/// if nothing is strictly longer the ledger is untouched.
pub fn resolve(ledger: &mut Ledger, candidates: Vec<Vec<Block>>) -> Resolution {
    let mut best: Option<(Vec<Block>, LedgerState)> = None;
    let mut best_length = ledger.length();
    let mut rejected = Vec::new();

    for (index, candidate) in candidates.into_iter().enumerate() {
        match evaluate_candidate(ledger.genesis(), &candidate, ledger.config()) {
            Ok(state) => {
                if candidate.len() > best_length {
                    best_length = candidate.len();
                    best = Some((candidate, state));
                }
            }
            Err(source) => {
                warn!("Rejecting candidate chain {}: {}", index, source);
                rejected.push(ConsensusError::ChainRejected {
                    candidate: index,
                    source,
                });
            }
        }
    }

    let replaced = match best {
        Some((chain, state)) => {
            ledger.replace_chain(chain, &state);
            true
        }
        None => {
            info!("Local chain of length {} is authoritative", ledger.length());
            false
        }
    };

    Resolution {
        replaced,
        length: ledger.length(),
        rejected,
    }
}
