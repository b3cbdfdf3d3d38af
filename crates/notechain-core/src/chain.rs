//! The append-only block sequence.
//!
//! A [`Chain`] only grows through [`Chain::append`] or is replaced wholesale
//! through [`Chain::import`]. Blocks are never edited or removed in place.
//! `Chain` has no internal locking; use [`SharedChain`] when more than one
//! thread drives the same chain.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};
use crate::constants::{GENESIS_PAYLOAD_ID, GENESIS_PREVIOUS_HASH, POW_DIFFICULTY};
use crate::error::ChainError;
use crate::mine::{meets_difficulty, mine_block};
use crate::{Block, EncryptedPayload};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainConfig {
    /// Leading hex zeros new blocks are mined to. Never below
    /// [`POW_DIFFICULTY`], which is what validation enforces.
    pub difficulty: usize,
    /// Give up mining after this many nonces. `None` searches forever.
    pub max_mining_iterations: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: POW_DIFFICULTY,
            max_mining_iterations: None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStats {
    pub count: usize,
    pub is_valid: bool,
    pub tip: Option<Block>,
}

#[derive(Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    config: ChainConfig,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("len", &self.blocks.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}

impl Chain {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            config: ChainConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Fails if `config` would mine blocks weaker than validation accepts.
    pub fn with_config(config: ChainConfig, clock: Arc<dyn Clock>) -> Result<Self, ChainError> {
        if config.difficulty < POW_DIFFICULTY {
            return Err(ChainError::DifficultyBelowMinimum {
                requested: config.difficulty,
                minimum: POW_DIFFICULTY,
            });
        }
        Ok(Self {
            blocks: Vec::new(),
            config,
            clock,
        })
    }

    pub fn config(&self) -> ChainConfig {
        self.config
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Mine the fixed first block: sentinel previous hash and a payload
    /// marking "genesis".
    pub fn genesis(&self) -> Result<Block, ChainError> {
        let now = self.clock.now_millis();
        let payload = EncryptedPayload {
            id: GENESIS_PAYLOAD_ID.to_string(),
            encrypted_data: GENESIS_PAYLOAD_ID.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.mine(Block::candidate(GENESIS_PREVIOUS_HASH, now, payload))
    }

    /// Seal `payload` into a new block on top of the tip. An empty chain gets
    /// its genesis block first. Nothing is stored unless every block mined.
    pub fn append(&mut self, payload: EncryptedPayload) -> Result<Block, ChainError> {
        let genesis = if self.blocks.is_empty() {
            Some(self.genesis()?)
        } else {
            None
        };
        let previous_hash = genesis
            .as_ref()
            .or(self.blocks.last())
            .map(|b| b.hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());

        let payload_id = payload.id.clone();
        let candidate = Block::candidate(previous_hash, self.clock.now_millis(), payload);
        let block = self.mine(candidate)?;

        self.blocks.extend(genesis);
        self.blocks.push(block.clone());
        debug!(
            "appended block {} for payload {} at height {}",
            block.id,
            payload_id,
            self.blocks.len() - 1
        );
        Ok(block)
    }

    fn mine(&self, candidate: Block) -> Result<Block, ChainError> {
        mine_block(
            candidate,
            self.config.difficulty,
            self.config.max_mining_iterations,
        )
    }

    /// Recheck every stored block. Never fails; any broken invariant yields false.
    ///
    /// The difficulty prefix is checked against [`POW_DIFFICULTY`], not the
    /// configured mining difficulty, so a chain sealed at any allowed
    /// difficulty validates under every configuration.
    pub fn validate(&self) -> bool {
        validate_blocks(&self.blocks, POW_DIFFICULTY)
    }

    pub fn lookup_by_payload_id(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.payload.id == id)
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            count: self.blocks.len(),
            is_valid: self.validate(),
            tip: self.blocks.last().cloned(),
        }
    }

    /// JSON array of every block, genesis first.
    pub fn export(&self) -> Result<String, ChainError> {
        Ok(serde_json::to_string(&self.blocks)?)
    }

    pub fn export_pretty(&self) -> Result<String, ChainError> {
        Ok(serde_json::to_string_pretty(&self.blocks)?)
    }

    /// Replace the chain with the decoded `serialized` blocks if they validate.
    /// Returns false, leaving the chain untouched, otherwise.
    pub fn import(&mut self, serialized: &str) -> bool {
        match serde_json::from_str::<Vec<Block>>(serialized) {
            Ok(candidate) => self.import_blocks(candidate),
            Err(e) => {
                warn!("rejected chain import: {e}");
                false
            }
        }
    }

    pub fn import_blocks(&mut self, candidate: Vec<Block>) -> bool {
        let previous = std::mem::replace(&mut self.blocks, candidate);
        if self.validate() {
            debug!("imported chain of {} blocks", self.blocks.len());
            true
        } else {
            let rejected = std::mem::replace(&mut self.blocks, previous);
            warn!(
                "rejected chain import: {} candidate blocks failed validation",
                rejected.len()
            );
            false
        }
    }
}

/// Single forward pass over `blocks`. An empty sequence is valid.
pub fn validate_blocks(blocks: &[Block], difficulty: usize) -> bool {
    for (i, block) in blocks.iter().enumerate() {
        let expected_previous = match i {
            0 => GENESIS_PREVIOUS_HASH,
            _ => blocks[i - 1].hash.as_str(),
        };
        if block.previous_hash != expected_previous {
            debug!("block {i} does not link to its predecessor");
            return false;
        }
        if block.hash != block.compute_hash() {
            debug!("block {i} hash does not match its contents");
            return false;
        }
        if !meets_difficulty(&block.hash, difficulty) {
            debug!("block {i} hash misses difficulty {difficulty}");
            return false;
        }
    }
    true
}

/// A [`Chain`] behind a mutex. Every operation holds the lock for its whole
/// duration, so concurrent appends each see the previous one's tip.
#[derive(Clone, Debug, Default)]
pub struct SharedChain {
    inner: Arc<Mutex<Chain>>,
}

impl SharedChain {
    pub fn new(chain: Chain) -> Self {
        Self {
            inner: Arc::new(Mutex::new(chain)),
        }
    }

    // A panic mid-operation never leaves a half-written chain behind, so a
    // poisoned lock still guards a consistent value.
    fn lock(&self) -> MutexGuard<'_, Chain> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, payload: EncryptedPayload) -> Result<Block, ChainError> {
        self.lock().append(payload)
    }

    pub fn validate(&self) -> bool {
        self.lock().validate()
    }

    pub fn stats(&self) -> ChainStats {
        self.lock().stats()
    }

    pub fn lookup_by_payload_id(&self, id: &str) -> Option<Block> {
        self.lock().lookup_by_payload_id(id).cloned()
    }

    pub fn export(&self) -> Result<String, ChainError> {
        self.lock().export()
    }

    pub fn import(&self, serialized: &str) -> bool {
        self.lock().import(serialized)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run `f` against the chain while holding the lock.
    pub fn with_chain<R>(&self, f: impl FnOnce(&Chain) -> R) -> R {
        f(&self.lock())
    }
}
