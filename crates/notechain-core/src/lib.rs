//! Tamper-evident, encrypted note records.
//!
//! Notes are sealed with [`CipherCodec`] and appended to a [`Chain`] of
//! proof-of-work blocks. The chain is a local attestation log: there are no
//! peers, no consensus and no fork choice.

pub mod chain;
pub mod cipher;
pub mod clock;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod mine;
pub mod note;
pub mod store;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub use chain::{Chain, ChainConfig, ChainStats, SharedChain};
pub use cipher::{digest, CipherCodec, CipherKey};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ChainError, CipherError, LedgerError};
pub use ledger::NoteLedger;
pub use note::{EncryptedPayload, Note};
pub use store::{KeyValueStore, MemoryStore};

use constants::BLOCK_ID_SIZE;

/// One sealed record of the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub hash: String,
    pub previous_hash: String,
    pub timestamp: u64,
    pub payload: EncryptedPayload,
    pub nonce: u64,
}

impl Block {
    /// An unmined block: nonce 0 and no hash yet.
    pub fn candidate(
        previous_hash: impl Into<String>,
        timestamp: u64,
        payload: EncryptedPayload,
    ) -> Self {
        let id: [u8; BLOCK_ID_SIZE] = rand::thread_rng().gen();
        Self {
            id: hex::encode(id),
            hash: String::new(),
            previous_hash: previous_hash.into(),
            timestamp,
            payload,
            nonce: 0,
        }
    }

    /// Recompute the sealing digest from the stored fields.
    pub fn compute_hash(&self) -> String {
        block_hash(&self.previous_hash, self.timestamp, &self.payload, self.nonce)
    }
}

/// Compact JSON of a payload; the `Serialize(payload)` term of the block digest.
pub fn payload_json(payload: &EncryptedPayload) -> String {
    // Strings and integers only; serde_json cannot fail on this shape.
    serde_json::to_string(payload).expect("payload serializes to json")
}

/// `digest(previous_hash ‖ timestamp ‖ payload_json ‖ nonce)`.
pub fn block_hash(
    previous_hash: &str,
    timestamp: u64,
    payload: &EncryptedPayload,
    nonce: u64,
) -> String {
    sealing_digest(previous_hash, timestamp, &payload_json(payload), nonce)
}

pub(crate) fn sealing_digest(
    previous_hash: &str,
    timestamp: u64,
    payload_json: &str,
    nonce: u64,
) -> String {
    digest(&format!("{previous_hash}{timestamp}{payload_json}{nonce}"))
}
