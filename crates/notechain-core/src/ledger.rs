//! Note bookkeeping on top of the cipher and the chain.
//!
//! Recording a note is two calls: [`CipherCodec::encrypt`] then
//! [`Chain::append`]. Plaintext notes live separately in the
//! [`KeyValueStore`]; editing or deleting them never touches blocks that were
//! already sealed, so the chain keeps the contents as they were when recorded.

use std::sync::Arc;

use tracing::{debug, info};

use crate::chain::{Chain, ChainConfig, ChainStats};
use crate::cipher::CipherCodec;
use crate::clock::{Clock, SystemClock};
use crate::constants::{STORE_KEY_CHAIN, STORE_KEY_NOTES};
use crate::error::{LedgerError, Result};
use crate::note::Note;
use crate::store::KeyValueStore;
use crate::Block;

pub struct NoteLedger<S: KeyValueStore> {
    store: Arc<S>,
    codec: CipherCodec,
    chain: Chain,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> NoteLedger<S> {
    pub fn open(store: Arc<S>, codec: CipherCodec, config: ChainConfig) -> Result<Self> {
        Self::open_with_clock(store, codec, config, Arc::new(SystemClock))
    }

    /// Load the persisted chain, if any. A persisted chain that no longer
    /// validates is an error rather than silently discarded.
    pub fn open_with_clock(
        store: Arc<S>,
        codec: CipherCodec,
        config: ChainConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let mut chain = Chain::with_config(config, clock.clone())?;
        if let Some(bytes) = store.get(STORE_KEY_CHAIN)? {
            let serialized = String::from_utf8_lossy(&bytes);
            if !chain.import(&serialized) {
                return Err(LedgerError::InvalidPersistedChain);
            }
            info!("loaded chain of {} blocks", chain.len());
        }
        Ok(Self {
            store,
            codec,
            chain,
            clock,
        })
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn codec(&self) -> &CipherCodec {
        &self.codec
    }

    pub fn new_note(
        &self,
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
    ) -> Note {
        Note::new(id, title, content, tags, self.clock.as_ref())
    }

    /// Encrypt `note` and seal it into the chain.
    pub fn record(&mut self, note: &Note) -> Result<Block> {
        let payload = self.codec.encrypt(note)?;
        let block = self.chain.append(payload)?;
        self.persist_chain()?;
        Ok(block)
    }

    /// Record the note on the chain, then store the plaintext. A failed
    /// record leaves nothing stored.
    pub fn add_note(&mut self, note: &Note) -> Result<Block> {
        let block = self.record(note)?;
        self.save_note(note)?;
        Ok(block)
    }

    /// Insert or replace the plaintext note by id.
    pub fn save_note(&self, note: &Note) -> Result<()> {
        let mut notes = self.notes()?;
        match notes.iter_mut().find(|n| n.id == note.id) {
            Some(existing) => *existing = note.clone(),
            None => notes.push(note.clone()),
        }
        self.write_notes(&notes)
    }

    /// Edit a stored note. The chain is left alone.
    pub fn update_note(
        &self,
        id: &str,
        title: impl Into<String>,
        content: impl Into<String>,
        tags: Vec<String>,
    ) -> Result<Note> {
        let note = self
            .note(id)?
            .ok_or_else(|| LedgerError::NoteNotFound(id.to_string()))?;
        let updated = note.update(title, content, tags, self.clock.as_ref());
        self.save_note(&updated)?;
        Ok(updated)
    }

    pub fn note(&self, id: &str) -> Result<Option<Note>> {
        Ok(self.notes()?.into_iter().find(|n| n.id == id))
    }

    pub fn notes(&self) -> Result<Vec<Note>> {
        match self.store.get(STORE_KEY_NOTES)? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Returns whether a note was removed. Its block, if any, stays.
    pub fn delete_note(&self, id: &str) -> Result<bool> {
        let mut notes = self.notes()?;
        let before = notes.len();
        notes.retain(|n| n.id != id);
        if notes.len() == before {
            return Ok(false);
        }
        if notes.is_empty() {
            self.store.remove(STORE_KEY_NOTES)?;
        } else {
            self.write_notes(&notes)?;
        }
        debug!("deleted note {id}");
        Ok(true)
    }

    /// Decrypt the note as it was sealed in the chain. The genesis block
    /// carries no ciphertext and is never a match, whatever the note id.
    pub fn reveal(&self, id: &str) -> Result<Note> {
        let block = self
            .chain
            .blocks()
            .iter()
            .skip(1)
            .find(|b| b.payload.id == id)
            .ok_or_else(|| LedgerError::BlockNotFound(id.to_string()))?;
        Ok(self.codec.decrypt(&block.payload)?)
    }

    pub fn verify(&self) -> bool {
        self.chain.validate()
    }

    pub fn stats(&self) -> ChainStats {
        self.chain.stats()
    }

    pub fn export(&self) -> Result<String> {
        Ok(self.chain.export()?)
    }

    /// Swap in the serialized chain if it validates; persisted on success.
    pub fn import(&mut self, serialized: &str) -> Result<bool> {
        if !self.chain.import(serialized) {
            return Ok(false);
        }
        self.persist_chain()?;
        Ok(true)
    }

    fn persist_chain(&self) -> Result<()> {
        let serialized = self.chain.export()?;
        self.store.set(STORE_KEY_CHAIN, serialized.as_bytes())?;
        Ok(())
    }

    fn write_notes(&self, notes: &[Note]) -> Result<()> {
        let bytes = serde_json::to_vec(notes)?;
        self.store.set(STORE_KEY_NOTES, &bytes)?;
        Ok(())
    }
}
