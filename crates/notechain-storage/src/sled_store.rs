use anyhow::{Context, Result};
use notechain_core::KeyValueStore;
use sled::Db;
use std::path::Path;
use tracing::{debug, info};

const TREE_ENTRIES: &str = "entries";

#[derive(Clone)]
pub struct SledStore {
  db: Db,
  entries: sled::Tree,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let db = sled::open(path).with_context(|| format!("open sled db at {}", path.display()))?;
    let entries = db.open_tree(TREE_ENTRIES).context("open entries tree")?;
    info!("sled store opened at {}", path.display());
    Ok(Self { db, entries })
  }

  pub fn flush(&self) -> Result<()> {
    self.db.flush()?;
    Ok(())
  }

  /// Drop every entry.
  pub fn clear(&self) -> Result<()> {
    self.entries.clear()?;
    self.flush()
  }

  pub fn close(&self) -> Result<()> {
    self.flush()
  }

  pub fn keys(&self) -> Result<Vec<String>> {
    self
      .entries
      .iter()
      .keys()
      .map(|k| {
        k.map(|k| String::from_utf8_lossy(&k).into_owned())
          .map_err(Into::into)
      })
      .collect()
  }
}

impl KeyValueStore for SledStore {
  fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    Ok(self.entries.get(key)?.map(|v| v.to_vec()))
  }

  fn set(&self, key: &str, value: &[u8]) -> Result<()> {
    self.entries.insert(key, value)?;
    self.flush()?;
    debug!("stored {} bytes under {key}", value.len());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<()> {
    self.entries.remove(key)?;
    self.flush()
  }
}
