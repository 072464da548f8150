//! # Persistent checkpoint store (spec.md §6 Key-value store)
//!
//! Embedded, persistent, ordered-by-byte-key KV store used to carry
//! per-read state across index-part iterations. No teacher analogue
//! (`ConSTRain` has no persistence layer); `sled` is the idiomatic choice
//! for "embedded, persistent, ordered by byte key" in the Rust ecosystem.
use anyhow::{Context, Result};

use crate::read::Read;

/// `put`/`get` keyed by read ordinal, as specified. A trait so the
/// pipeline can be tested against an in-memory stand-in without touching
/// disk.
pub trait ReadStore: Send + Sync {
    fn put(&self, ordinal: u64, read: &Read) -> Result<()>;
    fn get(&self, ordinal: u64) -> Result<Option<Read>>;
}

/// `sled`-backed implementation. Keys are the read ordinal encoded
/// big-endian (so sled's byte-order iteration matches numeric order,
/// should anything ever need to scan the store); values are `bincode`.
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let db = sled::open(path).context("opening checkpoint store")?;
        Ok(SledStore { db })
    }
}

impl ReadStore for SledStore {
    fn put(&self, ordinal: u64, read: &Read) -> Result<()> {
        let key = ordinal.to_be_bytes();
        let value = bincode::serialize(read).context("serializing read checkpoint")?;
        self.db.insert(key, value).context("writing read checkpoint")?;
        Ok(())
    }

    fn get(&self, ordinal: u64) -> Result<Option<Read>> {
        let key = ordinal.to_be_bytes();
        match self.db.get(key).context("reading read checkpoint")? {
            Some(bytes) => {
                let read = bincode::deserialize(&bytes).context("deserializing read checkpoint")?;
                Ok(Some(read))
            }
            None => Ok(None),
        }
    }
}
