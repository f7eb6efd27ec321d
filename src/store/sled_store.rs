//! Durable single-host store backed by `sled`.
//!
//! Every key maps to one JSON-encoded `Entry` (value plus absolute expiry) in
//! the default tree. sled takes an exclusive lock on its directory, so a
//! `SledStore` serves exactly one broker process; use `RedisStore` when
//! several processes must share state.

use std::sync::Arc;

use sled::Db;

use super::entry::Entry;
use super::local::{Backend, LocalStore};
use super::StoreError;
use crate::utils::Clock;

pub struct SledBackend {
    db: Db,
}

impl Backend for SledBackend {
    fn load(&mut self, key: &str) -> Result<Option<Entry>, StoreError> {
        match self.db.get(key.as_bytes())? {
            Some(raw) => Ok(Some(serde_json::from_slice(&raw)?)),
            None => Ok(None),
        }
    }

    fn save(&mut self, key: &str, entry: Option<&Entry>) -> Result<(), StoreError> {
        match entry {
            Some(entry) => {
                self.db.insert(key.as_bytes(), serde_json::to_vec(entry)?)?;
            }
            None => {
                self.db.remove(key.as_bytes())?;
            }
        }
        Ok(())
    }

    fn purge_expired(&mut self, now_millis: i64) -> Result<usize, StoreError> {
        let mut expired = Vec::new();
        for item in self.db.iter() {
            let (key, raw) = item?;
            let entry: Entry = serde_json::from_slice(&raw)?;
            if entry.is_expired(now_millis) {
                expired.push(key);
            }
        }
        for key in &expired {
            self.db.remove(key)?;
        }
        Ok(expired.len())
    }
}

impl std::fmt::Debug for SledBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledBackend")
            .field("db", &"sled::Db")
            .finish()
    }
}

pub type SledStore = LocalStore<SledBackend>;

impl SledStore {
    /// Open or create a sled database at `path`.
    pub fn open(path: &str, clock: Arc<dyn Clock>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(LocalStore::with_backend(SledBackend { db }, clock))
    }

    /// Write buffered changes to disk.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let backend = self.backend.lock().await;
        backend.db.flush_async().await?;
        Ok(())
    }
}
