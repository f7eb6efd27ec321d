//! In-process command semantics over a pluggable entry backend.
//!
//! `LocalStore` evaluates every command against `Entry` values under a single
//! async mutex, so each command is atomic with respect to every other command
//! issued to the same store. Expired entries are treated as absent and are
//! deleted as soon as a command sees them; `purge_expired` sweeps the rest.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::entry::{
    Entry, Value, bytes_mut, bytes_ref, hash_mut, hash_ref, list_mut, list_ref, ordered_members,
    set_mut, set_ref, zset_mut, zset_ref,
};
use super::{StateStore, StoreError};
use crate::utils::Clock;

/// Where a `LocalStore` keeps its entries.
pub trait Backend: Send + 'static {
    fn load(&mut self, key: &str) -> Result<Option<Entry>, StoreError>;
    /// `None` removes the key.
    fn save(&mut self, key: &str, entry: Option<&Entry>) -> Result<(), StoreError>;
    /// Remove every entry expired at `now_millis`; returns how many went.
    fn purge_expired(&mut self, now_millis: i64) -> Result<usize, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, Entry>,
}

impl Backend for MemoryBackend {
    fn load(&mut self, key: &str) -> Result<Option<Entry>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, entry: Option<&Entry>) -> Result<(), StoreError> {
        match entry {
            Some(entry) => {
                self.entries.insert(key.to_string(), entry.clone());
            }
            None => {
                self.entries.remove(key);
            }
        }
        Ok(())
    }

    fn purge_expired(&mut self, now_millis: i64) -> Result<usize, StoreError> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now_millis));
        Ok(before - self.entries.len())
    }
}

impl MemoryBackend {
    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub type MemoryStore = LocalStore<MemoryBackend>;

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        LocalStore::with_backend(MemoryBackend::default(), clock)
    }
}

pub struct LocalStore<B> {
    pub(super) backend: Mutex<B>,
    clock: Arc<dyn Clock>,
}

fn ttl_millis(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX)
}

impl<B: Backend> LocalStore<B> {
    pub fn with_backend(backend: B, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend: Mutex::new(backend),
            clock,
        }
    }

    async fn read<R>(
        &self,
        key: &str,
        f: impl FnOnce(Option<&Entry>) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut backend = self.backend.lock().await;
        let now = self.clock.now_millis();
        let entry = Self::load_live(&mut *backend, key, now)?;
        f(entry.as_ref())
    }

    /// Load `key`, deleting it from the backend if it has expired.
    fn load_live(backend: &mut B, key: &str, now: i64) -> Result<Option<Entry>, StoreError> {
        match backend.load(key)? {
            Some(entry) if entry.is_expired(now) => {
                backend.save(key, None)?;
                Ok(None)
            }
            entry => Ok(entry),
        }
    }

    async fn modify<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut Option<Entry>, i64) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        let mut backend = self.backend.lock().await;
        let now = self.clock.now_millis();
        let mut slot = Self::load_live(&mut *backend, key, now)?;

        let result = f(&mut slot, now)?;

        if slot.as_ref().is_some_and(Entry::is_empty) {
            slot = None;
        }
        backend.save(key, slot.as_ref())?;
        Ok(result)
    }
}

#[async_trait]
impl<B: Backend> StateStore for LocalStore<B> {
    async fn ping(&self) -> Result<(), StoreError> {
        self.read("", |_| Ok(())).await
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let mut backend = self.backend.lock().await;
        let now = self.clock.now_millis();
        backend.purge_expired(now)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.read(key, |entry| Ok(bytes_ref(entry, key)?.cloned()))
            .await
    }

    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        self.modify(key, |slot, now| {
            *slot = Some(Entry {
                value: Value::Bytes(value.to_vec()),
                expires_at: Some(now.saturating_add(ttl_millis(ttl))),
            });
            Ok(())
        })
        .await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.modify(key, |slot, _| {
            let raw = bytes_mut(slot, key)?;
            let current = if raw.is_empty() {
                0
            } else {
                std::str::from_utf8(raw)
                    .ok()
                    .and_then(|s| s.parse::<i64>().ok())
                    .ok_or_else(|| StoreError::InvalidInteger(key.to_string()))?
            };
            let next = current + 1;
            *raw = next.to_string().into_bytes();
            Ok(next)
        })
        .await
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.modify(key, |slot, now| match slot {
            Some(entry) => {
                entry.expires_at = Some(now.saturating_add(ttl_millis(ttl)));
                Ok(true)
            }
            None => Ok(false),
        })
        .await
    }

    async fn del(&self, key: &str) -> Result<bool, StoreError> {
        self.modify(key, |slot, _| Ok(slot.take().is_some())).await
    }

    async fn hset(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError> {
        self.modify(key, |slot, _| {
            let hash = hash_mut(slot, key)?;
            for (field, value) in fields {
                hash.insert((*field).to_string(), value.clone());
            }
            Ok(())
        })
        .await
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.read(key, |entry| {
            Ok(hash_ref(entry, key)?.and_then(|hash| hash.get(field).cloned()))
        })
        .await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.read(key, |entry| {
            Ok(hash_ref(entry, key)?
                .map(|hash| hash.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                .unwrap_or_default())
        })
        .await
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError> {
        self.modify(key, |slot, _| {
            zset_mut(slot, key)?.insert(member.to_string(), score);
            Ok(())
        })
        .await
    }

    async fn zadd_nx(&self, key: &str, member: &str, score: f64) -> Result<bool, StoreError> {
        self.modify(key, |slot, _| {
            let zset = zset_mut(slot, key)?;
            if zset.contains_key(member) {
                return Ok(false);
            }
            zset.insert(member.to_string(), score);
            Ok(true)
        })
        .await
    }

    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, StoreError> {
        self.read(key, |entry| {
            Ok(zset_ref(entry, key)?.and_then(|zset| zset.get(member).copied()))
        })
        .await
    }

    async fn zrange(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.zrange_by_score(key, f64::NEG_INFINITY, f64::INFINITY)
            .await
    }

    async fn zrange_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<Vec<String>, StoreError> {
        self.read(key, |entry| {
            Ok(zset_ref(entry, key)?
                .map(|zset| {
                    ordered_members(zset)
                        .into_iter()
                        .filter(|(_, score)| *score >= min && *score <= max)
                        .map(|(member, _)| member.clone())
                        .collect()
                })
                .unwrap_or_default())
        })
        .await
    }

    async fn zrem_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
    ) -> Result<usize, StoreError> {
        self.modify(key, |slot, _| {
            if slot.is_none() {
                return Ok(0);
            }
            let zset = zset_mut(slot, key)?;
            let before = zset.len();
            zset.retain(|_, score| *score < min || *score > max);
            Ok(before - zset.len())
        })
        .await
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.modify(key, |slot, _| {
            if slot.is_none() {
                return Ok(false);
            }
            Ok(zset_mut(slot, key)?.remove(member).is_some())
        })
        .await
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.modify(key, |slot, _| Ok(set_mut(slot, key)?.insert(member.to_string())))
            .await
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.modify(key, |slot, _| {
            if slot.is_none() {
                return Ok(false);
            }
            Ok(set_mut(slot, key)?.remove(member))
        })
        .await
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.read(key, |entry| {
            Ok(set_ref(entry, key)?
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default())
        })
        .await
    }

    async fn scard(&self, key: &str) -> Result<usize, StoreError> {
        self.read(key, |entry| Ok(set_ref(entry, key)?.map_or(0, |set| set.len())))
            .await
    }

    async fn rpush(&self, key: &str, value: &[u8]) -> Result<usize, StoreError> {
        self.modify(key, |slot, _| {
            let list = list_mut(slot, key)?;
            list.push_back(value.to_vec());
            Ok(list.len())
        })
        .await
    }

    async fn lpop(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.modify(key, |slot, _| {
            if slot.is_none() {
                return Ok(None);
            }
            Ok(list_mut(slot, key)?.pop_front())
        })
        .await
    }

    async fn llen(&self, key: &str) -> Result<usize, StoreError> {
        self.read(key, |entry| Ok(list_ref(entry, key)?.map_or(0, |list| list.len())))
            .await
    }
}
