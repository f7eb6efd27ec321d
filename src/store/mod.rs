//! The `store` module defines the coordination store capability every other
//! component is built on.
//!
//! Broker instances never share memory; everything they agree on (sessions,
//! topic ids, subscriptions, outbound queues) lives behind `StateStore`. The
//! trait mirrors the small command set the broker needs from a Redis-like
//! service: plain values, hashes, sorted sets, sets and lists, all with
//! per-key expiry. Each call is atomic on its own; there are no multi-key
//! transactions.
//!
//! Three implementations are provided:
//! - `RedisStore`: networked, shared by any number of broker processes
//! - `SledStore`: durable, for a single broker process on one host
//! - `MemoryStore`: in-process, used by tests and throwaway runs

mod entry;
mod local;
mod redis_store;
mod sled_store;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{StoreBackend, StoreSettings};
use crate::utils::Clock;

pub use local::{Backend, LocalStore, MemoryBackend, MemoryStore};
pub use redis_store::RedisStore;
pub use sled_store::{SledBackend, SledStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key {0:?} holds a value of the wrong type")]
    WrongType(String),

    #[error("key {0:?} does not hold an integer")]
    InvalidInteger(String),

    #[error("redis: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("sled: {0}")]
    Sled(#[from] sled::Error),

    #[error("entry serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[async_trait]
pub trait StateStore: Send + Sync {
    /// Round-trip to the store; used at startup to fail fast.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Drop expired keys that no command has touched since they expired.
    /// Stores with native expiry have nothing to do and return 0.
    async fn purge_expired(&self) -> Result<usize, StoreError> {
        Ok(0)
    }

    /// Plain value at `key`; wrong-type keys are an error.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    /// Set a plain value, replacing whatever the key held, with a TTL.
    async fn set_ex(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError>;
    /// Increment an integer value, creating it at 0 first.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;
    /// Returns false when the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError>;
    /// Returns whether the key existed.
    async fn del(&self, key: &str) -> Result<bool, StoreError>;

    /// Set the given fields, leaving other fields and the TTL alone.
    async fn hset(&self, key: &str, fields: &[(&str, String)]) -> Result<(), StoreError>;
    /// One field of a hash.
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;
    /// Every field of a hash; empty when the key is absent.
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Add `member` or update its score.
    async fn zadd(&self, key: &str, member: &str, score: f64) -> Result<(), StoreError>;
    /// Add only if `member` is absent. Returns whether it was added.
    async fn zadd_nx(&self, key: &str, member: &str, score: f64) -> Result<bool, StoreError>;
    /// Score of `member`, if present.
    async fn zscore(&self, key: &str, member: &str) -> Result<Option<f64>, StoreError>;
    /// All members, lowest score first.
    async fn zrange(&self, key: &str) -> Result<Vec<String>, StoreError>;
    /// Members with `min <= score <= max`, lowest score first.
    async fn zrange_by_score(&self, key: &str, min: f64, max: f64)
    -> Result<Vec<String>, StoreError>;
    /// Remove members with `min <= score <= max`; returns how many.
    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64)
    -> Result<usize, StoreError>;
    /// Returns whether `member` was present.
    async fn zrem(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    /// Returns whether `member` was newly added.
    async fn sadd(&self, key: &str, member: &str) -> Result<bool, StoreError>;
    /// Returns whether `member` was present.
    async fn srem(&self, key: &str, member: &str) -> Result<bool, StoreError>;
    /// Members in no guaranteed order.
    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError>;
    /// Number of members; 0 when absent.
    async fn scard(&self, key: &str) -> Result<usize, StoreError>;

    /// Append to the tail; returns the new length.
    async fn rpush(&self, key: &str, value: &[u8]) -> Result<usize, StoreError>;
    /// Destructively pop the head, if any.
    async fn lpop(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    /// Length of the list; 0 when absent.
    async fn llen(&self, key: &str) -> Result<usize, StoreError>;
}

/// Open the backend named in the configuration and check it answers.
pub async fn open(
    settings: &StoreSettings,
    clock: Arc<dyn Clock>,
) -> Result<Arc<dyn StateStore>, StoreError> {
    let store: Arc<dyn StateStore> = match settings.backend {
        StoreBackend::Redis => Arc::new(RedisStore::connect(&settings.url).await?),
        StoreBackend::Sled => Arc::new(SledStore::open(&settings.path, clock)?),
        StoreBackend::Memory => Arc::new(MemoryStore::new(clock)),
    };
    store.ping().await?;
    Ok(store)
}

#[cfg(test)]
mod tests;
