use std::sync::Arc;

use tracing::debug;

use super::keys;
use crate::store::{StateStore, StoreError};
use crate::utils::Clock;

pub type TopicId = u64;

/// A registered topic name and the id every broker agrees on for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    pub name: String,
    pub id: TopicId,
    /// Milliseconds since the Unix epoch.
    pub registered_at: i64,
}

/// Cluster-wide name <-> id mapping.
///
/// Ids are assigned by bumping a shared counter and then claiming the name
/// with an add-if-absent. Two brokers racing on the same name both bump the
/// counter but only one claim lands; the loser re-reads the winner's id. The
/// burned counter value leaves a gap, so ids are unique and increasing but
/// not dense.
pub struct TopicRegistry {
    store: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl TopicRegistry {
    pub fn new(store: Arc<dyn StateStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Return the id for `name`, assigning the next one if it is new.
    pub async fn register_or_get(&self, name: &str) -> Result<TopicId, StoreError> {
        loop {
            if let Some(id) = self.lookup_id(name).await? {
                return Ok(id);
            }

            let candidate = self.store.incr(keys::TOPIC_IDS).await?;
            if self
                .store
                .zadd_nx(keys::TOPICS, name, candidate as f64)
                .await?
            {
                let now = self.clock.now_millis().to_string();
                self.store
                    .hset(keys::TOPICS_REGISTERED, &[(name, now)])
                    .await?;
                debug!(topic = name, id = candidate, "registered topic");
                return Ok(candidate as TopicId);
            }
            debug!(topic = name, burned = candidate, "lost topic id race");
        }
    }

    /// Id of an already registered name.
    pub async fn lookup_id(&self, name: &str) -> Result<Option<TopicId>, StoreError> {
        Ok(self
            .store
            .zscore(keys::TOPICS, name)
            .await?
            .map(|score| score as TopicId))
    }

    /// Name registered under `id`. Ids are never reused, so at most one
    /// name matches.
    pub async fn lookup_name(&self, id: TopicId) -> Result<Option<String>, StoreError> {
        let score = id as f64;
        Ok(self
            .store
            .zrange_by_score(keys::TOPICS, score, score)
            .await?
            .into_iter()
            .next())
    }

    /// Full record for `name`, including when it was first registered.
    pub async fn topic(&self, name: &str) -> Result<Option<Topic>, StoreError> {
        let Some(id) = self.lookup_id(name).await? else {
            return Ok(None);
        };
        let registered_at = self
            .store
            .hget(keys::TOPICS_REGISTERED, name)
            .await?
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        Ok(Some(Topic {
            name: name.to_string(),
            id,
            registered_at,
        }))
    }
}
