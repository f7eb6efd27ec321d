use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::keys;
use crate::store::{StateStore, StoreError};

/// Subscriptions per client, plus the set of clients that have any.
///
/// Patterns are stored as topic names (wildcards included). Id-based
/// subscriptions are resolved to their name before they get here. A client's
/// pattern set expires together with its session; the `subscribers` set is
/// pruned lazily when a fan-out scan finds a set gone.
pub struct SubscriptionIndex {
    store: Arc<dyn StateStore>,
}

impl SubscriptionIndex {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Add `pattern` for `client_id`, keeping the set alive for `ttl`.
    /// Returns false if the client already had this pattern.
    pub async fn subscribe(
        &self,
        client_id: &str,
        pattern: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let key = keys::subscriptions(client_id);
        let added = self.store.sadd(&key, pattern).await?;
        self.store.expire(&key, ttl).await?;
        self.store.sadd(keys::SUBSCRIBERS, client_id).await?;
        Ok(added)
    }

    /// Returns false if the client did not hold `pattern`.
    pub async fn unsubscribe(&self, client_id: &str, pattern: &str) -> Result<bool, StoreError> {
        let key = keys::subscriptions(client_id);
        let removed = self.store.srem(&key, pattern).await?;
        if self.store.scard(&key).await? == 0 {
            self.store.srem(keys::SUBSCRIBERS, client_id).await?;
        }
        Ok(removed)
    }

    /// Forget every pattern of `client_id`.
    pub async fn clear(&self, client_id: &str) -> Result<(), StoreError> {
        self.store.del(&keys::subscriptions(client_id)).await?;
        self.store.srem(keys::SUBSCRIBERS, client_id).await?;
        Ok(())
    }

    /// Patterns currently held by `client_id`, in no particular order.
    pub async fn patterns(&self, client_id: &str) -> Result<Vec<String>, StoreError> {
        self.store.smembers(&keys::subscriptions(client_id)).await
    }

    /// Client ids listed as holding subscriptions. May include clients
    /// whose pattern set has expired but not been pruned yet.
    pub async fn subscribers(&self) -> Result<Vec<String>, StoreError> {
        self.store.smembers(keys::SUBSCRIBERS).await
    }

    /// Clients with at least one pattern matching `topic`.
    pub async fn matching_clients(&self, topic: &str) -> Result<Vec<String>, StoreError> {
        let mut matched = Vec::new();
        for client_id in self.subscribers().await? {
            let patterns = self.patterns(&client_id).await?;
            if patterns.is_empty() {
                debug!(%client_id, "subscriptions expired; pruning subscriber");
                self.store.srem(keys::SUBSCRIBERS, &client_id).await?;
                continue;
            }
            if patterns.iter().any(|pattern| topic_matches(pattern, topic)) {
                matched.push(client_id);
            }
        }
        Ok(matched)
    }
}

/// True if `pattern` contains `+` or `#` anywhere. Such names are kept as
/// patterns and never registered as topics.
pub fn is_wildcard(pattern: &str) -> bool {
    pattern.contains(['#', '+'])
}

/// Match a topic name against a subscription pattern, level by level.
///
/// `+` matches exactly one level, `#` as the last level matches everything
/// from there on (including nothing). A `#` anywhere else is an ordinary
/// level. Patterns without wildcards only match the identical name.
pub fn topic_matches(pattern: &str, topic: &str) -> bool {
    let mut pattern_levels = pattern.split('/').peekable();
    let mut topic_levels = topic.split('/');

    loop {
        match (pattern_levels.next(), topic_levels.next()) {
            (Some("#"), _) if pattern_levels.peek().is_none() => return true,
            (Some("+"), Some(_)) => {}
            (Some(p), Some(t)) if p == t => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}
