use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use super::keys;
use crate::store::{StateStore, StoreError};
use crate::transport::Endpoint;

/// FIFO of encoded frames per destination endpoint.
///
/// Each push resets the queue's expiry to the destination's keep-alive
/// window, so frames for a device that went quiet disappear with it.
pub struct OutboundQueue {
    store: Arc<dyn StateStore>,
}

impl OutboundQueue {
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// Append a frame; returns the queue length afterwards.
    pub async fn push(
        &self,
        destination: &Endpoint,
        frame: &[u8],
        ttl: Duration,
    ) -> Result<usize, StoreError> {
        let key = keys::queue(destination);
        let len = self.store.rpush(&key, frame).await?;
        self.store.expire(&key, ttl).await?;
        Ok(len)
    }

    /// Take the oldest frame for `destination`. Popping is destructive: a
    /// frame that then fails to send is gone.
    pub async fn pop(&self, destination: &Endpoint) -> Result<Option<Bytes>, StoreError> {
        Ok(self
            .store
            .lpop(&keys::queue(destination))
            .await?
            .map(Bytes::from))
    }

    /// Frames waiting for `destination`.
    pub async fn len(&self, destination: &Endpoint) -> Result<usize, StoreError> {
        self.store.llen(&keys::queue(destination)).await
    }
}
