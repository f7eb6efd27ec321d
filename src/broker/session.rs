use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::keys;
use super::subscription::SubscriptionIndex;
use crate::client::ClientSession;
use crate::store::{StateStore, StoreError};
use crate::transport::Endpoint;
use crate::utils::Clock;

/// Session bookkeeping for one broker instance.
///
/// Every session write refreshes four things together: the info hash, the
/// client id -> endpoint binding and the client's subscription set (all live
/// for the keep-alive window plus one second) and this broker's
/// owned-clients entry for the endpoint, scored with the same expiry.
pub struct SessionRegistry {
    store: Arc<dyn StateStore>,
    subscriptions: SubscriptionIndex,
    clock: Arc<dyn Clock>,
    broker_id: String,
    default_keep_alive: u16,
}

impl SessionRegistry {
    pub fn new(
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        broker_id: String,
        default_keep_alive: u16,
    ) -> Self {
        Self {
            subscriptions: SubscriptionIndex::new(store.clone()),
            store,
            clock,
            broker_id,
            default_keep_alive,
        }
    }

    /// Id of the broker instance this registry writes as.
    pub fn broker_id(&self) -> &str {
        &self.broker_id
    }

    /// Window used for endpoints without a session of their own.
    pub fn default_window(&self) -> Duration {
        Duration::from_secs(u64::from(self.default_keep_alive))
    }

    /// Create or replace the session for `endpoint`, owned by this broker.
    /// A keep-alive of zero falls back to the configured default.
    pub async fn connect(
        &self,
        client_id: &str,
        endpoint: &Endpoint,
        keep_alive_secs: u16,
    ) -> Result<ClientSession, StoreError> {
        let keep_alive_secs = if keep_alive_secs == 0 {
            self.default_keep_alive
        } else {
            keep_alive_secs
        };

        if let Some(previous) = self.bound_endpoint(client_id).await? {
            if previous != *endpoint {
                debug!(client_id, %previous, %endpoint, "client moved to a new endpoint");
                self.unbind(&previous).await?;
            }
        }

        let session = ClientSession {
            client_id: client_id.to_string(),
            owner_broker_id: self.broker_id.clone(),
            endpoint: *endpoint,
            last_activity: self.clock.now_millis(),
            keep_alive_secs,
            pending_disconnect: false,
        };
        let info = keys::client_info(endpoint);
        self.store.del(&info).await?;
        self.store.hset(&info, &session.to_fields()).await?;
        self.refresh(&session).await?;
        Ok(session)
    }

    /// The session bound to `endpoint`, if it has not expired.
    pub async fn session(&self, endpoint: &Endpoint) -> Result<Option<ClientSession>, StoreError> {
        let fields = self.store.hgetall(&keys::client_info(endpoint)).await?;
        Ok(ClientSession::from_fields(*endpoint, &fields))
    }

    /// Record inbound activity from `endpoint`. This broker takes over
    /// ownership, since it is the one that just heard from the device.
    pub async fn touch(&self, endpoint: &Endpoint) -> Result<Option<ClientSession>, StoreError> {
        let Some(mut session) = self.session(endpoint).await? else {
            return Ok(None);
        };
        session.last_activity = self.clock.now_millis();
        session.owner_broker_id = self.broker_id.clone();
        self.store
            .hset(
                &keys::client_info(endpoint),
                &ClientSession::activity_fields(&self.broker_id, session.last_activity),
            )
            .await?;
        self.refresh(&session).await?;
        Ok(Some(session))
    }

    /// Touch the session and flag it as going away; fan-out skips it from
    /// here on.
    pub async fn mark_disconnecting(
        &self,
        endpoint: &Endpoint,
    ) -> Result<Option<ClientSession>, StoreError> {
        let Some(mut session) = self.touch(endpoint).await? else {
            return Ok(None);
        };
        self.store
            .hset(
                &keys::client_info(endpoint),
                &ClientSession::disconnect_fields(),
            )
            .await?;
        session.pending_disconnect = true;
        Ok(Some(session))
    }

    /// Find the live session for `client_id`. Fails to resolve when the
    /// binding expired, the endpoint now belongs to another client, or the
    /// owning broker has stopped renewing its liveness record.
    pub async fn resolve(&self, client_id: &str) -> Result<Option<ClientSession>, StoreError> {
        let Some(endpoint) = self.bound_endpoint(client_id).await? else {
            return Ok(None);
        };
        let Some(session) = self.session(&endpoint).await? else {
            return Ok(None);
        };
        if session.client_id != client_id {
            return Ok(None);
        }
        if !self.is_alive(&session.owner_broker_id).await? {
            debug!(client_id, owner = %session.owner_broker_id, "owner broker is gone");
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Endpoint of the live session for `client_id`, see `resolve`.
    pub async fn resolve_endpoint(&self, client_id: &str) -> Result<Option<Endpoint>, StoreError> {
        Ok(self.resolve(client_id).await?.map(|session| session.endpoint))
    }

    /// Whether `broker_id` has renewed its liveness record recently.
    pub async fn is_alive(&self, broker_id: &str) -> Result<bool, StoreError> {
        Ok(self.store.get(broker_id).await?.is_some())
    }

    /// Track an endpoint with no session so queued replies still drain.
    pub async fn adopt(&self, endpoint: &Endpoint, window: Duration) -> Result<(), StoreError> {
        let expires = self.clock.now_secs() + window.as_secs() as i64 + 1;
        self.store
            .zadd(
                &keys::owned_clients(&self.broker_id),
                &endpoint.key(),
                expires as f64,
            )
            .await
    }

    /// Endpoints this broker currently drains, soonest-expiring first.
    pub async fn owned_endpoints(&self) -> Result<Vec<Endpoint>, StoreError> {
        let members = self
            .store
            .zrange(&keys::owned_clients(&self.broker_id))
            .await?;
        Ok(members
            .into_iter()
            .filter_map(|key| match key.parse::<Endpoint>() {
                Ok(endpoint) => Some(endpoint),
                Err(e) => {
                    warn!(error = %e, "skipping malformed owned client");
                    None
                }
            })
            .collect())
    }

    /// Tear down the session on `endpoint`. When the client is still bound
    /// to this endpoint it is gone for good: its binding and subscriptions
    /// are removed too. Returns the session that was removed, if any.
    pub async fn remove(&self, endpoint: &Endpoint) -> Result<Option<ClientSession>, StoreError> {
        let session = self.session(endpoint).await?;
        if let Some(session) = &session {
            if self.bound_endpoint(&session.client_id).await? == Some(*endpoint) {
                self.store.del(&keys::socket(&session.client_id)).await?;
                self.subscriptions.clear(&session.client_id).await?;
            }
        }
        self.unbind(endpoint).await?;
        Ok(session)
    }

    /// Forget `endpoint` without touching the client behind it.
    async fn unbind(&self, endpoint: &Endpoint) -> Result<(), StoreError> {
        self.store.del(&keys::client_info(endpoint)).await?;
        self.store
            .zrem(&keys::owned_clients(&self.broker_id), &endpoint.key())
            .await?;
        Ok(())
    }

    /// Renew this broker's liveness record and drop owned endpoints whose
    /// expiry has passed. Returns how many were dropped.
    pub async fn renew_liveness(&self, interval: Duration) -> Result<usize, StoreError> {
        let ttl = interval + Duration::from_secs(1);
        let now = self.clock.now_secs();
        self.store
            .set_ex(&self.broker_id, now.to_string().as_bytes(), ttl)
            .await?;

        let owned = keys::owned_clients(&self.broker_id);
        self.store.expire(&owned, ttl).await?;
        let swept = self
            .store
            .zrem_range_by_score(&owned, 0.0, now as f64)
            .await?;
        if swept > 0 {
            debug!(swept, "dropped expired endpoints");
        }
        Ok(swept)
    }

    async fn bound_endpoint(&self, client_id: &str) -> Result<Option<Endpoint>, StoreError> {
        let Some(raw) = self.store.get(&keys::socket(client_id)).await? else {
            return Ok(None);
        };
        match String::from_utf8_lossy(&raw).parse::<Endpoint>() {
            Ok(endpoint) => Ok(Some(endpoint)),
            Err(e) => {
                warn!(client_id, error = %e, "ignoring malformed endpoint binding");
                Ok(None)
            }
        }
    }

    async fn refresh(&self, session: &ClientSession) -> Result<(), StoreError> {
        let ttl = session.record_ttl();
        let endpoint_key = session.endpoint.key();
        self.store
            .expire(&keys::client_info(&session.endpoint), ttl)
            .await?;
        self.store
            .expire(&keys::subscriptions(&session.client_id), ttl)
            .await?;
        self.store
            .set_ex(
                &keys::socket(&session.client_id),
                endpoint_key.as_bytes(),
                ttl,
            )
            .await?;
        let expires = self.clock.now_secs() + ttl.as_secs() as i64;
        self.store
            .zadd(
                &keys::owned_clients(&self.broker_id),
                &endpoint_key,
                expires as f64,
            )
            .await
    }
}
