use std::collections::HashMap;
use std::time::Duration;

use crate::transport::Endpoint;

const OWNER: &str = "owner";
const CLIENT_ID: &str = "client_id";
const LAST_MESSAGE: &str = "last_message";
const PENDING_DISCONNECT: &str = "pending_disconnect";
const KEEP_ALIVE: &str = "keep_alive";

/// Per-endpoint session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSession {
    pub client_id: String,
    /// Broker instance that last received traffic from this endpoint.
    pub owner_broker_id: String,
    pub endpoint: Endpoint,
    /// Milliseconds since the Unix epoch.
    pub last_activity: i64,
    pub keep_alive_secs: u16,
    pub pending_disconnect: bool,
}

impl ClientSession {
    /// The keep-alive window: how long the session, and anything queued for
    /// it, stays meaningful without further traffic.
    pub fn window(&self) -> Duration {
        Duration::from_secs(u64::from(self.keep_alive_secs))
    }

    /// Lifetime of the stored session records: the window plus one second.
    pub fn record_ttl(&self) -> Duration {
        self.window() + Duration::from_secs(1)
    }

    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            (OWNER, self.owner_broker_id.clone()),
            (CLIENT_ID, self.client_id.clone()),
            (LAST_MESSAGE, self.last_activity.to_string()),
            (PENDING_DISCONNECT, u8::from(self.pending_disconnect).to_string()),
            (KEEP_ALIVE, self.keep_alive_secs.to_string()),
        ]
    }

    /// Rebuild a session from its stored hash. Returns `None` when the hash
    /// is missing required fields, which is how an expired session looks.
    pub fn from_fields(endpoint: Endpoint, fields: &HashMap<String, String>) -> Option<Self> {
        let client_id = fields.get(CLIENT_ID)?.clone();
        let owner_broker_id = fields.get(OWNER)?.clone();
        let last_activity = fields
            .get(LAST_MESSAGE)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        let keep_alive_secs = fields
            .get(KEEP_ALIVE)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        let pending_disconnect = fields
            .get(PENDING_DISCONNECT)
            .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        Some(Self {
            client_id,
            owner_broker_id,
            endpoint,
            last_activity,
            keep_alive_secs,
            pending_disconnect,
        })
    }

    pub(crate) fn activity_fields(owner: &str, now_millis: i64) -> Vec<(&'static str, String)> {
        vec![
            (OWNER, owner.to_string()),
            (LAST_MESSAGE, now_millis.to_string()),
        ]
    }

    pub(crate) fn disconnect_fields() -> Vec<(&'static str, String)> {
        vec![(PENDING_DISCONNECT, "1".to_string())]
    }
}
