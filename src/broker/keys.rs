//! Store key layout shared by every broker instance.

use crate::transport::Endpoint;

/// Sorted set: topic name -> numeric id (as score).
pub const TOPICS: &str = "topics";
/// Counter handing out candidate topic ids.
pub const TOPIC_IDS: &str = "topics:next_id";
/// Hash: topic name -> registration time in millis.
pub const TOPICS_REGISTERED: &str = "topics:registered";
/// Set of client ids holding at least one subscription.
pub const SUBSCRIBERS: &str = "subscribers";

/// Sorted set of endpoint keys this broker owns, scored by expiry (secs).
pub fn owned_clients(broker_id: &str) -> String {
    format!("{broker_id}:clients")
}

pub fn client_info(endpoint: &Endpoint) -> String {
    format!("{endpoint}:client_info")
}

pub fn socket(client_id: &str) -> String {
    format!("{client_id}:socket")
}

pub fn subscriptions(client_id: &str) -> String {
    format!("{client_id}:subscriptions")
}

pub fn queue(endpoint: &Endpoint) -> String {
    format!("{endpoint}:queue")
}
