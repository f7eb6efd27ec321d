//! The `broker` module is the protocol core: it turns decoded messages into
//! store updates and queued replies.
//!
//! - `engine`: the `Broker` dispatcher and its per-type handlers
//! - `session`, `topic`, `subscription`, `queue`: typed views over the
//!   shared store, one per kind of state
//! - `liveness`: the drain and keep-alive loops

mod keys;

pub mod engine;
pub mod liveness;
pub mod queue;
pub mod session;
pub mod subscription;
pub mod topic;

pub use engine::{Broker, BrokerOptions, HandlerResult};
pub use queue::OutboundQueue;
pub use session::SessionRegistry;
pub use subscription::{SubscriptionIndex, is_wildcard, topic_matches};
pub use topic::{Topic, TopicId, TopicRegistry};
