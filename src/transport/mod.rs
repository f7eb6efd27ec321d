//! The `transport` module moves frames between devices and the broker over
//! UDP.
//!
//! Inbound datagrams are decoded and dispatched one at a time by `serve`.
//! Outbound frames never leave from a handler: the drain loop pops them from
//! the store and writes them through a `FrameSink`.

pub mod endpoint;
pub mod sink;
pub mod udp;

pub use endpoint::Endpoint;
pub use sink::FrameSink;
pub use udp::{bind, serve};

#[cfg(test)]
mod tests;
