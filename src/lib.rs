//! # snbroker
//!
//! `snbroker` is an MQTT-SN style gateway broker. Sensors and other small
//! devices talk to it over UDP using the compact binary MQTT-SN framing; the
//! broker tracks their sessions, hands out numeric topic ids, and fans
//! published messages out to every matching subscriber.
//!
//! Broker instances keep no client state in memory. Everything lives in a
//! shared coordination store, so several processes can sit behind one
//! address and any of them can deliver to any device.
//!
//! ## Core Modules
//!
//! - `broker`: the dispatcher, the typed views over shared state, and the
//!   drain / keep-alive loops.
//! - `client`: the per-endpoint session record.
//! - `codec`: decoding and encoding of wire frames, plus reply constructors.
//! - `config`: loading settings from file and environment.
//! - `store`: the `StateStore` capability and its Redis, sled and in-memory
//!   backends.
//! - `transport`: UDP receive loop, endpoints and the outbound `FrameSink`.
//! - `utils`: shared error type, logging setup and clocks.

pub mod broker;
pub mod client;
pub mod codec;
pub mod config;
pub mod store;
pub mod transport;
pub mod utils;
