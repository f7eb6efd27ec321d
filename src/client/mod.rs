//! The `client` module defines how the gateway remembers a device between
//! datagrams.
//!
//! A `ClientSession` is the record kept under `<endpoint>:client_info`. It is
//! stored as a flat string hash so any broker instance (or an operator with a
//! Redis shell) can read it.

pub mod session;
pub use session::ClientSession;
