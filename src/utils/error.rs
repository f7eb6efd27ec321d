//! The `error` module defines the broker-level error type.
//!
//! Layer-specific errors (`CodecError`, `StoreError`) convert into
//! `BrokerError` so handlers and the process entry point can use `?` across
//! layers. Nothing here is ever sent to a client; the protocol only exposes
//! its own return codes.

use thiserror::Error;

use crate::codec::CodecError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("decode error: {0}")]
    Decode(#[from] CodecError),

    #[error("state store error: {0}")]
    Store(#[from] StoreError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(String),

    #[error("invalid endpoint key: {0}")]
    InvalidEndpoint(String),
}
