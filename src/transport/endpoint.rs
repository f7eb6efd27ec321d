use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::utils::BrokerError;

/// Network address of a device, as seen on inbound datagrams.
///
/// The canonical text form (`ip:port`, IPv6 in brackets) is the endpoint key
/// used throughout the store, so it must round-trip through `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(SocketAddr);

impl Endpoint {
    pub fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.0
    }

    pub fn key(&self) -> String {
        self.0.to_string()
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl FromStr for Endpoint {
    type Err = BrokerError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        key.parse::<SocketAddr>()
            .map(Self)
            .map_err(|_| BrokerError::InvalidEndpoint(key.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
