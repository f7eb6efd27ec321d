use std::io;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tracing::{error, info};

use super::Endpoint;
use crate::broker::Broker;
use crate::config::GatewaySettings;

/// Largest frame the extended length header can describe.
pub const MAX_DATAGRAM: usize = u16::MAX as usize;

pub async fn bind(settings: &GatewaySettings) -> io::Result<Arc<UdpSocket>> {
    let socket = UdpSocket::bind((settings.listen_host.as_str(), settings.listen_port)).await?;
    info!(addr = %socket.local_addr()?, "gateway listening");
    Ok(Arc::new(socket))
}

/// Receive datagrams and hand each one to the broker, in arrival order.
/// Receive errors (such as ICMP unreachable reports surfacing on the
/// socket) are logged and skipped.
pub async fn serve(socket: Arc<UdpSocket>, broker: Arc<Broker>) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        let (len, addr) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                error!(error = %e, "receive failed");
                continue;
            }
        };
        broker.dispatch(&buf[..len], Endpoint::from(addr)).await;
    }
}
