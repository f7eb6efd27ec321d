use std::io;

use async_trait::async_trait;
use tokio::net::UdpSocket;

use super::Endpoint;

/// Where drained frames go. The gateway sends through its UDP socket; tests
/// plug in a recorder.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send_frame(&self, frame: &[u8], destination: &Endpoint) -> io::Result<()>;
}

#[async_trait]
impl FrameSink for UdpSocket {
    async fn send_frame(&self, frame: &[u8], destination: &Endpoint) -> io::Result<()> {
        let sent = self.send_to(frame, destination.addr()).await?;
        if sent != frame.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram: {sent} of {} bytes", frame.len()),
            ));
        }
        Ok(())
    }
}
