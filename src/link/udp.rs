//! # UDP Link
//!
//! Sends channel frames as UDP datagrams to a fixed peer, e.g. a Wi-Fi
//! receiver on the model or a bridge board that forwards them over its own
//! radio.

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tracing::{debug, info};

use super::transport::RadioLink;
use crate::error::{Result, TransmitterError};

/// UDP socket connected to the paired receiver.
#[derive(Debug)]
pub struct UdpLink {
    socket: UdpSocket,
    peer: String,
}

impl UdpLink {
    /// Binds `bind` and connects the socket to `peer`.
    ///
    /// # Errors
    ///
    /// Returns `Link` error if the socket cannot be bound or the peer
    /// address cannot be resolved.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rc_transmitter::link::udp::UdpLink;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let link = UdpLink::open("0.0.0.0:0", "192.168.4.1:4210").await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn open(bind: &str, peer: &str) -> Result<Self> {
        let socket = UdpSocket::bind(bind)
            .await
            .map_err(|e| TransmitterError::Link(format!("Failed to bind {}: {}", bind, e)))?;
        socket
            .connect(peer)
            .await
            .map_err(|e| TransmitterError::Link(format!("Failed to connect to {}: {}", peer, e)))?;

        info!("UDP link ready ({} -> {})", bind, peer);
        Ok(Self {
            socket,
            peer: peer.to_string(),
        })
    }
}

#[async_trait]
impl RadioLink for UdpLink {
    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        let written = self
            .socket
            .send(frame)
            .await
            .map_err(|e| {
                TransmitterError::Link(format!("Failed to send to {}: {}", self.peer, e))
            })?;

        if written != frame.len() {
            return Err(TransmitterError::Link(format!(
                "Short datagram to {}: {} of {} bytes",
                self.peer,
                written,
                frame.len()
            )));
        }

        debug!("Sent frame ({} bytes) to {}", written, self.peer);
        Ok(())
    }

    fn peer(&self) -> String {
        self.peer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_udp_link_delivers_datagram() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer = receiver.local_addr().unwrap().to_string();

        let mut link = UdpLink::open("127.0.0.1:0", &peer).await.unwrap();
        link.send(&[1, 2, 3, 4, 5, 6, 7, 8]).await.unwrap();

        let mut buf = [0u8; 16];
        let len = receiver.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(link.peer(), peer);
    }

    #[tokio::test]
    async fn test_open_with_invalid_bind_returns_error() {
        let result = UdpLink::open("not-an-address", "127.0.0.1:4210").await;
        match result {
            Err(TransmitterError::Link(msg)) => assert!(msg.contains("Failed to bind")),
            other => panic!("Expected Link error, got: {:?}", other),
        }
    }
}
