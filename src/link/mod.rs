//! # Radio Link Module
//!
//! Everything between processed channel values and the air.
//!
//! This module handles:
//! - Packing processed values into the fixed 8-byte channel frame
//! - Gating sends to the configured period
//! - The [`transport::RadioLink`] collaborator and its UDP / serial backends

pub mod frame;
pub mod scheduler;
pub mod serial;
pub mod transport;
pub mod udp;

use tracing::info;

use crate::config::{LinkConfig, TransportKind};
use crate::error::Result;
use serial::SerialLink;
use transport::RadioLink;
use udp::UdpLink;

/// Opens the transport selected in `config`.
///
/// # Errors
///
/// Returns `Link` error if the transport cannot be opened.
pub async fn open_link(config: &LinkConfig) -> Result<Box<dyn RadioLink>> {
    let link: Box<dyn RadioLink> = match config.transport {
        TransportKind::Udp => Box::new(UdpLink::open(&config.bind, &config.peer).await?),
        TransportKind::Serial => Box::new(SerialLink::open(&config.serial_port, config.baud_rate)?),
    };
    info!("Radio link open to {}", link.peer());
    Ok(link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[tokio::test]
    async fn test_open_udp_link_from_config() {
        let mut config = Config::default().link;
        config.bind = "127.0.0.1:0".to_string();
        config.peer = "127.0.0.1:4210".to_string();

        let link = open_link(&config).await.unwrap();
        assert_eq!(link.peer(), "127.0.0.1:4210");
    }

    #[tokio::test]
    async fn test_open_serial_link_missing_device() {
        let mut config = Config::default().link;
        config.transport = TransportKind::Serial;
        config.serial_port = "/dev/nonexistent_radio_dongle".to_string();

        assert!(open_link(&config).await.is_err());
    }
}
