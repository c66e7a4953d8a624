//! # Serial Link
//!
//! Sends channel frames to a USB radio dongle that is already paired with the
//! receiver. Each frame is written as-is; the dongle forwards every write as
//! one radio datagram.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

use super::transport::RadioLink;
use crate::error::{Result, TransmitterError};

/// Default baud rate of the radio dongle.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial connection to the radio dongle.
pub struct SerialLink {
    port: tokio_serial::SerialStream,
    device_path: String,
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SerialLink {
    /// Opens `path` at `baud_rate`, 8N1, no flow control.
    ///
    /// # Errors
    ///
    /// Returns `Link` error if the port cannot be opened.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| TransmitterError::Link(format!("Failed to open {}: {}", path, e)))?;

        info!("Opened radio dongle at {} ({} baud)", path, baud_rate);
        Ok(Self {
            port,
            device_path: path.to_string(),
        })
    }

    /// Path of the opened serial device.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl RadioLink for SerialLink {
    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        self.port
            .write_all(frame)
            .await
            .map_err(|e| TransmitterError::Link(format!("Failed to write frame: {}", e)))?;

        self.port
            .flush()
            .await
            .map_err(|e| TransmitterError::Link(format!("Failed to flush serial port: {}", e)))?;

        debug!("Sent frame ({} bytes) to {}", frame.len(), self.device_path);
        Ok(())
    }

    fn peer(&self) -> String {
        self.device_path.clone()
    }
}
