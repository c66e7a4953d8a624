//! Trait abstraction for the radio transport to enable testing

use async_trait::async_trait;

use crate::error::Result;

/// Fire-and-forget datagram sender to the paired receiver.
///
/// Delivery is unacknowledged at this level; an `Err` only reports that the
/// local hand-off failed.
#[async_trait]
pub trait RadioLink: Send {
    /// Hands one encoded frame to the radio.
    async fn send(&mut self, frame: &[u8]) -> Result<()>;

    /// Human-readable description of the peer (for logs).
    fn peer(&self) -> String;
}

#[async_trait]
impl<L: RadioLink + ?Sized> RadioLink for Box<L> {
    async fn send(&mut self, frame: &[u8]) -> Result<()> {
        (**self).send(frame).await
    }

    fn peer(&self) -> String {
        (**self).peer()
    }
}
