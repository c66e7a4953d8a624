//! # Channel Frame
//!
//! The fixed-layout record handed to the radio on every send period.
//!
//! ## Wire Format
//!
//! Four signed 16-bit little-endian integers, 8 bytes total:
//!
//! ```text
//! Offset  Field
//! 0       throttle
//! 2       yaw
//! 4       pitch
//! 6       roll
//! ```
//!
//! Note the field order differs from the channel index order.

use bytes::{BufMut, BytesMut};
use serde::Serialize;

use crate::channels::{ChannelId, ChannelValues};

/// Encoded frame size in bytes.
pub const CHANNEL_FRAME_SIZE: usize = 8;

/// Processed channel values in transmit field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChannelFrame {
    pub throttle: i16,
    pub yaw: i16,
    pub pitch: i16,
    pub roll: i16,
}

impl ChannelFrame {
    /// Builds a frame from processed channel values.
    ///
    /// Values are saturated into the `i16` range; processed values always
    /// fit, so this only guards misconfigured clamp ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_transmitter::channels::ChannelValues;
    /// use rc_transmitter::link::frame::ChannelFrame;
    ///
    /// // Channel order: throttle, yaw, roll, pitch
    /// let frame = ChannelFrame::from_values(&ChannelValues([1100, 1200, 1300, 1400]));
    /// assert_eq!(frame.pitch, 1400);
    /// assert_eq!(frame.roll, 1300);
    /// ```
    #[must_use]
    pub fn from_values(values: &ChannelValues) -> Self {
        let field = |ch: ChannelId| values.get(ch).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
        Self {
            throttle: field(ChannelId::Throttle),
            yaw: field(ChannelId::Yaw),
            pitch: field(ChannelId::Pitch),
            roll: field(ChannelId::Roll),
        }
    }

    /// Encodes the frame into its 8-byte wire form.
    #[must_use]
    pub fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(CHANNEL_FRAME_SIZE);
        buf.put_i16_le(self.throttle);
        buf.put_i16_le(self.yaw);
        buf.put_i16_le(self.pitch);
        buf.put_i16_le(self.roll);
        buf
    }
}
