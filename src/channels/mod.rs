//! # Channels Module
//!
//! The channel-processing pipeline of the transmitter.
//!
//! This module handles:
//! - Per-axis calibration (physical ADC range to nominal pulse range)
//! - Center deadzone, dual-rate scaling and trim composition
//! - Final safety clamp to the hard pulse bounds
//! - Bounded trim and rate adjustment

pub mod calibration;
pub mod processor;
pub mod trim_rate;

/// Number of control channels (and analog axes).
pub const NUM_CHANNELS: usize = 4;

/// Control channel identifier.
///
/// The discriminant is the index used by every per-channel array and by the
/// acquisition source (raw sample `i` feeds the channel with index `i`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Throttle = 0,
    Yaw = 1,
    Roll = 2,
    Pitch = 3,
}

impl ChannelId {
    /// All channels in index order.
    pub const ALL: [ChannelId; NUM_CHANNELS] = [
        ChannelId::Throttle,
        ChannelId::Yaw,
        ChannelId::Roll,
        ChannelId::Pitch,
    ];

    /// Index of this channel in per-channel arrays.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Channel for an array index, if in range.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_transmitter::channels::ChannelId;
    ///
    /// assert_eq!(ChannelId::from_index(1), Some(ChannelId::Yaw));
    /// assert_eq!(ChannelId::from_index(4), None);
    /// ```
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Short label used on the status screen.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ChannelId::Throttle => "THR",
            ChannelId::Yaw => "YAW",
            ChannelId::Roll => "ROL",
            ChannelId::Pitch => "PIT",
        }
    }
}

/// Processed pulse values for all four channels, indexed by [`ChannelId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelValues(pub [i32; NUM_CHANNELS]);

impl ChannelValues {
    /// Value for a single channel.
    #[inline]
    #[must_use]
    pub fn get(&self, channel: ChannelId) -> i32 {
        self.0[channel.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_indices_are_stable() {
        assert_eq!(ChannelId::Throttle.index(), 0);
        assert_eq!(ChannelId::Yaw.index(), 1);
        assert_eq!(ChannelId::Roll.index(), 2);
        assert_eq!(ChannelId::Pitch.index(), 3);
    }

    #[test]
    fn test_from_index_round_trips_all() {
        for ch in ChannelId::ALL {
            assert_eq!(ChannelId::from_index(ch.index()), Some(ch));
        }
        assert_eq!(ChannelId::from_index(NUM_CHANNELS), None);
    }

    #[test]
    fn test_channel_values_get() {
        let values = ChannelValues([1100, 1200, 1300, 1400]);
        assert_eq!(values.get(ChannelId::Throttle), 1100);
        assert_eq!(values.get(ChannelId::Pitch), 1400);
    }
}
