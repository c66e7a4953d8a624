//! # Trim and Dual-Rate Store
//!
//! Per-channel trim offsets and dual-rate multipliers.
//!
//! Both values only change through quantized steps and saturate silently at
//! their bounds: pushing past a limit leaves the value exactly at the limit.
//! Rates are held as integer percent (100 = 1.0) so repeated steps never drift.
//!
//! ## Usage
//!
//! ```
//! use rc_transmitter::channels::ChannelId;
//! use rc_transmitter::channels::trim_rate::{TrimRateLimits, TrimRateStore};
//!
//! let mut store = TrimRateStore::new(TrimRateLimits::default());
//! store.adjust_trim(ChannelId::Yaw, 1);
//! assert_eq!(store.trim(ChannelId::Yaw), 5);
//!
//! store.adjust_rate(ChannelId::Roll, -3);
//! assert_eq!(store.rate_pct(ChannelId::Roll), 70);
//! ```

use super::{ChannelId, NUM_CHANNELS};

/// Neutral rate (1.0).
pub const RATE_NEUTRAL_PCT: i32 = 100;

/// Step sizes and bounds for trim and rate edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimRateLimits {
    /// Trim change per step (pulse units).
    pub trim_step: i32,
    /// Trim bound; trim stays within `[-trim_max, trim_max]`.
    pub trim_max: i32,
    /// Rate change per step, in percent.
    pub rate_step_pct: i32,
    /// Lowest rate, in percent.
    pub rate_min_pct: i32,
    /// Highest rate, in percent.
    pub rate_max_pct: i32,
}

impl Default for TrimRateLimits {
    fn default() -> Self {
        Self {
            trim_step: 5,
            trim_max: 100,
            rate_step_pct: 10,
            rate_min_pct: 20,
            rate_max_pct: 200,
        }
    }
}

/// Mutable trim and rate tables, reset to neutral at boot.
#[derive(Debug, Clone)]
pub struct TrimRateStore {
    limits: TrimRateLimits,
    trim: [i32; NUM_CHANNELS],
    rate_pct: [i32; NUM_CHANNELS],
}

impl TrimRateStore {
    /// Creates a store with zero trim and 100 % rate on every channel.
    #[must_use]
    pub fn new(limits: TrimRateLimits) -> Self {
        Self {
            limits,
            trim: [0; NUM_CHANNELS],
            rate_pct: [RATE_NEUTRAL_PCT; NUM_CHANNELS],
        }
    }

    #[must_use]
    pub fn limits(&self) -> &TrimRateLimits {
        &self.limits
    }

    /// Current trim offset of a channel.
    #[inline]
    #[must_use]
    pub fn trim(&self, channel: ChannelId) -> i32 {
        self.trim[channel.index()]
    }

    /// Current rate of a channel, in percent.
    #[inline]
    #[must_use]
    pub fn rate_pct(&self, channel: ChannelId) -> i32 {
        self.rate_pct[channel.index()]
    }

    /// Current rate of a channel as a multiplier.
    #[must_use]
    pub fn rate(&self, channel: ChannelId) -> f32 {
        self.rate_pct(channel) as f32 / 100.0
    }

    /// All trims in channel order.
    #[must_use]
    pub fn trims(&self) -> [i32; NUM_CHANNELS] {
        self.trim
    }

    /// All rates (percent) in channel order.
    #[must_use]
    pub fn rates_pct(&self) -> [i32; NUM_CHANNELS] {
        self.rate_pct
    }

    /// Moves a channel's trim by `delta_steps` steps, saturating at the bound.
    ///
    /// Returns the new trim.
    pub fn adjust_trim(&mut self, channel: ChannelId, delta_steps: i32) -> i32 {
        let max = self.limits.trim_max;
        let slot = &mut self.trim[channel.index()];
        let target = (*slot as i64) + (delta_steps as i64) * (self.limits.trim_step as i64);
        *slot = target.clamp(-(max as i64), max as i64) as i32;
        *slot
    }

    /// Moves a channel's rate by `delta_steps` steps, saturating at the bounds.
    ///
    /// Returns the new rate in percent.
    pub fn adjust_rate(&mut self, channel: ChannelId, delta_steps: i32) -> i32 {
        let (lo, hi) = (self.limits.rate_min_pct, self.limits.rate_max_pct);
        let slot = &mut self.rate_pct[channel.index()];
        let target = (*slot as i64) + (delta_steps as i64) * (self.limits.rate_step_pct as i64);
        *slot = target.clamp(lo as i64, hi as i64) as i32;
        *slot
    }
}

impl Default for TrimRateStore {
    fn default() -> Self {
        Self::new(TrimRateLimits::default())
    }
}
