//! # Calibration Module
//!
//! Maps physical stick readings onto the nominal pulse range.
//!
//! Every axis carries the raw ADC codes measured at its mechanical limits and
//! at rest. A raw sample is first clamped into `[min, max]` (the acquisition
//! source is never trusted) and then projected linearly onto the nominal
//! pulse range, reversed for inverted axes.
//!
//! ## Usage
//!
//! ```
//! use rc_transmitter::channels::calibration::{AxisCalibration, PulseRange};
//!
//! let cal = AxisCalibration::new(12065, 15314, 13689, false).unwrap();
//! let nominal = PulseRange::NOMINAL;
//!
//! assert_eq!(cal.map_to_pulse(15314, &nominal), 2000);
//! assert_eq!(cal.map_to_pulse(12065, &nominal), 1000);
//! // Out-of-range samples saturate at the limits
//! assert_eq!(cal.map_to_pulse(20000, &nominal), 2000);
//! ```

use crate::error::{Result, TransmitterError};

use super::{ChannelId, NUM_CHANNELS};

/// A pulse-width interval with its neutral point, in microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseRange {
    pub min: i32,
    pub center: i32,
    pub max: i32,
}

impl PulseRange {
    /// Nominal stick range (1000-2000, center 1500).
    pub const NOMINAL: PulseRange = PulseRange {
        min: 1000,
        center: 1500,
        max: 2000,
    };

    /// Extended hard safety range (500-2500).
    pub const EXTENDED: PulseRange = PulseRange {
        min: 500,
        center: 1500,
        max: 2500,
    };

    /// Clamps a value into this range.
    #[inline]
    #[must_use]
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }
}

/// Factory calibration of one analog axis.
///
/// Immutable once constructed; `min < center < max` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisCalibration {
    min: i32,
    max: i32,
    center: i32,
    invert: bool,
}

impl AxisCalibration {
    /// Creates an axis calibration.
    ///
    /// # Arguments
    ///
    /// * `min` - Raw code at the low mechanical limit
    /// * `max` - Raw code at the high mechanical limit
    /// * `center` - Raw code with the stick at rest
    /// * `invert` - Whether increasing raw codes should decrease the output
    ///
    /// # Errors
    ///
    /// Returns `Input` error unless `min < center < max`.
    pub fn new(min: i32, max: i32, center: i32, invert: bool) -> Result<Self> {
        if !(min < center && center < max) {
            return Err(TransmitterError::Input(format!(
                "axis calibration requires min < center < max (got {} / {} / {})",
                min, center, max
            )));
        }
        Ok(Self {
            min,
            max,
            center,
            invert,
        })
    }

    #[must_use]
    pub fn min(&self) -> i32 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> i32 {
        self.max
    }

    #[must_use]
    pub fn center(&self) -> i32 {
        self.center
    }

    #[must_use]
    pub fn invert(&self) -> bool {
        self.invert
    }

    /// Clamps a raw sample into the calibrated physical range.
    #[inline]
    #[must_use]
    pub fn clamp_raw(&self, raw: i32) -> i32 {
        raw.clamp(self.min, self.max)
    }

    /// Clamps `raw` and projects it linearly onto `range.min..=range.max`.
    ///
    /// Integer arithmetic, division truncating toward zero. Inverted axes
    /// project onto the reversed interval.
    #[must_use]
    pub fn map_to_pulse(&self, raw: i32, range: &PulseRange) -> i32 {
        let raw = self.clamp_raw(raw) as i64;
        let (out_lo, out_hi) = if self.invert {
            (range.max as i64, range.min as i64)
        } else {
            (range.min as i64, range.max as i64)
        };
        let in_lo = self.min as i64;
        let in_span = self.max as i64 - in_lo;

        ((raw - in_lo) * (out_hi - out_lo) / in_span + out_lo) as i32
    }
}

/// Factory calibration for all four axes, indexed by [`ChannelId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationTable(pub [AxisCalibration; NUM_CHANNELS]);

impl CalibrationTable {
    /// Calibration of one channel's axis.
    #[must_use]
    pub fn axis(&self, channel: ChannelId) -> &AxisCalibration {
        &self.0[channel.index()]
    }
}

impl Default for CalibrationTable {
    /// Bench-measured constants for the stock gimbals.
    fn default() -> Self {
        let axis = |min, max, center, invert| AxisCalibration {
            min,
            max,
            center,
            invert,
        };
        Self([
            axis(12065, 15314, 13689, false),
            axis(11431, 14685, 13058, true),
            axis(12042, 15571, 13806, true),
            axis(11762, 15004, 13383, true),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttle_axis() -> AxisCalibration {
        AxisCalibration::new(12065, 15314, 13689, false).unwrap()
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_accepts_ordered_bounds() {
        let cal = throttle_axis();
        assert_eq!(cal.min(), 12065);
        assert_eq!(cal.max(), 15314);
        assert_eq!(cal.center(), 13689);
        assert!(!cal.invert());
    }

    #[test]
    fn test_new_rejects_center_outside_range() {
        assert!(AxisCalibration::new(100, 200, 250, false).is_err());
        assert!(AxisCalibration::new(100, 200, 100, false).is_err());
        assert!(AxisCalibration::new(100, 200, 200, false).is_err());
    }

    #[test]
    fn test_new_rejects_inverted_bounds() {
        let result = AxisCalibration::new(200, 100, 150, false);
        match result {
            Err(TransmitterError::Input(msg)) => assert!(msg.contains("min < center < max")),
            other => panic!("Expected Input error, got: {:?}", other),
        }
    }

    #[test]
    fn test_factory_table_satisfies_invariant() {
        for cal in CalibrationTable::default().0 {
            assert!(cal.min() < cal.center() && cal.center() < cal.max());
        }
    }

    #[test]
    fn test_factory_table_inversion() {
        let table = CalibrationTable::default();
        assert!(!table.axis(ChannelId::Throttle).invert());
        assert!(table.axis(ChannelId::Yaw).invert());
        assert!(table.axis(ChannelId::Roll).invert());
        assert!(table.axis(ChannelId::Pitch).invert());
    }

    // ==================== Mapping Tests ====================

    #[test]
    fn test_map_endpoints() {
        let cal = throttle_axis();
        assert_eq!(cal.map_to_pulse(12065, &PulseRange::NOMINAL), 1000);
        assert_eq!(cal.map_to_pulse(15314, &PulseRange::NOMINAL), 2000);
    }

    #[test]
    fn test_map_center_truncates() {
        // 1624 * 1000 / 3249 = 499.8 -> 499
        let cal = throttle_axis();
        assert_eq!(cal.map_to_pulse(13689, &PulseRange::NOMINAL), 1499);
    }

    #[test]
    fn test_map_inverted_endpoints() {
        let cal = AxisCalibration::new(12065, 15314, 13689, true).unwrap();
        assert_eq!(cal.map_to_pulse(12065, &PulseRange::NOMINAL), 2000);
        assert_eq!(cal.map_to_pulse(15314, &PulseRange::NOMINAL), 1000);
    }

    #[test]
    fn test_map_saturates_below_min() {
        let cal = throttle_axis();
        let at_min = cal.map_to_pulse(cal.min(), &PulseRange::NOMINAL);
        for raw in [i32::MIN, -1, 0, 5000, 12064] {
            assert_eq!(cal.map_to_pulse(raw, &PulseRange::NOMINAL), at_min);
        }
    }

    #[test]
    fn test_map_saturates_above_max() {
        let cal = throttle_axis();
        let at_max = cal.map_to_pulse(cal.max(), &PulseRange::NOMINAL);
        for raw in [15315, 20000, 32767, i32::MAX] {
            assert_eq!(cal.map_to_pulse(raw, &PulseRange::NOMINAL), at_max);
        }
    }

    #[test]
    fn test_map_monotonic_non_inverted() {
        let cal = throttle_axis();
        let mut prev = i32::MIN;
        for raw in (11000..16000).step_by(7) {
            let mapped = cal.map_to_pulse(raw, &PulseRange::NOMINAL);
            assert!(mapped >= prev, "raw {} decreased output", raw);
            prev = mapped;
        }
    }

    #[test]
    fn test_map_monotonic_inverted() {
        let cal = AxisCalibration::new(11431, 14685, 13058, true).unwrap();
        let mut prev = i32::MAX;
        for raw in (11000..16000).step_by(7) {
            let mapped = cal.map_to_pulse(raw, &PulseRange::NOMINAL);
            assert!(mapped <= prev, "raw {} increased output", raw);
            prev = mapped;
        }
    }

    #[test]
    fn test_pulse_range_clamp() {
        assert_eq!(PulseRange::EXTENDED.clamp(3000), 2500);
        assert_eq!(PulseRange::EXTENDED.clamp(100), 500);
        assert_eq!(PulseRange::NOMINAL.clamp(1234), 1234);
    }
}
