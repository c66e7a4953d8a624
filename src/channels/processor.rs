//! # Channel Processor
//!
//! Turns one raw stick sample into a final pulse value.
//!
//! The steps run in a fixed order, since reordering changes the rounding and
//! clamping outcome:
//!
//! 1. Clamp the raw sample to the axis' physical range
//! 2. Map linearly onto the nominal range (reversed for inverted axes)
//! 3. Snap to exact center inside the deadzone
//! 4. Scale the deflection from center by the channel rate
//! 5. Add the channel trim
//! 6. Clamp to the hard safety range
//!
//! Rate scaling is exact integer math, `deflection * rate_pct / 100`,
//! truncated toward zero.
//!
//! ## Simple mode
//!
//! With `use_rates` off the rate is fixed at 100 % and the final clamp uses the
//! nominal range instead of the extended one.

use super::calibration::{CalibrationTable, PulseRange};
use super::trim_rate::{TrimRateStore, RATE_NEUTRAL_PCT};
use super::{ChannelId, ChannelValues, NUM_CHANNELS};

/// Tunables of the processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorSettings {
    /// Half-width of the center deadzone, in pulse units.
    pub deadzone: i32,
    /// Nominal stick range the axes are mapped onto.
    pub nominal: PulseRange,
    /// Hard safety range applied after rate and trim.
    pub extended: PulseRange,
    /// Apply dual rates and clamp to the extended range.
    pub use_rates: bool,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            deadzone: 75,
            nominal: PulseRange::NOMINAL,
            extended: PulseRange::EXTENDED,
            use_rates: true,
        }
    }
}

/// Stateless channel pipeline over a fixed calibration table.
///
/// # Examples
///
/// ```
/// use rc_transmitter::channels::ChannelId;
/// use rc_transmitter::channels::calibration::CalibrationTable;
/// use rc_transmitter::channels::processor::{ChannelProcessor, ProcessorSettings};
/// use rc_transmitter::channels::trim_rate::TrimRateStore;
///
/// let settings = ProcessorSettings::default();
/// let processor = ChannelProcessor::new(CalibrationTable::default(), settings);
/// let store = TrimRateStore::default();
///
/// // Stick at rest
/// assert_eq!(processor.process(ChannelId::Throttle, 13689, &store), 1500);
/// // Full deflection
/// assert_eq!(processor.process(ChannelId::Throttle, 15314, &store), 2000);
/// ```
#[derive(Debug, Clone)]
pub struct ChannelProcessor {
    calibration: CalibrationTable,
    settings: ProcessorSettings,
}

impl ChannelProcessor {
    #[must_use]
    pub fn new(calibration: CalibrationTable, settings: ProcessorSettings) -> Self {
        Self {
            calibration,
            settings,
        }
    }

    #[must_use]
    pub fn calibration(&self) -> &CalibrationTable {
        &self.calibration
    }

    #[must_use]
    pub fn settings(&self) -> &ProcessorSettings {
        &self.settings
    }

    /// Range the final value is clamped to.
    #[must_use]
    pub fn output_range(&self) -> PulseRange {
        if self.settings.use_rates {
            self.settings.extended
        } else {
            self.settings.nominal
        }
    }

    /// Clamped, mapped and deadzone-snapped value before rate and trim.
    #[must_use]
    pub fn map_stick(&self, channel: ChannelId, raw: i32) -> i32 {
        let nominal = &self.settings.nominal;
        let mapped = self.calibration.axis(channel).map_to_pulse(raw, nominal);

        if (mapped - nominal.center).abs() < self.settings.deadzone {
            nominal.center
        } else {
            mapped
        }
    }

    /// Runs the full pipeline for one channel.
    ///
    /// # Arguments
    ///
    /// * `channel` - Channel whose calibration, trim and rate apply
    /// * `raw` - Raw sample from the acquisition source (any value)
    /// * `store` - Current trim and rate tables
    ///
    /// # Returns
    ///
    /// Pulse value within [`output_range`](Self::output_range).
    #[must_use]
    pub fn process(&self, channel: ChannelId, raw: i32, store: &TrimRateStore) -> i32 {
        let center = self.settings.nominal.center as i64;
        let deflection = self.map_stick(channel, raw) as i64 - center;

        let rate_pct = if self.settings.use_rates {
            store.rate_pct(channel)
        } else {
            RATE_NEUTRAL_PCT
        } as i64;
        let scaled = deflection * rate_pct / 100;

        let result = center + scaled + store.trim(channel) as i64;
        let range = self.output_range();
        result.clamp(range.min as i64, range.max as i64) as i32
    }

    /// Processes one raw sample per channel, in channel index order.
    #[must_use]
    pub fn process_all(&self, raw: &[i32; NUM_CHANNELS], store: &TrimRateStore) -> ChannelValues {
        let mut values = [0; NUM_CHANNELS];
        for ch in ChannelId::ALL {
            values[ch.index()] = self.process(ch, raw[ch.index()], store);
        }
        ChannelValues(values)
    }
}
