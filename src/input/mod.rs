//! # Input Module
//!
//! Stick and keypad acquisition plus the input conditioning built on it.
//!
//! This module handles:
//! - The acquisition collaborators ([`AnalogSource`], [`DigitalInputs`])
//! - A degraded stand-in used when a peripheral fails to come up
//! - Linux joystick backend via evdev
//! - Debouncing keypad pins into press edges
//! - Rotary encoder decoding (polled and interrupt-style)

pub mod debounce;
pub mod encoder;
pub mod evdev_source;

use crate::channels::calibration::CalibrationTable;
use crate::channels::{ChannelId, NUM_CHANNELS};
use crate::error::Result;

#[cfg(test)]
use mockall::automock;

/// Logic level of a digital input pin.
///
/// Keypad inputs are pulled up: a pressed button reads [`Level::Low`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    High,
    Low,
}

impl Level {
    /// Level of an active-low input.
    #[inline]
    #[must_use]
    pub fn from_active(active: bool) -> Self {
        if active {
            Level::Low
        } else {
            Level::High
        }
    }

    #[inline]
    #[must_use]
    pub fn is_low(self) -> bool {
        self == Level::Low
    }
}

/// Provider of raw analog samples, one per stick axis.
///
/// Each call is independent; values may be stale or noisy and are never
/// range-checked here.
#[cfg_attr(test, automock)]
pub trait AnalogSource: Send {
    /// Reads the raw sample of axis `index` (`0..4`, channel index order).
    fn read_channel(&mut self, index: usize) -> Result<i32>;
}

/// Provider of raw digital pin levels.
#[cfg_attr(test, automock)]
pub trait DigitalInputs: Send {
    /// Reads pin `index`. Pull-ups make idle pins read [`Level::High`].
    fn read_pin(&mut self, index: usize) -> Result<Level>;
}

impl<T: AnalogSource + ?Sized> AnalogSource for Box<T> {
    fn read_channel(&mut self, index: usize) -> Result<i32> {
        (**self).read_channel(index)
    }
}

impl<T: DigitalInputs + ?Sized> DigitalInputs for Box<T> {
    fn read_pin(&mut self, index: usize) -> Result<Level> {
        (**self).read_pin(index)
    }
}

/// Stand-in for a missing acquisition peripheral.
///
/// Sticks report their calibrated rest position and every pin reads
/// [`Level::High`], so the transmitter keeps emitting neutral frames.
#[derive(Debug, Clone)]
pub struct IdleInputs {
    centers: [i32; NUM_CHANNELS],
}

impl IdleInputs {
    #[must_use]
    pub fn new(calibration: &CalibrationTable) -> Self {
        let mut centers = [0; NUM_CHANNELS];
        for ch in ChannelId::ALL {
            centers[ch.index()] = calibration.axis(ch).center();
        }
        Self { centers }
    }
}

impl AnalogSource for IdleInputs {
    fn read_channel(&mut self, index: usize) -> Result<i32> {
        Ok(self.centers.get(index).copied().unwrap_or_default())
    }
}

impl DigitalInputs for IdleInputs {
    fn read_pin(&mut self, _index: usize) -> Result<Level> {
        Ok(Level::High)
    }
}
