//! # Evdev Input Backend
//!
//! Reads sticks and keypad from a Linux input device (USB gimbal board,
//! joystick or game controller) through evdev.
//!
//! ## Mapping
//!
//! - Axis `i` (channel index order) is the absolute axis `axis_codes[i]`;
//!   its current value is the raw sample.
//! - Pin `i` is the key `button_codes[i]`; a held key reads [`Level::Low`].
//!   Pins without a configured key read [`Level::High`].
//!
//! ## Device Selection
//!
//! With an explicit path that device is opened. Otherwise all
//! `/dev/input/event*` nodes are scanned in sorted order and the first one
//! exposing every configured axis is used.

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::Path;
use tracing::{debug, info};

use super::{AnalogSource, DigitalInputs, Level};
use crate::channels::NUM_CHANNELS;
use crate::error::{Result, TransmitterError};

/// Input directory scanned for event devices.
const INPUT_DIR: &str = "/dev/input";

/// Stick and keypad reader backed by an evdev device.
pub struct EvdevInputs {
    device: Device,
    device_path: String,
    axis_codes: [u16; NUM_CHANNELS],
    button_codes: Vec<u16>,
}

impl std::fmt::Debug for EvdevInputs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevInputs")
            .field("device_path", &self.device_path)
            .field("axis_codes", &self.axis_codes)
            .field("button_codes", &self.button_codes)
            .finish_non_exhaustive()
    }
}

impl EvdevInputs {
    /// Opens the configured device, or auto-detects one when `device_path`
    /// is empty.
    ///
    /// # Errors
    ///
    /// - `InputDeviceNotFound`: no device exposes the configured axes
    /// - `Input`: the explicit device cannot be opened or lacks an axis
    pub fn open(
        device_path: &str,
        axis_codes: [u16; NUM_CHANNELS],
        button_codes: &[u16],
    ) -> Result<Self> {
        if !device_path.is_empty() {
            let device = Device::open(device_path).map_err(|e| {
                TransmitterError::Input(format!("Failed to open {}: {}", device_path, e))
            })?;
            if !has_axes(&device, &axis_codes) {
                return Err(TransmitterError::Input(format!(
                    "{} does not expose axes {:?}",
                    device_path, axis_codes
                )));
            }
            info!("Opened input device at {}", device_path);
            return Ok(Self::with_device(device, device_path.to_string(), axis_codes, button_codes));
        }

        let input_dir = Path::new(INPUT_DIR);
        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| TransmitterError::Input(format!("Failed to read {}: {}", INPUT_DIR, e)))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with("event"))
            })
            .collect();
        entries.sort();

        for path in entries {
            match Device::open(&path) {
                Ok(device) => {
                    debug!("Found input device: {} ({:?})", path.display(), device.name());
                    if has_axes(&device, &axis_codes) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Using input device at {}", device_path);
                        return Ok(Self::with_device(device, device_path, axis_codes, button_codes));
                    }
                }
                Err(e) => debug!("Could not open {}: {}", path.display(), e),
            }
        }

        Err(TransmitterError::InputDeviceNotFound(format!(
            "no device in {} exposes axes {:?}",
            INPUT_DIR, axis_codes
        )))
    }

    fn with_device(
        device: Device,
        device_path: String,
        axis_codes: [u16; NUM_CHANNELS],
        button_codes: &[u16],
    ) -> Self {
        Self {
            device,
            device_path,
            axis_codes,
            button_codes: button_codes.to_vec(),
        }
    }

    /// Path of the opened device.
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

fn has_axes(device: &Device, codes: &[u16]) -> bool {
    device.supported_absolute_axes().is_some_and(|axes| {
        codes
            .iter()
            .all(|&code| axes.contains(AbsoluteAxisType(code)))
    })
}

impl AnalogSource for EvdevInputs {
    fn read_channel(&mut self, index: usize) -> Result<i32> {
        let code = *self
            .axis_codes
            .get(index)
            .ok_or_else(|| TransmitterError::Input(format!("axis index {} out of range", index)))?;
        let state = self
            .device
            .get_abs_state()
            .map_err(|e| TransmitterError::Input(format!("Failed to read axes: {}", e)))?;
        state
            .get(usize::from(code))
            .map(|info| info.value)
            .ok_or_else(|| TransmitterError::Input(format!("axis code {} out of range", code)))
    }
}

impl DigitalInputs for EvdevInputs {
    fn read_pin(&mut self, index: usize) -> Result<Level> {
        let Some(&code) = self.button_codes.get(index) else {
            return Ok(Level::High);
        };
        let keys = self
            .device
            .get_key_state()
            .map_err(|e| TransmitterError::Input(format!("Failed to read keys: {}", e)))?;
        Ok(Level::from_active(keys.contains(Key::new(code))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_explicit_device() {
        let result = EvdevInputs::open("/dev/input/nonexistent_event_99", [0, 1, 3, 4], &[]);
        match result {
            Err(TransmitterError::Input(msg)) => {
                assert!(msg.contains("/dev/input/nonexistent_event_99"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Input error, got: {:?}", other),
        }
    }

    // Only runs with a joystick attached
    #[test]
    #[ignore] // Run with: cargo test -- --ignored
    fn test_open_with_real_hardware() {
        match EvdevInputs::open("", [0, 1, 3, 4], &[304, 305]) {
            Ok(mut inputs) => {
                println!("Opened input device at: {}", inputs.device_path());
                assert!(inputs.read_channel(0).is_ok());
                assert!(inputs.read_pin(0).is_ok());
                assert_eq!(inputs.read_pin(7).unwrap(), Level::High);
            }
            Err(e) => println!("No input hardware detected: {}", e),
        }
    }
}
