//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or a missing section) yields
//! the stock transmitter configuration.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::channels::calibration::{AxisCalibration, CalibrationTable, PulseRange};
use crate::channels::processor::ProcessorSettings;
use crate::channels::trim_rate::{TrimRateLimits, RATE_NEUTRAL_PCT};
use crate::channels::ChannelId;
use crate::error::{Result, TransmitterError};
use crate::input::encoder::EncoderStrategy;
use crate::menu::MAX_SCREENS;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub axes: AxesConfig,
    pub processing: ProcessingConfig,
    pub trim: TrimConfig,
    pub rate: RateConfig,
    pub input: InputConfig,
    pub menu: MenuConfig,
    pub link: LinkConfig,
    pub display: DisplayConfig,
    pub telemetry: TelemetryConfig,
    pub runtime: RuntimeConfig,
}

/// Factory calibration of one stick axis
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct AxisConfig {
    pub min: i32,
    pub max: i32,
    pub center: i32,
    #[serde(default)]
    pub invert: bool,
}

/// Calibration of all four axes
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AxesConfig {
    pub throttle: AxisConfig,
    pub yaw: AxisConfig,
    pub roll: AxisConfig,
    pub pitch: AxisConfig,
}

/// Channel pipeline configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ProcessingConfig {
    #[serde(default = "default_deadzone")]
    pub deadzone: i32,

    #[serde(default = "default_use_rates")]
    pub use_rates: bool,

    #[serde(default = "default_rc_min")]
    pub rc_min: i32,

    #[serde(default = "default_rc_max")]
    pub rc_max: i32,

    #[serde(default = "default_rc_center")]
    pub rc_center: i32,

    #[serde(default = "default_ext_min")]
    pub ext_min: i32,

    #[serde(default = "default_ext_max")]
    pub ext_max: i32,
}

/// Trim adjustment configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TrimConfig {
    #[serde(default = "default_trim_step")]
    pub step: i32,

    #[serde(default = "default_trim_max")]
    pub max: i32,
}

/// Dual-rate adjustment configuration (percent, 100 = 1.0)
#[derive(Debug, Deserialize, Clone)]
pub struct RateConfig {
    #[serde(default = "default_rate_step_pct")]
    pub step_pct: i32,

    #[serde(default = "default_rate_min_pct")]
    pub min_pct: i32,

    #[serde(default = "default_rate_max_pct")]
    pub max_pct: i32,
}

/// Where stick and keypad samples come from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InputSource {
    /// Linux input device via evdev
    Evdev,
    /// Sticks at rest, keypad released
    Idle,
}

/// Input acquisition configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    #[serde(default = "default_input_source")]
    pub source: InputSource,

    #[serde(default)]
    pub device_path: String,

    /// Absolute axis codes in channel order (throttle, yaw, roll, pitch)
    #[serde(default = "default_axis_codes")]
    pub axis_codes: [u16; 4],

    /// Key codes, index = keypad pin
    #[serde(default = "default_button_codes")]
    pub button_codes: Vec<u16>,

    #[serde(default = "default_button_count")]
    pub button_count: usize,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// Menu / rotary selector configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MenuConfig {
    #[serde(default = "default_encoder")]
    pub encoder: EncoderStrategy,

    #[serde(default = "default_encoder_pin_a")]
    pub encoder_pin_a: usize,

    #[serde(default = "default_encoder_pin_b")]
    pub encoder_pin_b: usize,

    #[serde(default = "default_counts_per_step")]
    pub counts_per_step: i32,

    #[serde(default = "default_screen_count")]
    pub screen_count: usize,

    #[serde(default = "default_encoder_poll_us")]
    pub encoder_poll_us: u64,
}

/// Radio transport kind
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Udp,
    Serial,
}

/// Radio link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_transport")]
    pub transport: TransportKind,

    #[serde(default = "default_peer")]
    pub peer: String,

    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_serial_port")]
    pub serial_port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_send_period_ms")]
    pub send_period_ms: u64,
}

/// Status display configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "default_display_enabled")]
    pub enabled: bool,

    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,
}

/// Telemetry (frame log) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_interval_ms")]
    pub log_interval_ms: u64,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

// Default value functions
fn default_deadzone() -> i32 { 75 }
fn default_use_rates() -> bool { true }
fn default_rc_min() -> i32 { 1000 }
fn default_rc_max() -> i32 { 2000 }
fn default_rc_center() -> i32 { 1500 }
fn default_ext_min() -> i32 { 500 }
fn default_ext_max() -> i32 { 2500 }

fn default_trim_step() -> i32 { 5 }
fn default_trim_max() -> i32 { 100 }

fn default_rate_step_pct() -> i32 { 10 }
fn default_rate_min_pct() -> i32 { 20 }
fn default_rate_max_pct() -> i32 { 200 }

fn default_input_source() -> InputSource { InputSource::Evdev }
// ABS_Y, ABS_X, ABS_RX, ABS_RY
fn default_axis_codes() -> [u16; 4] { [1, 0, 3, 4] }
// BTN_TRIGGER_HAPPY1..8, then BTN_TRIGGER_HAPPY9/10 for the selector A/B
fn default_button_codes() -> Vec<u16> { (0x2c0..0x2ca).collect() }
fn default_button_count() -> usize { 8 }
fn default_debounce_ms() -> u64 { 50 }

fn default_encoder() -> EncoderStrategy { EncoderStrategy::Polled }
fn default_encoder_pin_a() -> usize { 8 }
fn default_encoder_pin_b() -> usize { 9 }
fn default_counts_per_step() -> i32 { 4 }
fn default_screen_count() -> usize { 3 }
fn default_encoder_poll_us() -> u64 { 1000 }

fn default_transport() -> TransportKind { TransportKind::Udp }
fn default_peer() -> String { "192.168.4.1:4210".to_string() }
fn default_bind() -> String { "0.0.0.0:0".to_string() }
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_send_period_ms() -> u64 { 20 }

fn default_display_enabled() -> bool { true }
fn default_refresh_ms() -> u64 { 200 }

fn default_telemetry_enabled() -> bool { false }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_interval_ms() -> u64 { 100 }
fn default_log_format() -> String { "jsonl".to_string() }

fn default_tick_ms() -> u64 { 5 }

impl Default for AxesConfig {
    fn default() -> Self {
        let table = CalibrationTable::default();
        let axis = |ch: ChannelId| {
            let cal = table.axis(ch);
            AxisConfig {
                min: cal.min(),
                max: cal.max(),
                center: cal.center(),
                invert: cal.invert(),
            }
        };
        Self {
            throttle: axis(ChannelId::Throttle),
            yaw: axis(ChannelId::Yaw),
            roll: axis(ChannelId::Roll),
            pitch: axis(ChannelId::Pitch),
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            deadzone: default_deadzone(),
            use_rates: default_use_rates(),
            rc_min: default_rc_min(),
            rc_max: default_rc_max(),
            rc_center: default_rc_center(),
            ext_min: default_ext_min(),
            ext_max: default_ext_max(),
        }
    }
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            step: default_trim_step(),
            max: default_trim_max(),
        }
    }
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            step_pct: default_rate_step_pct(),
            min_pct: default_rate_min_pct(),
            max_pct: default_rate_max_pct(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            source: default_input_source(),
            device_path: String::new(),
            axis_codes: default_axis_codes(),
            button_codes: default_button_codes(),
            button_count: default_button_count(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            encoder: default_encoder(),
            encoder_pin_a: default_encoder_pin_a(),
            encoder_pin_b: default_encoder_pin_b(),
            counts_per_step: default_counts_per_step(),
            screen_count: default_screen_count(),
            encoder_poll_us: default_encoder_poll_us(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            peer: default_peer(),
            bind: default_bind(),
            serial_port: default_serial_port(),
            baud_rate: default_baud_rate(),
            send_period_ms: default_send_period_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: default_display_enabled(),
            refresh_ms: default_refresh_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            log_interval_ms: default_log_interval_ms(),
            format: default_log_format(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
        }
    }
}

fn invalid(msg: impl std::fmt::Display) -> TransmitterError {
    TransmitterError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rc_transmitter::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Axis calibration table in channel order
    ///
    /// # Errors
    ///
    /// Returns error if an axis violates `min < center < max`
    pub fn calibration_table(&self) -> Result<CalibrationTable> {
        let build = |name: &str, axis: &AxisConfig| {
            AxisCalibration::new(axis.min, axis.max, axis.center, axis.invert)
                .map_err(|e| invalid(format!("axes.{}: {}", name, e)))
        };
        Ok(CalibrationTable([
            build("throttle", &self.axes.throttle)?,
            build("yaw", &self.axes.yaw)?,
            build("roll", &self.axes.roll)?,
            build("pitch", &self.axes.pitch)?,
        ]))
    }

    /// Pipeline settings from the `[processing]` section
    #[must_use]
    pub fn processor_settings(&self) -> ProcessorSettings {
        let p = &self.processing;
        ProcessorSettings {
            deadzone: p.deadzone,
            nominal: PulseRange {
                min: p.rc_min,
                center: p.rc_center,
                max: p.rc_max,
            },
            extended: PulseRange {
                min: p.ext_min,
                center: p.rc_center,
                max: p.ext_max,
            },
            use_rates: p.use_rates,
        }
    }

    /// Trim and rate step sizes and bounds
    #[must_use]
    pub fn trim_rate_limits(&self) -> TrimRateLimits {
        TrimRateLimits {
            trim_step: self.trim.step,
            trim_max: self.trim.max,
            rate_step_pct: self.rate.step_pct,
            rate_min_pct: self.rate.min_pct,
            rate_max_pct: self.rate.max_pct,
        }
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.input.debounce_ms)
    }

    pub fn send_period(&self) -> Duration {
        Duration::from_millis(self.link.send_period_ms)
    }

    pub fn display_period(&self) -> Duration {
        Duration::from_millis(self.display.refresh_ms)
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.runtime.tick_ms)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        // Axis calibration invariants
        self.calibration_table()?;

        // Pulse ranges
        let p = &self.processing;
        if !(p.rc_min < p.rc_center && p.rc_center < p.rc_max) {
            return Err(invalid("rc_min < rc_center < rc_max must hold"));
        }
        if p.ext_min > p.rc_min || p.ext_max < p.rc_max {
            return Err(invalid("extended range must contain the nominal range"));
        }
        if p.ext_min < i16::MIN as i32 || p.ext_max > i16::MAX as i32 {
            return Err(invalid("extended range must fit in 16-bit signed values"));
        }
        let half_span = (p.rc_max - p.rc_min) / 2;
        if p.deadzone < 0 || p.deadzone >= half_span {
            return Err(invalid(format!("deadzone must be between 0 and {}", half_span - 1)));
        }

        // Trim
        if self.trim.step <= 0 || self.trim.max <= 0 {
            return Err(invalid("trim step and max must be greater than 0"));
        }
        if self.trim.step > self.trim.max {
            return Err(invalid("trim step must not exceed trim max"));
        }

        // Rate
        if self.rate.step_pct <= 0 {
            return Err(invalid("rate step_pct must be greater than 0"));
        }
        if self.rate.min_pct <= 0
            || self.rate.min_pct > RATE_NEUTRAL_PCT
            || self.rate.max_pct < RATE_NEUTRAL_PCT
        {
            return Err(invalid("rate bounds must satisfy 0 < min_pct <= 100 <= max_pct"));
        }

        // Input
        if self.input.button_count == 0 || self.input.button_count > 32 {
            return Err(invalid("button_count must be between 1 and 32"));
        }
        if self.input.debounce_ms == 0 || self.input.debounce_ms > 1000 {
            return Err(invalid("debounce_ms must be between 1 and 1000"));
        }

        // Menu
        if self.menu.screen_count == 0 || self.menu.screen_count > MAX_SCREENS {
            return Err(invalid(format!("screen_count must be between 1 and {}", MAX_SCREENS)));
        }
        if self.menu.encoder_pin_a == self.menu.encoder_pin_b {
            return Err(invalid("encoder_pin_a and encoder_pin_b must differ"));
        }
        if self.menu.counts_per_step <= 0 || self.menu.counts_per_step > 4 {
            return Err(invalid("counts_per_step must be between 1 and 4"));
        }
        if self.menu.encoder_poll_us == 0 || self.menu.encoder_poll_us > 100_000 {
            return Err(invalid("encoder_poll_us must be between 1 and 100000"));
        }

        // Link
        match self.link.transport {
            TransportKind::Udp if self.link.peer.is_empty() => {
                return Err(invalid("link peer cannot be empty"));
            }
            TransportKind::Serial if self.link.serial_port.is_empty() => {
                return Err(invalid("link serial_port cannot be empty"));
            }
            _ => {}
        }
        if self.link.send_period_ms == 0 || self.link.send_period_ms > 1000 {
            return Err(invalid("send_period_ms must be between 1 and 1000"));
        }

        // Display
        if self.display.refresh_ms == 0 || self.display.refresh_ms > 10000 {
            return Err(invalid("refresh_ms must be between 1 and 10000"));
        }

        // Telemetry
        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }
        if self.telemetry.log_interval_ms == 0 || self.telemetry.log_interval_ms > 60000 {
            return Err(invalid("log_interval_ms must be between 1 and 60000"));
        }
        if self.telemetry.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }
        if self.telemetry.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }
        if self.telemetry.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        // Runtime
        if self.runtime.tick_ms == 0 || self.runtime.tick_ms > self.link.send_period_ms {
            return Err(invalid("tick_ms must be between 1 and send_period_ms"));
        }

        Ok(())
    }
}
