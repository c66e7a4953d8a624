//! # RC Transmitter
//!
//! Reads the sticks and keypad of a handheld transmitter and streams RC
//! channel frames to the paired receiver.

use anyhow::{Context, Result};
use std::path::Path;
use std::time::Instant;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use rc_transmitter::channels::calibration::CalibrationTable;
use rc_transmitter::config::{Config, InputSource};
use rc_transmitter::display::{Display, LogDisplay, NullDisplay};
use rc_transmitter::input::encoder::{
    spawn_sampler, EncoderCounter, EncoderIsr, EncoderStrategy, QuadratureDecoder,
};
use rc_transmitter::input::evdev_source::EvdevInputs;
use rc_transmitter::input::{AnalogSource, DigitalInputs, IdleInputs};
use rc_transmitter::link::open_link;
use rc_transmitter::link::scheduler::PeriodicGate;
use rc_transmitter::telemetry::logger::FrameLogger;
use rc_transmitter::transmitter::{PeripheralFaults, Selector, Transmitter};

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main entry point for the RC transmitter
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (first argument, or `config/default.toml`)
///    - Open sticks / keypad; fall back to idle inputs with a fault flag
///    - Open the radio link (fatal on failure)
///    - Start the encoder sampler when the interrupt strategy is selected
///
/// 2. **Main Loop**
///    - Run one control cycle every `runtime.tick_ms`
///    - Frames go out every `link.send_period_ms` (20 ms = 50 Hz by default)
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if:
/// - The configuration cannot be read or is invalid
/// - The radio link cannot be opened
///
/// # Example Output
///
/// ```text
/// INFO rc_transmitter: RC Transmitter v0.1.0 starting...
/// INFO rc_transmitter::link::udp: UDP link ready (0.0.0.0:0 -> 192.168.4.1:4210)
/// INFO rc_transmitter: Control loop running (tick 5ms, send 20ms)
/// INFO rc_transmitter::transmitter: Sent 500 frames to 192.168.4.1:4210 (0 failed), mode normal
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_env_filter(log_filter()).init();

    info!("RC Transmitter v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = load_config(std::env::args().nth(1))?;
    let calibration = config.calibration_table()?;
    let mut faults = PeripheralFaults::default();

    // Sticks and keypad
    let interrupt = config.menu.encoder == EncoderStrategy::Interrupt;
    let inputs: Inputs = match open_inputs(&config, interrupt) {
        Ok(Some(inputs)) => inputs,
        Ok(None) => idle_inputs(&calibration),
        Err(e) => {
            error!("Input device unavailable, sending neutral frames: {:#}", e);
            faults.sticks = true;
            faults.keypad = true;
            idle_inputs(&calibration)
        }
    };
    let (analog, pins, sampler_pins) = inputs;

    let display: Box<dyn Display> = if config.display.enabled {
        Box::new(LogDisplay::new())
    } else {
        Box::new(NullDisplay)
    };

    let link = open_link(&config.link)
        .await
        .context("Failed to open radio link")?;

    // Mode selector
    let menu = &config.menu;
    let mut sampler = None;
    let selector = match menu.encoder {
        EncoderStrategy::Polled => Selector::Polled {
            decoder: QuadratureDecoder::new(menu.counts_per_step),
            pin_a: menu.encoder_pin_a,
            pin_b: menu.encoder_pin_b,
        },
        EncoderStrategy::Interrupt => {
            let counter = EncoderCounter::new();
            let sampler_pins = sampler_pins.context("No input handle for the encoder sampler")?;
            sampler = Some(spawn_sampler(
                sampler_pins,
                menu.encoder_pin_a,
                menu.encoder_pin_b,
                Duration::from_micros(menu.encoder_poll_us),
                EncoderIsr::new(menu.counts_per_step, counter.clone()),
            ));
            Selector::Counter(counter)
        }
    };

    let mut transmitter = Transmitter::new(&config, analog, pins, display, link, Instant::now())?
        .with_selector(selector)
        .with_faults(faults);

    if config.telemetry.enabled {
        match FrameLogger::new(
            &config.telemetry.log_dir,
            config.telemetry.max_records_per_file,
            config.telemetry.max_files_to_keep,
        ) {
            Ok(logger) => {
                let log_every = Duration::from_millis(config.telemetry.log_interval_ms);
                let gate = PeriodicGate::new(log_every);
                transmitter = transmitter.with_frame_logger(logger, gate);
            }
            Err(e) => warn!("Frame logging disabled: {}", e),
        }
    }

    let mut ticker = interval(config.tick_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Control loop running (tick {}ms, send {}ms)",
        config.runtime.tick_ms, config.link.send_period_ms
    );
    info!("Press Ctrl+C to exit");

    // Main control loop
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                transmitter.tick(Instant::now()).await;
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    if let Some(handle) = sampler {
        handle.abort();
    }
    transmitter.flush_frame_log();
    let scheduler = transmitter.scheduler();
    info!("Total frames sent: {} ({} failed)", scheduler.sent(), scheduler.failed());

    Ok(())
}

/// Log filter from `RUST_LOG`, `info` when unset.
///
/// Directives in `RUST_LOG` are kept as given, so `RUST_LOG=debug` also
/// shows the rendered status screens.
fn log_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy()
}

/// Loads the configuration file.
///
/// A missing default file is not an error: built-in defaults are used.
fn load_config(arg: Option<String>) -> Result<Config> {
    match arg {
        Some(path) => {
            Config::load(&path).with_context(|| format!("Failed to load config {}", path))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG_PATH)),
        None => {
            warn!("{} not found, using built-in defaults", DEFAULT_CONFIG_PATH);
            Ok(Config::default())
        }
    }
}

/// Stick source, keypad pins and (interrupt strategy only) sampler pins
type Inputs = (Box<dyn AnalogSource>, Box<dyn DigitalInputs>, Option<Box<dyn DigitalInputs>>);

/// Opens the configured input device.
///
/// Every consumer gets its own handle. Returns `None` when the idle source
/// is configured.
fn open_inputs(config: &Config, interrupt: bool) -> Result<Option<Inputs>> {
    let input = &config.input;
    if input.source == InputSource::Idle {
        info!("Input source is idle, sticks held at center");
        return Ok(None);
    }

    let open = || EvdevInputs::open(&input.device_path, input.axis_codes, &input.button_codes);
    let sticks = open()?;
    info!("Input device: {}", sticks.device_path());
    let pins = open()?;
    let sampler: Option<Box<dyn DigitalInputs>> = if interrupt {
        Some(Box::new(open()?))
    } else {
        None
    };
    Ok(Some((Box::new(sticks), Box::new(pins), sampler)))
}

fn idle_inputs(calibration: &CalibrationTable) -> Inputs {
    let idle = IdleInputs::new(calibration);
    (Box::new(idle.clone()), Box::new(idle.clone()), Some(Box::new(idle)))
}
