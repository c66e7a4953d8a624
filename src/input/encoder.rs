//! # Rotary Encoder
//!
//! Quadrature decoding for the menu selector.
//!
//! Two styles are supported:
//!
//! - **Polled**: the control loop samples the A/B pins every tick and feeds
//!   them to a [`QuadratureDecoder`], which yields discrete ±1 steps.
//! - **Interrupt**: a separate sampler task (standing in for a pin-change
//!   interrupt) decodes the pins and accumulates steps into a shared
//!   [`EncoderCounter`]; the control loop only loads the count.
//!
//! The counter is the only state shared across execution contexts. It has a
//! single writer (`fetch_add`) and a single reader (`load`).

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

use super::{DigitalInputs, Level};

/// Valid quadrature transitions indexed by `(previous << 2) | current`.
/// Invalid (skipped) transitions contribute zero.
const TRANSITIONS: [i8; 16] = [0, -1, 1, 0, 1, 0, 0, -1, -1, 0, 0, 1, 0, 1, -1, 0];

/// Quadrature edges per mechanical detent for common encoders.
pub const DEFAULT_COUNTS_PER_STEP: i32 = 4;

/// How the menu selector is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderStrategy {
    /// Decoded from the control loop each tick.
    Polled,
    /// Decoded by a background sampler into an atomic counter.
    Interrupt,
}

/// Gray-code decoder turning A/B levels into detent steps.
#[derive(Debug, Clone)]
pub struct QuadratureDecoder {
    previous: Option<u8>,
    accumulated: i32,
    counts_per_step: i32,
}

impl QuadratureDecoder {
    /// Creates a decoder emitting one step every `counts_per_step` edges.
    #[must_use]
    pub fn new(counts_per_step: i32) -> Self {
        Self {
            previous: None,
            accumulated: 0,
            counts_per_step: counts_per_step.max(1),
        }
    }

    /// Feeds one A/B sample; returns -1, 0 or +1.
    ///
    /// The first sample only establishes the starting phase.
    pub fn update(&mut self, a: Level, b: Level) -> i32 {
        let current = (u8::from(a == Level::High) << 1) | u8::from(b == Level::High);
        let Some(previous) = self.previous.replace(current) else {
            return 0;
        };

        self.accumulated += TRANSITIONS[usize::from((previous << 2) | current)] as i32;

        if self.accumulated >= self.counts_per_step {
            self.accumulated = 0;
            1
        } else if self.accumulated <= -self.counts_per_step {
            self.accumulated = 0;
            -1
        } else {
            0
        }
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTS_PER_STEP)
    }
}

/// Shared step counter written from the sampler context.
///
/// Wraps on overflow; consumers follow the wrapping difference between loads.
#[derive(Debug, Clone, Default)]
pub struct EncoderCounter {
    steps: Arc<AtomicI32>,
}

impl EncoderCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` steps (atomic read-modify-write).
    pub fn add(&self, delta: i32) {
        self.steps.fetch_add(delta, Ordering::Relaxed);
    }

    /// Current accumulated step count.
    #[must_use]
    pub fn load(&self) -> i32 {
        self.steps.load(Ordering::Relaxed)
    }
}

/// Writer half of the interrupt style: decoder state plus the shared counter.
#[derive(Debug)]
pub struct EncoderIsr {
    decoder: QuadratureDecoder,
    counter: EncoderCounter,
}

impl EncoderIsr {
    #[must_use]
    pub fn new(counts_per_step: i32, counter: EncoderCounter) -> Self {
        Self {
            decoder: QuadratureDecoder::new(counts_per_step),
            counter,
        }
    }

    /// Handles one pin-change sample.
    pub fn on_sample(&mut self, a: Level, b: Level) {
        let step = self.decoder.update(a, b);
        if step != 0 {
            trace!("Encoder step {}", step);
            self.counter.add(step);
        }
    }
}

/// Spawns the background sampler that drives an [`EncoderIsr`].
///
/// The task samples pins `pin_a`/`pin_b` every `period` and runs until aborted.
/// Read failures skip the sample.
pub fn spawn_sampler<D>(
    mut pins: D,
    pin_a: usize,
    pin_b: usize,
    period: Duration,
    mut isr: EncoderIsr,
) -> JoinHandle<()>
where
    D: DigitalInputs + 'static,
{
    debug!("Starting encoder sampler on pins {}/{} every {:?}", pin_a, pin_b, period);

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            match (pins.read_pin(pin_a), pins.read_pin(pin_b)) {
                (Ok(a), Ok(b)) => isr.on_sample(a, b),
                _ => trace!("Encoder sample skipped"),
            }
        }
    })
}
