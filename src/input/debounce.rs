//! # Keypad Debouncer
//!
//! Converts bouncing pin reads into clean press edges.
//!
//! Each pin tracks its last raw level, its last committed (stable) level and
//! when the raw level last changed. A raw level is committed once it has held
//! for longer than the debounce window. Only a committed High→Low transition
//! (button pressed) produces a [`PressEdge`]; releases are absorbed silently.

use std::time::{Duration, Instant};

use tracing::trace;

use super::{DigitalInputs, Level};

/// Default debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// A debounced button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressEdge {
    /// Pin (button) index.
    pub button: usize,
}

#[derive(Debug, Clone, Copy)]
struct ButtonState {
    last_raw: Level,
    last_stable: Level,
    last_change: Instant,
}

impl ButtonState {
    fn new(now: Instant) -> Self {
        Self {
            last_raw: Level::High,
            last_stable: Level::High,
            last_change: now,
        }
    }

    fn update(&mut self, raw: Level, now: Instant, window: Duration) -> bool {
        if raw != self.last_raw {
            self.last_raw = raw;
            self.last_change = now;
        }

        if now.saturating_duration_since(self.last_change) > window && raw != self.last_stable {
            self.last_stable = raw;
            return raw.is_low();
        }

        false
    }
}

/// Per-button debounce state machine.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use rc_transmitter::input::Level;
/// use rc_transmitter::input::debounce::InputDebouncer;
///
/// let t0 = Instant::now();
/// let mut debouncer = InputDebouncer::new(8, Duration::from_millis(50), t0);
///
/// assert!(debouncer.poll(3, Level::Low, t0).is_none());
/// let edge = debouncer.poll(3, Level::Low, t0 + Duration::from_millis(60));
/// assert_eq!(edge.map(|e| e.button), Some(3));
/// ```
#[derive(Debug, Clone)]
pub struct InputDebouncer {
    window: Duration,
    buttons: Vec<ButtonState>,
}

impl InputDebouncer {
    /// Creates a debouncer for `count` buttons, all released at `now`.
    #[must_use]
    pub fn new(count: usize, window: Duration, now: Instant) -> Self {
        Self {
            window,
            buttons: vec![ButtonState::new(now); count],
        }
    }

    /// Number of tracked buttons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Last raw level seen on a pin (High for unknown pins).
    #[must_use]
    pub fn last_raw(&self, button: usize) -> Level {
        self.buttons
            .get(button)
            .map_or(Level::High, |state| state.last_raw)
    }

    /// Last committed level of a pin (High for unknown pins).
    #[must_use]
    pub fn stable(&self, button: usize) -> Level {
        self.buttons
            .get(button)
            .map_or(Level::High, |state| state.last_stable)
    }

    /// Feeds one raw reading of `button` taken at `now`.
    ///
    /// Returns a press edge when a Low level is committed. Out-of-range
    /// button indices are ignored.
    pub fn poll(&mut self, button: usize, raw: Level, now: Instant) -> Option<PressEdge> {
        let window = self.window;
        let state = self.buttons.get_mut(button)?;

        if state.update(raw, now, window) {
            trace!("Button {} pressed", button);
            Some(PressEdge { button })
        } else {
            None
        }
    }

    /// Reads and polls every button in index order.
    ///
    /// A failed pin read is treated as "no change" for that pin.
    pub fn poll_all<D>(&mut self, pins: &mut D, now: Instant) -> Vec<PressEdge>
    where
        D: DigitalInputs + ?Sized,
    {
        let mut edges = Vec::new();
        for button in 0..self.buttons.len() {
            let raw = match pins.read_pin(button) {
                Ok(level) => level,
                Err(e) => {
                    trace!("Pin {} read failed: {}", button, e);
                    self.last_raw(button)
                }
            };
            if let Some(edge) = self.poll(button, raw, now) {
                edges.push(edge);
            }
        }
        edges
    }
}
