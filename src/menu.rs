//! # Menu Controller
//!
//! Screen/interaction mode selection and keypad routing.
//!
//! The rotary selector moves the active mode one screen per detent, wrapping
//! cyclically in both directions. The mode index is kept reduced modulo the
//! screen count; a shared step counter is followed by the change since its
//! previous load, so counter overflow never skips or repeats a screen.
//!
//! Keypad presses adjust trim in [`Mode::TrimEdit`] and rate in
//! [`Mode::RateEdit`]; in every other mode they are consumed without effect so
//! nothing changes by accident in flight.
//!
//! ## Keypad
//!
//! | Button | Channel | Direction |
//! |--------|---------|-----------|
//! | 0 | Roll | + |
//! | 1 | Roll | − |
//! | 2 | Pitch | + |
//! | 3 | Pitch | − |
//! | 4 | Throttle | + |
//! | 5 | Throttle | − |
//! | 6 | Yaw | + |
//! | 7 | Yaw | − |
//!
//! This table matches the physical keypad wiring.

use tracing::{debug, info};

use crate::channels::trim_rate::TrimRateStore;
use crate::channels::ChannelId;
use crate::input::debounce::PressEdge;

/// Keypad binding, indexed by button.
pub const KEYPAD: [(ChannelId, i32); 8] = [
    (ChannelId::Roll, 1),
    (ChannelId::Roll, -1),
    (ChannelId::Pitch, 1),
    (ChannelId::Pitch, -1),
    (ChannelId::Throttle, 1),
    (ChannelId::Throttle, -1),
    (ChannelId::Yaw, 1),
    (ChannelId::Yaw, -1),
];

/// Maximum number of selectable screens.
pub const MAX_SCREENS: usize = 4;

/// Active screen / interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Flight screen; keypad locked.
    #[default]
    Normal,
    /// Keypad edits trim.
    TrimEdit,
    /// Keypad edits dual rate.
    RateEdit,
    /// Raw sample view for calibration; keypad locked.
    RawMonitor,
}

impl Mode {
    /// Modes in selector order.
    pub const ALL: [Mode; MAX_SCREENS] = [
        Mode::Normal,
        Mode::TrimEdit,
        Mode::RateEdit,
        Mode::RawMonitor,
    ];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::TrimEdit => "trim",
            Mode::RateEdit => "rate",
            Mode::RawMonitor => "raw",
        }
    }
}

/// A keypad press routed to an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Trim { channel: ChannelId, direction: i32 },
    Rate { channel: ChannelId, direction: i32 },
}

/// Channel and direction bound to a keypad button.
#[must_use]
pub fn keypad_binding(button: usize) -> Option<(ChannelId, i32)> {
    KEYPAD.get(button).copied()
}

/// Mode state machine driven by the rotary selector.
///
/// # Examples
///
/// ```
/// use rc_transmitter::menu::{MenuController, Mode};
///
/// let mut menu = MenuController::new(3);
/// assert_eq!(menu.mode(), Mode::Normal);
///
/// menu.step(-1);
/// assert_eq!(menu.mode(), Mode::RateEdit);
/// ```
#[derive(Debug, Clone)]
pub struct MenuController {
    screen_count: usize,
    /// Last value adopted from a shared step counter.
    last_count: i32,
    mode: Mode,
}

impl MenuController {
    /// Creates a controller cycling through the first `screen_count` modes.
    ///
    /// `screen_count` is clamped to `1..=MAX_SCREENS`.
    #[must_use]
    pub fn new(screen_count: usize) -> Self {
        Self {
            screen_count: screen_count.clamp(1, MAX_SCREENS),
            last_count: 0,
            mode: Mode::Normal,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn screen_count(&self) -> usize {
        self.screen_count
    }

    /// Applies a discrete selector step (±1 per detent).
    ///
    /// The mode index is kept reduced modulo the screen count, so any number
    /// of steps in either direction wraps cyclically.
    pub fn step(&mut self, delta: i32) -> Mode {
        if delta == 0 {
            return self.mode;
        }
        let screens = self.screen_count as i64;
        let index = (self.mode.index() as i64 + i64::from(delta)).rem_euclid(screens) as usize;
        let mode = Mode::ALL[index];
        if mode != self.mode {
            info!("Mode changed: {} -> {}", self.mode.name(), mode.name());
            self.mode = mode;
        }
        self.mode
    }

    /// Adopts an accumulated step count read from a shared counter.
    ///
    /// Only the change since the previous load is applied, taken with
    /// wrapping subtraction so the counter may overflow freely. The counter
    /// is assumed to start at zero.
    pub fn sync_count(&mut self, count: i32) -> Mode {
        let delta = count.wrapping_sub(self.last_count);
        self.last_count = count;
        self.step(delta)
    }

    /// Routes a press to an adjustment for the current mode.
    ///
    /// Returns `None` when the keypad is locked or the button is unbound.
    #[must_use]
    pub fn route_press(&self, edge: PressEdge) -> Option<Adjustment> {
        let (channel, direction) = keypad_binding(edge.button)?;
        match self.mode {
            Mode::TrimEdit => Some(Adjustment::Trim { channel, direction }),
            Mode::RateEdit => Some(Adjustment::Rate { channel, direction }),
            Mode::Normal | Mode::RawMonitor => None,
        }
    }

    /// Routes a press and applies the resulting edit to `store`.
    pub fn apply_press(&self, edge: PressEdge, store: &mut TrimRateStore) -> Option<Adjustment> {
        let adjustment = self.route_press(edge);
        match adjustment {
            Some(Adjustment::Trim { channel, direction }) => {
                let trim = store.adjust_trim(channel, direction);
                debug!("{} trim -> {}", channel.label(), trim);
            }
            Some(Adjustment::Rate { channel, direction }) => {
                let rate = store.adjust_rate(channel, direction);
                debug!("{} rate -> {}%", channel.label(), rate);
            }
            None => debug!("Button {} ignored in {} mode", edge.button, self.mode.name()),
        }
        adjustment
    }
}
