//! # Status Display
//!
//! Composes the status screens and hands them to a display collaborator.
//!
//! The collaborator only has to understand text placed at character cells,
//! horizontal rules and a flush; pixel rendering is its own business. Screens
//! are laid out for a 21×8 character grid (128×64 OLED with a 6×8 font).
//!
//! | Mode | Content |
//! |------|---------|
//! | Normal | Channel values and the trim row |
//! | Trim edit | Trim per channel |
//! | Rate edit | Dual rate per channel, in percent |
//! | Raw monitor | Raw stick samples |
//!
//! A fault line is drawn on every screen while a peripheral runs degraded.

use tracing::debug;

use crate::channels::{ChannelId, ChannelValues, NUM_CHANNELS};
use crate::error::Result;
use crate::menu::Mode;
use crate::transmitter::PeripheralFaults;

/// Character columns of the screen.
pub const SCREEN_COLS: usize = 21;
/// Character rows of the screen.
pub const SCREEN_ROWS: usize = 8;

/// Channels in on-screen order.
const SCREEN_ORDER: [ChannelId; NUM_CHANNELS] = [
    ChannelId::Throttle,
    ChannelId::Yaw,
    ChannelId::Pitch,
    ChannelId::Roll,
];

/// Display collaborator.
pub trait Display: Send {
    /// Starts a new frame.
    fn clear(&mut self);

    /// Places `text` with its first character at (`col`, `row`).
    fn text(&mut self, col: usize, row: usize, text: &str);

    /// Draws a full-width horizontal rule on `row`.
    fn hline(&mut self, row: usize);

    /// Pushes the frame to the panel.
    fn flush(&mut self) -> Result<()>;
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn clear(&mut self) {
        (**self).clear();
    }

    fn text(&mut self, col: usize, row: usize, text: &str) {
        (**self).text(col, row, text);
    }

    fn hline(&mut self, row: usize) {
        (**self).hline(row);
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Everything a screen can show.
#[derive(Debug, Clone)]
pub struct ScreenSnapshot {
    pub mode: Mode,
    pub values: ChannelValues,
    pub trims: [i32; NUM_CHANNELS],
    pub rates_pct: [i32; NUM_CHANNELS],
    pub raw: [i32; NUM_CHANNELS],
    pub faults: PeripheralFaults,
}

/// Screen composer.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatusScreen;

impl StatusScreen {
    /// Draws the screen for `snapshot.mode` and flushes it.
    ///
    /// # Errors
    ///
    /// Propagates the display's flush error.
    pub fn render<D: Display + ?Sized>(display: &mut D, snapshot: &ScreenSnapshot) -> Result<()> {
        display.clear();

        match snapshot.mode {
            Mode::Normal => Self::normal(display, snapshot),
            Mode::TrimEdit => Self::per_channel(display, "- TRIM EDIT -", |ch| {
                format!("{}  {:+}", ch.label(), snapshot.trims[ch.index()])
            }),
            Mode::RateEdit => Self::per_channel(display, "- DUAL RATE -", |ch| {
                format!("{}  {}%", ch.label(), snapshot.rates_pct[ch.index()])
            }),
            Mode::RawMonitor => Self::per_channel(display, "- RAW INPUT -", |ch| {
                format!("{}  {}", ch.label(), snapshot.raw[ch.index()])
            }),
        }

        if let Some(line) = snapshot.faults.summary() {
            display.text(0, 7, &line);
        }

        display.flush()
    }

    fn normal<D: Display + ?Sized>(display: &mut D, snapshot: &ScreenSnapshot) {
        display.text(4, 0, "- RC STATUS -");
        display.hline(1);

        let value = |ch: ChannelId| format!("{}: {}", ch.label(), snapshot.values.get(ch));
        display.text(0, 2, &value(ChannelId::Throttle));
        display.text(0, 3, &value(ChannelId::Yaw));
        display.text(11, 2, &value(ChannelId::Pitch));
        display.text(11, 3, &value(ChannelId::Roll));

        display.hline(4);
        display.text(0, 5, "TRIM SETTINGS:");

        let trim = |ch: ChannelId| snapshot.trims[ch.index()];
        display.text(
            0,
            6,
            &format!(
                "T:{} Y:{} P:{} R:{}",
                trim(ChannelId::Throttle),
                trim(ChannelId::Yaw),
                trim(ChannelId::Pitch),
                trim(ChannelId::Roll)
            ),
        );
    }

    fn per_channel<D, F>(display: &mut D, title: &str, line: F)
    where
        D: Display + ?Sized,
        F: Fn(ChannelId) -> String,
    {
        display.text(4, 0, title);
        display.hline(1);
        for (offset, ch) in SCREEN_ORDER.into_iter().enumerate() {
            display.text(0, 2 + offset, &line(ch));
        }
    }
}

/// Character-grid display that writes each flushed frame to the log.
#[derive(Debug, Clone)]
pub struct LogDisplay {
    rows: Vec<Vec<char>>,
}

impl LogDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: vec![vec![' '; SCREEN_COLS]; SCREEN_ROWS],
        }
    }

    /// Current frame as trimmed text lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect()
    }
}

impl Default for LogDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for LogDisplay {
    fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(' ');
        }
    }

    fn text(&mut self, col: usize, row: usize, text: &str) {
        let Some(cells) = self.rows.get_mut(row) else {
            return;
        };
        for (cell, c) in cells.iter_mut().skip(col).zip(text.chars()) {
            *cell = c;
        }
    }

    fn hline(&mut self, row: usize) {
        if let Some(cells) = self.rows.get_mut(row) {
            cells.fill('-');
        }
    }

    fn flush(&mut self) -> Result<()> {
        for line in self.lines() {
            debug!(target: "rc_transmitter::screen", "|{:<width$}|", line, width = SCREEN_COLS);
        }
        Ok(())
    }
}

/// Display stand-in that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn clear(&mut self) {}

    fn text(&mut self, _col: usize, _row: usize, _text: &str) {}

    fn hline(&mut self, _row: usize) {}

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
