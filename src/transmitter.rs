//! # Transmitter
//!
//! The control context: owns every piece of mutable state and runs one
//! control cycle per [`Transmitter::tick`].
//!
//! ## Cycle Order
//!
//! 1. Read and debounce the keypad
//! 2. Update the mode from the rotary selector
//! 3. Apply routed keypad presses to trim / rate
//! 4. Read the sticks and run the channel pipeline
//! 5. Send the frame (gated by the send period)
//! 6. Log the frame (gated by the telemetry interval)
//! 7. Refresh the display (gated by the refresh period)
//!
//! A press is therefore always applied before the frame that reflects it is
//! built. Nothing in a tick blocks except the hand-off to the link.

use std::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::channels::processor::ChannelProcessor;
use crate::channels::trim_rate::TrimRateStore;
use crate::channels::{ChannelId, ChannelValues, NUM_CHANNELS};
use crate::config::Config;
use crate::display::{Display, ScreenSnapshot, StatusScreen};
use crate::error::Result;
use crate::input::debounce::InputDebouncer;
use crate::input::encoder::{EncoderCounter, QuadratureDecoder};
use crate::input::{AnalogSource, DigitalInputs};
use crate::link::frame::ChannelFrame;
use crate::link::scheduler::{PeriodicGate, TransmitScheduler};
use crate::link::transport::RadioLink;
use crate::menu::{Adjustment, MenuController, Mode};
use crate::telemetry::logger::{FrameLogger, FrameRecord};

/// Number of sent frames between status log messages
pub const LOG_INTERVAL_FRAMES: u64 = 500;

/// Peripherals running on a degraded stand-in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeripheralFaults {
    pub sticks: bool,
    pub keypad: bool,
    pub display: bool,
}

impl PeripheralFaults {
    #[must_use]
    pub fn any(&self) -> bool {
        self.sticks || self.keypad || self.display
    }

    /// One-line summary for the fault indicator, `None` when healthy.
    ///
    /// # Examples
    ///
    /// ```
    /// use rc_transmitter::transmitter::PeripheralFaults;
    ///
    /// let faults = PeripheralFaults { keypad: true, ..Default::default() };
    /// assert_eq!(faults.summary().as_deref(), Some("FAULT: KEYS"));
    /// ```
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        if !self.any() {
            return None;
        }
        let mut line = String::from("FAULT:");
        let flags = [
            (self.sticks, "STICKS"),
            (self.keypad, "KEYS"),
            (self.display, "DISP"),
        ];
        for (failed, name) in flags {
            if failed {
                line.push(' ');
                line.push_str(name);
            }
        }
        Some(line)
    }
}

/// How the mode selector is read each tick.
#[derive(Debug)]
pub enum Selector {
    /// Decode A/B pins from the control loop.
    Polled {
        decoder: QuadratureDecoder,
        pin_a: usize,
        pin_b: usize,
    },
    /// Load the count accumulated by the background sampler.
    Counter(EncoderCounter),
    /// No selector fitted; mode stays where it is.
    None,
}

/// What a tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Edits applied from keypad presses.
    pub adjustments: Vec<Adjustment>,
    /// Frame handed to the link, if the send period elapsed.
    pub frame: Option<ChannelFrame>,
    /// Whether that hand-off failed.
    pub send_failed: bool,
}

/// Control context over the four external collaborators.
pub struct Transmitter<A, P, D, L> {
    analog: A,
    pins: P,
    display: D,
    link: L,

    processor: ChannelProcessor,
    store: TrimRateStore,
    debouncer: InputDebouncer,
    menu: MenuController,
    selector: Selector,

    scheduler: TransmitScheduler,
    display_gate: Option<PeriodicGate>,
    telemetry: Option<(FrameLogger, PeriodicGate)>,

    faults: PeripheralFaults,
    raw: [i32; NUM_CHANNELS],
    values: ChannelValues,
}

impl<A, P, D, L> Transmitter<A, P, D, L>
where
    A: AnalogSource,
    P: DigitalInputs,
    D: Display,
    L: RadioLink,
{
    /// Builds the context from configuration.
    ///
    /// Trim and rate start neutral, the mode starts at Normal and the sticks
    /// are assumed at rest until the first read.
    ///
    /// # Errors
    ///
    /// Returns error if the axis calibration is invalid.
    pub fn new(
        config: &Config,
        analog: A,
        pins: P,
        display: D,
        link: L,
        now: Instant,
    ) -> Result<Self> {
        let calibration = config.calibration_table()?;
        let processor = ChannelProcessor::new(calibration, config.processor_settings());
        let store = TrimRateStore::new(config.trim_rate_limits());
        let debouncer =
            InputDebouncer::new(config.input.button_count, config.debounce_window(), now);

        let mut raw = [0; NUM_CHANNELS];
        for ch in ChannelId::ALL {
            raw[ch.index()] = calibration.axis(ch).center();
        }
        let values = processor.process_all(&raw, &store);

        let display_gate = config
            .display
            .enabled
            .then(|| PeriodicGate::new(config.display_period()));

        Ok(Self {
            analog,
            pins,
            display,
            link,
            processor,
            store,
            debouncer,
            menu: MenuController::new(config.menu.screen_count),
            selector: Selector::None,
            scheduler: TransmitScheduler::new(config.send_period()),
            display_gate,
            telemetry: None,
            faults: PeripheralFaults::default(),
            raw,
            values,
        })
    }

    /// Sets how the mode selector is read.
    #[must_use]
    pub fn with_selector(mut self, selector: Selector) -> Self {
        self.selector = selector;
        self
    }

    /// Marks peripherals that are running on stand-ins.
    #[must_use]
    pub fn with_faults(mut self, faults: PeripheralFaults) -> Self {
        self.faults = faults;
        self
    }

    /// Enables the frame log, written at most once per `gate` period.
    #[must_use]
    pub fn with_frame_logger(mut self, logger: FrameLogger, gate: PeriodicGate) -> Self {
        self.telemetry = Some((logger, gate));
        self
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.menu.mode()
    }

    #[must_use]
    pub fn store(&self) -> &TrimRateStore {
        &self.store
    }

    /// Latest processed channel values.
    #[must_use]
    pub fn values(&self) -> ChannelValues {
        self.values
    }

    #[must_use]
    pub fn scheduler(&self) -> &TransmitScheduler {
        &self.scheduler
    }

    /// Writes buffered frame log records to disk.
    pub fn flush_frame_log(&mut self) {
        if let Some((logger, _)) = self.telemetry.as_mut() {
            if let Err(e) = logger.flush() {
                warn!("Failed to flush frame log: {}", e);
            }
        }
    }

    #[must_use]
    pub fn faults(&self) -> PeripheralFaults {
        self.faults
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Runs one control cycle at `now`.
    pub async fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        // Inputs and edits
        let edges = self.debouncer.poll_all(&mut self.pins, now);
        self.update_selector();
        for edge in edges {
            if let Some(adjustment) = self.menu.apply_press(edge, &mut self.store) {
                report.adjustments.push(adjustment);
            }
        }

        // Channel pipeline
        self.read_sticks();
        self.values = self.processor.process_all(&self.raw, &self.store);
        let frame = ChannelFrame::from_values(&self.values);

        // Link
        if self.scheduler.due(now) {
            report.frame = Some(frame);
            report.send_failed = !self.send(&frame).await;
        }

        // Telemetry
        if let Some((logger, gate)) = self.telemetry.as_mut() {
            if gate.ready(now) {
                let record = FrameRecord::now(
                    self.menu.mode().name(),
                    frame,
                    self.store.trims(),
                    self.store.rates_pct(),
                );
                if let Err(e) = logger.log(&record) {
                    warn!("Failed to write frame log: {}", e);
                }
            }
        }

        // Display
        if self.display_gate.as_mut().is_some_and(|gate| gate.ready(now)) {
            self.refresh_display();
        }

        report
    }

    fn update_selector(&mut self) {
        match &mut self.selector {
            Selector::Polled { decoder, pin_a, pin_b } => {
                match (self.pins.read_pin(*pin_a), self.pins.read_pin(*pin_b)) {
                    (Ok(a), Ok(b)) => {
                        let step = decoder.update(a, b);
                        if step != 0 {
                            self.menu.step(step);
                        }
                    }
                    _ => trace!("Selector read failed"),
                }
            }
            Selector::Counter(counter) => {
                self.menu.sync_count(counter.load());
            }
            Selector::None => {}
        }
    }

    fn read_sticks(&mut self) {
        for ch in ChannelId::ALL {
            match self.analog.read_channel(ch.index()) {
                Ok(sample) => self.raw[ch.index()] = sample,
                Err(e) => trace!("{} sample failed, keeping previous: {}", ch.label(), e),
            }
        }
    }

    /// Returns true when the frame was handed off.
    async fn send(&mut self, frame: &ChannelFrame) -> bool {
        let bytes = frame.encode();
        match self.link.send(&bytes).await {
            Ok(()) => {
                self.scheduler.record_sent();
                let sent = self.scheduler.sent();
                if sent % LOG_INTERVAL_FRAMES == 0 {
                    info!(
                        "Sent {} frames to {} ({} failed), mode {}",
                        sent,
                        self.link.peer(),
                        self.scheduler.failed(),
                        self.menu.mode().name()
                    );
                }
                true
            }
            Err(e) => {
                self.scheduler.record_failure();
                if self.scheduler.failed() == 1 {
                    warn!("Failed to send frame: {}", e);
                } else {
                    debug!("Failed to send frame: {}", e);
                }
                false
            }
        }
    }

    fn refresh_display(&mut self) {
        let snapshot = ScreenSnapshot {
            mode: self.menu.mode(),
            values: self.values,
            trims: self.store.trims(),
            rates_pct: self.store.rates_pct(),
            raw: self.raw,
            faults: self.faults,
        };
        if let Err(e) = StatusScreen::render(&mut self.display, &snapshot) {
            if !self.faults.display {
                warn!("Display refresh failed: {}", e);
            }
            self.faults.display = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::LogDisplay;
    use crate::error::TransmitterError;
    use crate::input::{Level, MockAnalogSource, MockDigitalInputs};
    use crate::link::transport::mocks::MockRadioLink;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type TestTransmitter =
        Transmitter<MockAnalogSource, MockDigitalInputs, LogDisplay, MockRadioLink>;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    /// Sticks reporting the shared samples; pins reporting the shared levels.
    fn mocks(
        samples: Arc<Mutex<[i32; NUM_CHANNELS]>>,
        pressed: Arc<Mutex<Vec<usize>>>,
    ) -> (MockAnalogSource, MockDigitalInputs) {
        let mut analog = MockAnalogSource::new();
        analog
            .expect_read_channel()
            .returning(move |index| Ok(samples.lock().unwrap()[index]));

        let mut pins = MockDigitalInputs::new();
        pins.expect_read_pin()
            .returning(move |pin| Ok(Level::from_active(pressed.lock().unwrap().contains(&pin))));

        (analog, pins)
    }

    struct Harness {
        tx: TestTransmitter,
        samples: Arc<Mutex<[i32; NUM_CHANNELS]>>,
        pressed: Arc<Mutex<Vec<usize>>>,
        link: MockRadioLink,
        t0: Instant,
    }

    fn harness(config: &Config) -> Harness {
        let samples = Arc::new(Mutex::new([13689, 13058, 13806, 13383]));
        let pressed = Arc::new(Mutex::new(Vec::new()));
        let (analog, pins) = mocks(samples.clone(), pressed.clone());
        let link = MockRadioLink::new();
        let t0 = Instant::now();
        let tx =
            Transmitter::new(config, analog, pins, LogDisplay::new(), link.clone(), t0).unwrap();
        Harness {
            tx,
            samples,
            pressed,
            link,
            t0,
        }
    }

    impl Harness {
        /// Holds `button` long enough to register one press, ticking every 5 ms.
        async fn press(&mut self, button: usize, start: u64) -> u64 {
            self.pressed.lock().unwrap().push(button);
            let mut at = start;
            while at <= start + 60 {
                self.tx.tick(self.t0 + ms(at)).await;
                at += 5;
            }
            self.pressed.lock().unwrap().clear();
            while at <= start + 130 {
                self.tx.tick(self.t0 + ms(at)).await;
                at += 5;
            }
            at
        }
    }

    // ==================== Pipeline Tests ====================

    #[tokio::test]
    async fn test_first_tick_sends_centered_frame() {
        let mut h = harness(&Config::default());
        let report = h.tx.tick(h.t0).await;

        let frame = report.frame.unwrap();
        assert_eq!(frame, ChannelFrame { throttle: 1500, yaw: 1500, pitch: 1500, roll: 1500 });
        assert!(!report.send_failed);
        assert_eq!(h.link.get_sent_frames(), vec![frame.encode().to_vec()]);
    }

    #[tokio::test]
    async fn test_stick_deflection_reaches_frame() {
        let mut h = harness(&Config::default());
        h.samples.lock().unwrap()[0] = 15314; // throttle full
        h.samples.lock().unwrap()[3] = 11762; // pitch at min, inverted

        let frame = h.tx.tick(h.t0).await.frame.unwrap();
        assert_eq!(frame.throttle, 2000);
        assert_eq!(frame.pitch, 2000);
        assert_eq!(frame.yaw, 1500);
    }

    #[tokio::test]
    async fn test_send_rate_is_gated() {
        let mut h = harness(&Config::default());
        for at in (0..=100).step_by(5) {
            h.tx.tick(h.t0 + ms(at)).await;
        }
        // 0, 20, 40, 60, 80, 100
        assert_eq!(h.link.get_sent_frames().len(), 6);
        assert_eq!(h.tx.scheduler().sent(), 6);
    }

    #[tokio::test]
    async fn test_send_failure_is_not_fatal() {
        let mut h = harness(&Config::default());
        h.link.set_failing(true);
        let report = h.tx.tick(h.t0).await;
        assert!(report.send_failed);
        assert_eq!(h.tx.scheduler().failed(), 1);

        // No retry inside the period
        let report = h.tx.tick(h.t0 + ms(5)).await;
        assert!(report.frame.is_none());

        h.link.set_failing(false);
        let report = h.tx.tick(h.t0 + ms(20)).await;
        assert!(!report.send_failed);
        assert_eq!(h.link.get_sent_frames().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_stick_read_keeps_previous_sample() {
        let config = Config::default();
        let mut calls = 0;
        let mut analog = MockAnalogSource::new();
        analog.expect_read_channel().returning(move |index| {
            calls += 1;
            if calls > NUM_CHANNELS {
                Err(TransmitterError::Input("ADC timeout".to_string()))
            } else if index == 0 {
                Ok(15314)
            } else {
                Ok(13500)
            }
        });
        let mut pins = MockDigitalInputs::new();
        pins.expect_read_pin().returning(|_| Ok(Level::High));

        let t0 = Instant::now();
        let link = MockRadioLink::new();
        let mut tx = Transmitter::new(&config, analog, pins, LogDisplay::new(), link, t0).unwrap();
        tx.tick(t0).await;
        let frame = tx.tick(t0 + ms(20)).await.frame.unwrap();
        assert_eq!(frame.throttle, 2000);
    }

    // ==================== Keypad Tests ====================

    #[tokio::test]
    async fn test_press_in_normal_mode_is_ignored() {
        let mut h = harness(&Config::default());
        h.press(6, 0).await;
        assert_eq!(h.tx.store().trims(), [0; NUM_CHANNELS]);
    }

    #[tokio::test]
    async fn test_trim_press_reaches_next_frame() {
        let mut config = Config::default();
        config.menu.screen_count = 3;
        let mut h = harness(&config);
        h.tx = h.tx.with_selector(Selector::Counter({
            let counter = EncoderCounter::new();
            counter.add(1);
            counter
        }));

        let end = h.press(6, 0).await;
        assert_eq!(h.tx.mode(), Mode::TrimEdit);
        assert_eq!(h.tx.store().trim(ChannelId::Yaw), 5);

        let frame = h.tx.tick(h.t0 + ms(end + 20)).await.frame.unwrap();
        assert_eq!(frame.yaw, 1505);
    }

    #[tokio::test]
    async fn test_press_applied_in_same_tick_as_frame() {
        let mut h = harness(&Config::default());
        let counter = EncoderCounter::new();
        counter.add(2); // rate edit
        h.tx = h.tx.with_selector(Selector::Counter(counter));
        h.samples.lock().unwrap()[2] = 12042; // roll full, inverted -> 2000

        h.pressed.lock().unwrap().push(1); // roll -
        h.tx.tick(h.t0).await;
        let report = h.tx.tick(h.t0 + ms(60)).await;

        assert_eq!(
            report.adjustments,
            vec![Adjustment::Rate { channel: ChannelId::Roll, direction: -1 }]
        );
        // 1500 + 500 * 90 / 100
        assert_eq!(report.frame.unwrap().roll, 1950);
    }

    // ==================== Selector Tests ====================

    #[tokio::test]
    async fn test_polled_selector_changes_mode() {
        let config = Config::default();
        let sequence = [
            (Level::High, Level::High),
            (Level::High, Level::Low),
            (Level::Low, Level::Low),
            (Level::Low, Level::High),
            (Level::High, Level::High),
        ];
        let current = Arc::new(Mutex::new((Level::High, Level::High)));

        let mut analog = MockAnalogSource::new();
        analog.expect_read_channel().returning(|_| Ok(13500));
        let mut pins = MockDigitalInputs::new();
        let pin_state = current.clone();
        pins.expect_read_pin().returning(move |pin| {
            let (a, b) = *pin_state.lock().unwrap();
            Ok(match pin {
                8 => a,
                9 => b,
                _ => Level::High,
            })
        });

        let t0 = Instant::now();
        let link = MockRadioLink::new();
        let mut tx = Transmitter::new(&config, analog, pins, LogDisplay::new(), link, t0)
            .unwrap()
            .with_selector(Selector::Polled {
                decoder: QuadratureDecoder::new(4),
                pin_a: 8,
                pin_b: 9,
            });

        for (i, levels) in sequence.into_iter().enumerate() {
            *current.lock().unwrap() = levels;
            tx.tick(t0 + ms(i as u64 * 5)).await;
        }

        // One counter-clockwise detent from Normal wraps to the last screen
        assert_eq!(tx.mode(), Mode::RateEdit);
    }

    #[tokio::test]
    async fn test_counter_selector_wraps_backwards() {
        let mut h = harness(&Config::default());
        let counter = EncoderCounter::new();
        h.tx = h.tx.with_selector(Selector::Counter(counter.clone()));

        counter.add(-1);
        h.tx.tick(h.t0).await;
        assert_eq!(h.tx.mode(), Mode::RateEdit);

        counter.add(-1);
        h.tx.tick(h.t0 + ms(5)).await;
        assert_eq!(h.tx.mode(), Mode::TrimEdit);
    }

    // ==================== Display Tests ====================

    #[tokio::test]
    async fn test_display_refresh_is_gated() {
        let mut h = harness(&Config::default());
        h.tx.tick(h.t0).await;
        assert_eq!(h.tx.display().lines()[2], "THR: 1500  PIT: 1500");

        h.samples.lock().unwrap()[0] = 15314;
        h.tx.tick(h.t0 + ms(100)).await;
        assert_eq!(h.tx.display().lines()[2], "THR: 1500  PIT: 1500");

        h.tx.tick(h.t0 + ms(200)).await;
        assert_eq!(h.tx.display().lines()[2], "THR: 2000  PIT: 1500");
    }

    #[tokio::test]
    async fn test_fault_indicator_on_screen() {
        let mut h = harness(&Config::default());
        h.tx = h.tx.with_faults(PeripheralFaults { sticks: true, ..Default::default() });
        h.tx.tick(h.t0).await;
        assert_eq!(h.tx.display().lines()[7], "FAULT: STICKS");
    }

    #[tokio::test]
    async fn test_display_disabled() {
        let mut config = Config::default();
        config.display.enabled = false;
        let mut h = harness(&config);
        h.tx.tick(h.t0).await;
        assert!(h.tx.display().lines().iter().all(String::is_empty));
    }

    // ==================== Telemetry Tests ====================

    #[tokio::test]
    async fn test_frame_log_written() {
        let dir = tempfile::TempDir::new().unwrap();
        let logger = FrameLogger::new(dir.path(), 100, 2).unwrap();
        let mut h = harness(&Config::default());
        h.tx = h.tx.with_frame_logger(logger, PeriodicGate::new(ms(100)));

        for at in (0..=200).step_by(5) {
            h.tx.tick(h.t0 + ms(at)).await;
        }
        h.tx.flush_frame_log();

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let path = files[0].as_ref().unwrap().path();
        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents.lines().count(), 3);
        assert!(contents.contains("\"mode\":\"normal\""));
    }

    // ==================== Fault Summary Tests ====================

    #[test]
    fn test_healthy_has_no_summary() {
        assert_eq!(PeripheralFaults::default().summary(), None);
    }

    #[test]
    fn test_summary_lists_all_faults() {
        let faults = PeripheralFaults { sticks: true, keypad: true, display: true };
        assert_eq!(faults.summary().as_deref(), Some("FAULT: STICKS KEYS DISP"));
    }

    #[test]
    fn test_tokio_test_block_on_tick() {
        let mut h = harness(&Config::default());
        let report = tokio_test::block_on(h.tx.tick(h.t0));
        assert!(report.frame.is_some());
    }
}
