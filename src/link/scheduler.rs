//! # Transmit Scheduling
//!
//! Elapsed-time gates for the periodic work of the control loop.
//!
//! A gate never blocks: the loop asks it each tick whether the period has
//! passed, so input stays responsive between gated actions.

use std::time::{Duration, Instant};

/// Fires at most once per period.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use rc_transmitter::link::scheduler::PeriodicGate;
///
/// let t0 = Instant::now();
/// let mut gate = PeriodicGate::new(Duration::from_millis(20));
///
/// assert!(gate.ready(t0));
/// assert!(!gate.ready(t0 + Duration::from_millis(19)));
/// assert!(gate.ready(t0 + Duration::from_millis(20)));
/// ```
#[derive(Debug, Clone)]
pub struct PeriodicGate {
    period: Duration,
    last: Option<Instant>,
}

impl PeriodicGate {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Returns true (and restarts the period) when the first call is made or
    /// at least one period has elapsed since the last firing.
    pub fn ready(&mut self, now: Instant) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.period,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

/// Send-period gate with delivery counters.
///
/// Sends are fire-and-forget: a failure is counted, never retried, and the
/// next period tries again with fresh values.
#[derive(Debug, Clone)]
pub struct TransmitScheduler {
    gate: PeriodicGate,
    sent: u64,
    failed: u64,
}

impl TransmitScheduler {
    /// Creates a scheduler sending every `period` (20 ms = 50 Hz by default).
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            gate: PeriodicGate::new(period),
            sent: 0,
            failed: 0,
        }
    }

    /// Whether a frame should be built and sent at `now`.
    pub fn due(&mut self, now: Instant) -> bool {
        self.gate.ready(now)
    }

    pub fn record_sent(&mut self) {
        self.sent += 1;
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    #[must_use]
    pub fn sent(&self) -> u64 {
        self.sent
    }

    #[must_use]
    pub fn failed(&self) -> u64 {
        self.failed
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.gate.period()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_gate_fires_immediately() {
        let mut gate = PeriodicGate::new(ms(200));
        assert!(gate.ready(Instant::now()));
    }

    #[test]
    fn test_gate_never_faster_than_period() {
        let t0 = Instant::now();
        let mut gate = PeriodicGate::new(ms(20));
        let mut fired = Vec::new();

        for tick in 0..=100u64 {
            let now = t0 + ms(tick);
            if gate.ready(now) {
                fired.push(tick);
            }
        }

        assert_eq!(fired, vec![0, 20, 40, 60, 80, 100]);
    }

    #[test]
    fn test_gate_with_coarse_ticks() {
        let t0 = Instant::now();
        let mut gate = PeriodicGate::new(ms(20));
        let mut fired = Vec::new();

        for tick in (0..=60u64).step_by(15) {
            if gate.ready(t0 + ms(tick)) {
                fired.push(tick);
            }
        }

        // Intervals between firings are all >= 20 ms
        assert_eq!(fired, vec![0, 30, 60]);
    }

    #[test]
    fn test_scheduler_counters() {
        let mut scheduler = TransmitScheduler::new(ms(20));
        scheduler.record_sent();
        scheduler.record_sent();
        scheduler.record_failure();

        assert_eq!(scheduler.sent(), 2);
        assert_eq!(scheduler.failed(), 1);
        assert_eq!(scheduler.period(), ms(20));
    }

    #[test]
    fn test_scheduler_due_gates_by_period() {
        let t0 = Instant::now();
        let mut scheduler = TransmitScheduler::new(ms(20));
        assert!(scheduler.due(t0));
        assert!(!scheduler.due(t0 + ms(5)));
        assert!(scheduler.due(t0 + ms(25)));
    }
}
