//! Session statistics.

use std::collections::VecDeque;
use std::time::Instant;

/// Number of recent arrivals kept for rate estimation.
const RATE_WINDOW: usize = 100;

/// Counters for one probe session, host or client side.
///
/// Shared across tasks behind a `parking_lot::RwLock`; the owning loop
/// writes, anyone may snapshot via `clone`.
#[derive(Debug, Clone)]
pub struct ProbeStats {
    /// Data packets sent (host) or received (client).
    pub packets: u64,

    /// Acknowledgments seen (host) or sent (client).
    pub acks: u64,

    /// Restart sentinels handled (host) or sent (client).
    pub restarts: u64,

    /// Drops confirmed by the monitor so far.
    pub confirmed_drops: u64,

    /// Loss reports emitted.
    pub reports: u64,

    /// Recent arrival timestamps for rate estimation.
    arrivals: VecDeque<Instant>,

    /// Session start.
    started_at: Instant,
}

impl Default for ProbeStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeStats {
    pub fn new() -> Self {
        Self {
            packets: 0,
            acks: 0,
            restarts: 0,
            confirmed_drops: 0,
            reports: 0,
            arrivals: VecDeque::with_capacity(RATE_WINDOW),
            started_at: Instant::now(),
        }
    }

    pub fn record_packet(&mut self) {
        self.packets += 1;
    }

    pub fn record_ack(&mut self) {
        self.acks += 1;
        if self.arrivals.len() >= RATE_WINDOW {
            self.arrivals.pop_front();
        }
        self.arrivals.push_back(Instant::now());
    }

    pub fn record_restart(&mut self) {
        self.restarts += 1;
    }

    pub fn record_report(&mut self, dropped: u32) {
        self.reports += 1;
        self.confirmed_drops += u64::from(dropped);
    }

    /// Acknowledgment arrival rate over the recent window (acks/sec).
    pub fn ack_rate(&self) -> f64 {
        if self.arrivals.len() < 2 {
            return 0.0;
        }
        let span = self
            .arrivals
            .back()
            .unwrap()
            .duration_since(*self.arrivals.front().unwrap());
        if span.is_zero() {
            return 0.0;
        }
        (self.arrivals.len() - 1) as f64 / span.as_secs_f64()
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}
