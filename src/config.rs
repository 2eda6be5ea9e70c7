//! Protocol configuration.

use std::time::Duration;

use crate::DEFAULT_WINDOW;

/// PLP tunables.
///
/// Fixed pacing instead of flow control is a deliberate simplification,
/// kept configurable rather than hard-coded.
#[derive(Debug, Clone)]
pub struct Config {
    /// Interval between probe packets sent by the host (milliseconds).
    pub pace_interval_ms: u64,

    /// Loss report cadence (milliseconds).
    pub report_interval_ms: u64,

    /// Client silence threshold before re-announcing (milliseconds).
    pub silence_threshold_ms: u64,

    /// Bound on a single blocking receive so timers stay responsive
    /// (milliseconds).
    pub recv_timeout_ms: u64,

    /// Trailing sequence-id span retained by the drop monitor.
    pub window: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pace_interval_ms: 100,
            report_interval_ms: 1000,
            silence_threshold_ms: 3000,
            recv_timeout_ms: 100,
            window: DEFAULT_WINDOW,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pace_interval(&self) -> Duration {
        Duration::from_millis(self.pace_interval_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    pub fn silence_threshold(&self) -> Duration {
        Duration::from_millis(self.silence_threshold_ms)
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }
}
