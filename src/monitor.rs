//! Sliding-window dropped packet monitor.
//!
//! Fed an unordered, lossy stream of sequence ids, keeps a bounded trailing
//! window of state and counts the ids that never showed up. Drops are
//! detected retroactively: a gap only becomes visible once a higher id
//! arrives, and a suspected id is only *confirmed* dropped once it ages out
//! of the window without being observed.
//!
//! 32-bit sequence wraparound is a documented limit of the algorithm: at
//! 10 packets/sec the counter lasts around 13 years, so comparisons stay
//! plain integer ordering with saturating threshold math.

use std::collections::BTreeSet;
use std::fmt;
use std::time::{Duration, Instant};

/// One report cycle's outcome: newly confirmed drops out of the sequence
/// ids expected to have passed since the previous report boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LossReport {
    pub dropped: u32,
    pub expected: u32,
}

impl fmt::Display for LossReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dropped == 0 {
            write!(f, "Received all {} packets", self.expected)
        } else {
            write!(f, "Dropped {}/{} packets", self.dropped, self.expected)
        }
    }
}

/// Loss detector over a roughly monotonic sequence-id stream.
///
/// Single-writer by design: one instance is owned by exactly one task and
/// fed observations over a channel, never mutated concurrently.
#[derive(Debug)]
pub struct DropMonitor {
    /// Highest sequence id seen, `None` until the first observation.
    current: Option<u32>,

    /// Ids observed, restricted to the trailing window after each finalize.
    seen: BTreeSet<u32>,

    /// In-window ids not yet observed.
    suspected: BTreeSet<u32>,

    /// Boundary up to which a report has been issued.
    last_reported: u32,

    /// Trailing span of ids retained before aging out.
    window: u32,

    /// Report cadence gate.
    report_interval: Duration,
    report_timer: Instant,
}

impl DropMonitor {
    pub fn new(window: u32, report_interval: Duration) -> Self {
        Self {
            current: None,
            seen: BTreeSet::new(),
            suspected: BTreeSet::new(),
            last_reported: 0,
            window,
            report_interval,
            report_timer: Instant::now(),
        }
    }

    /// Records one observed sequence id.
    ///
    /// Every id strictly between the previous high-water mark and `seq_id`
    /// that was never seen becomes a suspected drop. The high-water mark
    /// only ever advances; a late or duplicate arrival still clears its id
    /// from the suspects.
    pub fn observe(&mut self, seq_id: u32) {
        let Some(current) = self.current else {
            // First contact: anchor both the window and the report boundary
            // here so a mid-stream start is not misread as mass loss.
            self.current = Some(seq_id);
            self.last_reported = seq_id;
            self.seen.insert(seq_id);
            return;
        };

        for missing in current.saturating_add(1)..seq_id {
            if !self.seen.contains(&missing) {
                self.suspected.insert(missing);
            }
        }

        self.current = Some(current.max(seq_id));
        self.suspected.remove(&seq_id);
        self.seen.insert(seq_id);
    }

    /// Confirms suspected drops older than the window and garbage-collects
    /// seen ids past the same threshold. Returns the newly confirmed count.
    pub fn finalize(&mut self) -> u32 {
        let Some(current) = self.current else {
            return 0;
        };
        let threshold = current.saturating_sub(self.window);

        // split_off keeps >= threshold; what remains behind has aged out
        let kept = self.suspected.split_off(&threshold);
        let expired = std::mem::replace(&mut self.suspected, kept);

        let kept_seen = self.seen.split_off(&threshold);
        self.seen = kept_seen;

        expired.len() as u32
    }

    /// Finalizes and, when at least one sequence id has fully passed
    /// through the window since the last report, advances the report
    /// boundary and returns the tally.
    pub fn report(&mut self) -> Option<LossReport> {
        let current = self.current?;
        let dropped = self.finalize();

        let boundary = current.saturating_sub(self.window);
        let expected = boundary as i64 - self.last_reported as i64;
        if expected <= 0 && dropped == 0 {
            return None;
        }

        self.last_reported = self.last_reported.max(boundary);
        Some(LossReport {
            dropped,
            expected: expected.max(0) as u32,
        })
    }

    /// Timer-gated [`report`](Self::report): fires at the configured
    /// cadence, otherwise returns `None` without touching any state.
    pub fn poll_report(&mut self) -> Option<LossReport> {
        if self.report_timer.elapsed() < self.report_interval {
            return None;
        }
        self.report_timer = Instant::now();
        self.report()
    }

    /// Clears all window state, as if freshly constructed. Called when the
    /// stream is known to have restarted so resynchronization is never
    /// misreported as loss. The report timer keeps its cadence.
    pub fn reset(&mut self) {
        self.current = None;
        self.last_reported = 0;
        self.seen.clear();
        self.suspected.clear();
    }

    /// Number of sequence ids currently tracked across both sets.
    pub fn tracked_ids(&self) -> usize {
        self.seen.len() + self.suspected.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> DropMonitor {
        DropMonitor::new(2, Duration::from_secs(1))
    }

    #[test]
    fn test_monotone_stream_reports_no_drops() {
        let mut m = monitor();
        for seq in 0..=50 {
            m.observe(seq);
        }

        let report = m.report().unwrap();
        assert_eq!(report.dropped, 0);
        assert_eq!(report.expected, 48); // 50 - window - first id 0
        assert_eq!(report.to_string(), "Received all 48 packets");
    }

    #[test]
    fn test_single_gap_confirmed_once_aged_out() {
        let mut m = monitor();
        for seq in (0..=10).filter(|&s| s != 2) {
            m.observe(seq);
        }

        let report = m.report().unwrap();
        assert_eq!(report.dropped, 1);
        assert_eq!(report.expected, 8);
        assert_eq!(report.to_string(), "Dropped 1/8 packets");

        // the same gap is never re-reported
        for seq in 11..=20 {
            m.observe(seq);
        }
        let report = m.report().unwrap();
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn test_gap_still_in_window_is_not_confirmed() {
        let mut m = monitor();
        // id 3 missing but within WINDOW of current = 4
        for seq in [0, 1, 2, 4] {
            m.observe(seq);
        }
        assert_eq!(m.finalize(), 0);

        // once current advances past 3 + window it ages out; the fresh
        // gap at 5 is still inside the window and stays suspected
        m.observe(6);
        assert_eq!(m.finalize(), 1);
        assert_eq!(m.tracked_ids(), 3); // seen {4, 6}, suspected {5}
    }

    #[test]
    fn test_reordered_arrival_within_window_is_not_a_drop() {
        let mut m = monitor();
        for seq in [0, 2, 1, 3] {
            m.observe(seq);
        }

        assert_eq!(m.finalize(), 0);
        let report = m.report();
        assert!(report.is_none() || report.unwrap().dropped == 0);
    }

    #[test]
    fn test_duplicate_and_trailing_ids_are_harmless() {
        let mut m = monitor();
        for seq in [5, 6, 7, 6, 5, 8] {
            m.observe(seq);
        }

        let report = m.report().unwrap();
        assert_eq!(report.dropped, 0);
        assert_eq!(report.expected, 1); // only id 6 has cleared the window
    }

    #[test]
    fn test_high_water_mark_never_decreases() {
        let mut m = monitor();
        for seq in [10, 11, 12, 3] {
            m.observe(seq);
        }
        // the straggler must not drag the window back and mass-suspect 4..9
        m.observe(13);
        let report = m.report().unwrap();
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn test_reset_behaves_like_fresh_monitor() {
        let mut m = monitor();
        for seq in (0..=30).filter(|&s| s % 7 != 0) {
            m.observe(seq);
        }
        m.reset();
        assert_eq!(m.tracked_ids(), 0);

        let mut fresh = monitor();
        for seq in 100..=120 {
            m.observe(seq);
            fresh.observe(seq);
        }

        assert_eq!(m.report(), fresh.report());
    }

    #[test]
    fn test_mid_stream_start_is_not_mass_loss() {
        let mut m = monitor();
        m.observe(1_000_000);
        m.observe(1_000_001);
        m.observe(1_000_002);
        m.observe(1_000_003);

        let report = m.report().unwrap();
        assert_eq!(report.dropped, 0);
        assert_eq!(report.expected, 1);
    }

    #[test]
    fn test_memory_stays_bounded() {
        let mut m = monitor();
        for seq in 0..10_000 {
            // drop every 13th id to keep the suspect set busy
            if seq % 13 != 0 {
                m.observe(seq);
            }
            if seq % 100 == 0 {
                m.finalize();
            }
        }
        m.finalize();

        // after finalize only ids within the trailing window survive
        assert!(m.tracked_ids() <= 2 * (2 + 1));
    }

    #[test]
    fn test_report_requires_progress() {
        let mut m = monitor();
        assert!(m.report().is_none());

        m.observe(0);
        m.observe(1);
        // nothing has cleared the window yet
        assert!(m.report().is_none());
    }
}
