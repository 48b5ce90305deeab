//! Fixed-interval refresh scheduler.
//!
//! Owns the deadline for the next automatic refresh and a monotonically
//! increasing refresh signal. All operations take the current time as an
//! argument, so the countdown arithmetic is deterministic under test.
//!
//! ```text
//!  running:  remaining = deadline - now
//!  paused:   remaining = deadline - paused_at      (frozen)
//!  resume:   deadline += now - paused_at
//! ```

use std::time::{Duration, Instant};

/// Value of the refresh signal after a bump.
pub type RefreshSignal = u64;

#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    interval: Duration,
    deadline: Instant,
    paused_at: Option<Instant>,
    signal: RefreshSignal,
}

impl RefreshScheduler {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            deadline: now + interval,
            paused_at: None,
            signal: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current value of the refresh signal. Zero until the first refresh.
    pub fn signal(&self) -> RefreshSignal {
        self.signal
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Emit the initial refresh and arm the first deadline.
    pub fn start(&mut self, now: Instant) -> RefreshSignal {
        self.deadline = now + self.interval;
        self.bump()
    }

    /// Time left until the next automatic refresh, clamped to `[0, interval]`.
    pub fn remaining(&self, now: Instant) -> Duration {
        let reference = self.paused_at.unwrap_or(now);
        self.deadline
            .saturating_duration_since(reference)
            .min(self.interval)
    }

    /// Freeze the countdown. No-op when already paused.
    pub fn pause(&mut self, now: Instant) {
        if self.paused_at.is_none() {
            self.paused_at = Some(now);
        }
    }

    /// Unfreeze the countdown, shifting the deadline by the paused duration.
    /// No-op when not paused.
    pub fn resume(&mut self, now: Instant) {
        if let Some(paused_at) = self.paused_at.take() {
            self.deadline += now.saturating_duration_since(paused_at);
        }
    }

    /// Flip between paused and running. Returns `true` when now paused.
    pub fn toggle_pause(&mut self, now: Instant) -> bool {
        if self.is_paused() {
            self.resume(now);
        } else {
            self.pause(now);
        }
        self.is_paused()
    }

    /// Refresh immediately regardless of pause state and restart the countdown
    /// at the full interval. A paused scheduler stays paused.
    pub fn trigger_now(&mut self, now: Instant) -> RefreshSignal {
        self.deadline = now + self.interval;
        if self.paused_at.is_some() {
            self.paused_at = Some(now);
        }
        self.bump()
    }

    /// Emit a refresh when the deadline has passed. Never fires while paused.
    pub fn poll(&mut self, now: Instant) -> Option<RefreshSignal> {
        if self.paused_at.is_some() || now < self.deadline {
            return None;
        }
        self.deadline = now + self.interval;
        Some(self.bump())
    }

    fn bump(&mut self) -> RefreshSignal {
        self.signal += 1;
        self.signal
    }
}

/// Format a countdown as `m:ss`.
pub fn format_countdown(remaining: Duration) -> String {
    let total_secs = remaining.as_secs();
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_countdown_starts_at_full_interval() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(ms(10_000), t0);
        assert_eq!(s.start(t0), 1);
        assert_eq!(s.remaining(t0), ms(10_000));
        assert_eq!(s.remaining(t0 + ms(2_500)), ms(7_500));
    }

    #[test]
    fn test_pause_freezes_and_resume_shifts_deadline() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(ms(10_000), t0);
        s.start(t0);

        s.pause(t0 + ms(3_000));
        assert_eq!(s.remaining(t0 + ms(3_000)), ms(7_000));
        assert_eq!(s.remaining(t0 + ms(4_000)), ms(7_000));
        assert_eq!(s.remaining(t0 + ms(60_000)), ms(7_000));

        s.resume(t0 + ms(5_000));
        assert_eq!(s.remaining(t0 + ms(5_000)), ms(7_000));
        // Deadline moved from 10s to 12s.
        assert_eq!(s.poll(t0 + ms(11_999)), None);
        assert_eq!(s.poll(t0 + ms(12_000)), Some(2));
    }

    #[test]
    fn test_no_refresh_while_paused() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(ms(1_000), t0);
        s.start(t0);
        s.pause(t0 + ms(500));
        assert_eq!(s.poll(t0 + ms(5_000)), None);
        assert_eq!(s.signal(), 1);
    }

    #[test]
    fn test_double_pause_and_resume_are_noops() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(ms(10_000), t0);
        s.start(t0);
        s.pause(t0 + ms(1_000));
        s.pause(t0 + ms(4_000));
        assert_eq!(s.remaining(t0 + ms(4_000)), ms(9_000));
        s.resume(t0 + ms(6_000));
        s.resume(t0 + ms(8_000));
        assert_eq!(s.remaining(t0 + ms(6_000)), ms(9_000));
    }

    #[test]
    fn test_trigger_now_resets_and_emits_exactly_once() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(ms(10_000), t0);
        s.start(t0);
        let before = s.signal();
        let sig = s.trigger_now(t0 + ms(4_000));
        assert_eq!(sig, before + 1);
        assert_eq!(s.signal(), before + 1);
        assert_eq!(s.remaining(t0 + ms(4_000)), ms(10_000));
        assert_eq!(s.poll(t0 + ms(13_999)), None);
        assert_eq!(s.poll(t0 + ms(14_000)), Some(before + 2));
    }

    #[test]
    fn test_trigger_now_while_paused_stays_paused_at_full_interval() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(ms(10_000), t0);
        s.start(t0);
        s.pause(t0 + ms(2_000));
        s.trigger_now(t0 + ms(3_000));
        assert!(s.is_paused());
        assert_eq!(s.remaining(t0 + ms(9_000)), ms(10_000));
        s.resume(t0 + ms(9_000));
        assert_eq!(s.remaining(t0 + ms(9_000)), ms(10_000));
    }

    #[test]
    fn test_poll_reschedules_from_now() {
        let t0 = Instant::now();
        let mut s = RefreshScheduler::new(ms(1_000), t0);
        s.start(t0);
        // A late tick schedules the next deadline relative to the tick.
        assert_eq!(s.poll(t0 + ms(1_700)), Some(2));
        assert_eq!(s.remaining(t0 + ms(1_700)), ms(1_000));
    }

    #[test]
    fn test_countdown_stays_in_bounds_for_any_sequence() {
        let t0 = Instant::now();
        let interval = ms(10_000);
        let mut s = RefreshScheduler::new(interval, t0);
        s.start(t0);
        let mut t = t0;
        for step in 0..400u64 {
            t += ms(137 * (step % 7 + 1));
            match step % 5 {
                0 => s.pause(t),
                1 => s.resume(t),
                2 => {
                    s.poll(t);
                }
                3 if step % 3 == 0 => {
                    s.trigger_now(t);
                }
                _ => {}
            }
            let r = s.remaining(t);
            assert!(r <= interval, "remaining {:?} exceeds interval", r);
        }
    }

    #[test]
    fn test_format_countdown() {
        assert_eq!(format_countdown(ms(600_000)), "10:00");
        assert_eq!(format_countdown(ms(61_999)), "1:01");
        assert_eq!(format_countdown(Duration::ZERO), "0:00");
    }
}
