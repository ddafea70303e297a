use chrono::Utc;

use crate::models::{TimerPatch, TimerSnapshot, TimerStatus};

/// Elapsed-time tracker for one match session.
///
/// Elapsed seconds are counted by [`tick`](Self::tick), one per call while
/// running, and never exceed `duration + overtime`. Reaching the cap leaves the
/// status untouched; the caller decides when to pause or stop.
#[derive(Debug, Clone)]
pub struct MatchTimer {
    initial: TimerSnapshot,
    current: TimerSnapshot,
    elapsed: u32,
}

impl MatchTimer {
    pub fn new(initial: TimerSnapshot) -> Self {
        Self {
            current: initial.clone(),
            initial,
            elapsed: 0,
        }
    }

    /// Marks the timer running. Calling it again re-stamps `start_time`.
    pub fn start(&mut self) {
        self.current.start_time = Some(Utc::now());
        self.current.status = TimerStatus::Running;
    }

    pub fn pause(&mut self) {
        self.current.paused_time = Some(Utc::now());
        self.current.status = TimerStatus::Paused;
    }

    pub fn stop(&mut self) {
        self.current.status = TimerStatus::Stopped;
    }

    /// Back to the configuration the timer was built with, elapsed zeroed.
    pub fn reset(&mut self) {
        self.current = self.initial.clone();
        self.elapsed = 0;
    }

    /// Advances one second. Returns false when nothing changed: the timer is
    /// not running or the cap was already reached.
    pub fn tick(&mut self) -> bool {
        if self.current.status != TimerStatus::Running || self.is_expired() {
            return false;
        }
        self.elapsed += 1;
        true
    }

    pub fn remaining(&self) -> u32 {
        self.current.total_seconds().saturating_sub(self.elapsed)
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn status(&self) -> TimerStatus {
        self.current.status
    }

    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.current.total_seconds()
    }

    pub fn snapshot(&self) -> &TimerSnapshot {
        &self.current
    }

    /// Changeable fields of the current state, ready to persist.
    pub fn patch(&self) -> TimerPatch {
        TimerPatch {
            status: Some(self.current.status),
            start_time: self.current.start_time,
            paused_time: self.current.paused_time,
        }
    }
}

/// Renders seconds as `MM:SS`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_timer(duration: u32, overtime: Option<u32>) -> MatchTimer {
        let mut timer = MatchTimer::new(TimerSnapshot::new(duration, overtime));
        timer.start();
        timer
    }

    #[test]
    fn test_tick_only_counts_while_running() {
        let mut timer = MatchTimer::new(TimerSnapshot::new(60, None));
        assert!(!timer.tick());
        assert_eq!(timer.elapsed(), 0);

        timer.start();
        assert!(timer.tick());
        assert!(timer.tick());
        timer.pause();
        assert!(!timer.tick());
        assert_eq!(timer.elapsed(), 2);
        assert_eq!(timer.remaining(), 58);
    }

    #[test]
    fn test_elapsed_never_exceeds_cap() {
        let mut timer = running_timer(5, Some(2));
        for _ in 0..50 {
            timer.tick();
            assert!(timer.elapsed() <= 7);
        }
        assert_eq!(timer.elapsed(), 7);
        assert_eq!(timer.remaining(), 0);
        assert!(timer.is_expired());
        // The cap freezes the count, not the status.
        assert_eq!(timer.status(), TimerStatus::Running);
        assert!(!timer.tick());
    }

    #[test]
    fn test_reset_restores_initial_configuration() {
        let initial = TimerSnapshot::new(1920, Some(300));
        let mut timer = MatchTimer::new(initial.clone());
        timer.start();
        for _ in 0..42 {
            timer.tick();
        }
        timer.pause();

        timer.reset();
        assert_eq!(timer.snapshot(), &initial);
        assert_eq!(timer.elapsed(), 0);
        assert_eq!(timer.status(), TimerStatus::Stopped);

        // Reset is the same from any state.
        timer.reset();
        assert_eq!(timer.snapshot(), &initial);
    }

    #[test]
    fn test_repeated_start_restamps_start_time() {
        let mut timer = running_timer(60, None);
        let first = timer.snapshot().start_time;
        std::thread::sleep(std::time::Duration::from_millis(2));
        timer.start();

        assert_eq!(timer.status(), TimerStatus::Running);
        assert!(timer.snapshot().start_time > first);
    }

    #[test]
    fn test_stop_keeps_elapsed() {
        let mut timer = running_timer(60, None);
        timer.tick();
        timer.stop();
        assert_eq!(timer.status(), TimerStatus::Stopped);
        assert_eq!(timer.elapsed(), 1);
    }

    #[test]
    fn test_patch_reflects_current_state() {
        let mut timer = running_timer(60, None);
        timer.pause();
        let patch = timer.patch();
        assert_eq!(patch.status, Some(TimerStatus::Paused));
        assert!(patch.start_time.is_some());
        assert!(patch.paused_time.is_some());
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(1920), "32:00");
        assert_eq!(format_clock(6000), "100:00");
    }
}
