use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::models::{TimerPatch, TimerSnapshot, TimerStatus};
use crate::service::match_timer::MatchTimer;

/// Drives a [`MatchTimer`] with a periodic tick.
///
/// The ticking task only exists while the timer runs. Pausing, stopping,
/// resetting, hitting the cap, or dropping the clock ends it.
pub struct MatchClock {
    timer: Arc<Mutex<MatchTimer>>,
    period: Duration,
    ticker: Option<JoinHandle<()>>,
}

impl MatchClock {
    pub fn new(initial: TimerSnapshot, period: Duration) -> Self {
        Self {
            timer: Arc::new(Mutex::new(MatchTimer::new(initial))),
            period,
            ticker: None,
        }
    }

    /// Starts (or re-stamps) the timer. Must be called from a tokio runtime.
    pub fn start(&mut self) -> TimerPatch {
        let patch = {
            let mut timer = self.lock();
            timer.start();
            timer.patch()
        };

        if !self.is_ticking() {
            self.ticker = Some(spawn_ticker(Arc::clone(&self.timer), self.period));
            debug!(period_ms = self.period.as_millis() as u64, "Match clock started");
        }
        patch
    }

    pub fn pause(&mut self) -> TimerPatch {
        self.cancel_ticker();
        let mut timer = self.lock();
        timer.pause();
        timer.patch()
    }

    pub fn stop(&mut self) -> TimerPatch {
        self.cancel_ticker();
        let mut timer = self.lock();
        timer.stop();
        timer.patch()
    }

    pub fn reset(&mut self) -> TimerPatch {
        self.cancel_ticker();
        let mut timer = self.lock();
        timer.reset();
        timer.patch()
    }

    pub fn elapsed(&self) -> u32 {
        self.lock().elapsed()
    }

    pub fn remaining(&self) -> u32 {
        self.lock().remaining()
    }

    pub fn status(&self) -> TimerStatus {
        self.lock().status()
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.lock().snapshot().clone()
    }

    /// Whether a tick task is currently scheduled.
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn cancel_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
            debug!("Match clock tick cancelled");
        }
    }

    fn lock(&self) -> MutexGuard<'_, MatchTimer> {
        // A panic while holding the lock cannot leave the counter half-written.
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MatchClock {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

fn spawn_ticker(timer: Arc<Mutex<MatchTimer>>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            interval.tick().await;

            let advanced = {
                let mut timer = timer.lock().unwrap_or_else(PoisonError::into_inner);
                timer.tick()
            };
            if !advanced {
                debug!("Match clock stopped ticking");
                break;
            }
        }
    })
}
