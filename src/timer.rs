use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// A repeating timer running on the tokio runtime.
///
/// `on_tick` is called from the timer task and must not block; pollers use it
/// to spawn their cycle as a separate task. Stopping the timer (or dropping
/// it) aborts the timer task only, so a cycle that already started runs to
/// completion.
pub struct PollTimer {
    handle: JoinHandle<()>,
}

impl PollTimer {
    /// Must be called from within a tokio runtime.
    pub fn start<F>(period: Duration, fire_immediately: bool, on_tick: F) -> PollTimer
    where
        F: Fn() + Send + 'static,
    {
        let first = if fire_immediately {
            Instant::now()
        } else {
            Instant::now() + period
        };
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                on_tick();
            }
        });
        PollTimer { handle }
    }

    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Held for the duration of one poll cycle; released on drop however the
/// cycle ends.
pub struct PollingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PollingGuard<'a> {
    /// `None` when a cycle is already in flight.
    pub fn try_acquire(flag: &'a AtomicBool) -> Option<PollingGuard<'a>> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PollingGuard { flag })
    }
}

impl<'a> Drop for PollingGuard<'a> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
