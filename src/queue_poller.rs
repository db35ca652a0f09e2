use crate::config_file::{poll_interval, WatchConfig};
use crate::integrations::remote_integration::QueueHost;
use crate::timer::{PollTimer, PollingGuard};
use crate::watch::{EnvironmentKey, EnvironmentRef};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Refreshes build-queue views, but only for environments whose queue is
/// expanded. The timer runs exactly while at least one queue is tracked.
///
/// Tracking calls must happen inside a tokio runtime.
#[derive(Clone)]
pub struct QueuePoller {
    inner: Arc<Inner>,
}

struct Inner {
    host: Arc<dyn QueueHost>,
    is_polling: AtomicBool,
    state: Mutex<QueueState>,
}

struct QueueState {
    poll_interval: Duration,
    expanded: HashMap<EnvironmentKey, EnvironmentRef>,
    timer: Option<PollTimer>,
}

impl QueuePoller {
    pub fn new(host: Arc<dyn QueueHost>, config: &WatchConfig) -> QueuePoller {
        QueuePoller {
            inner: Arc::new(Inner {
                host,
                is_polling: AtomicBool::new(false),
                state: Mutex::new(QueueState {
                    poll_interval: config.queue_poll_interval(),
                    expanded: HashMap::new(),
                    timer: None,
                }),
            }),
        }
    }

    pub fn track_expanded(&self, environment: &EnvironmentRef) {
        let mut state = self.inner.state.lock();
        state.expanded.insert(environment.key(), environment.clone());
        if state.timer.is_none() {
            debug!("--QueuePoller--: Starting, polling every {}s.", state.poll_interval.as_secs());
            state.timer = Some(self.spawn_timer(state.poll_interval, true));
        }
    }

    pub fn track_collapsed(&self, environment: &EnvironmentRef) {
        self.untrack(&environment.key());
    }

    pub fn clear_environment(&self, environment: &EnvironmentRef) {
        self.untrack(&environment.key());
    }

    /// Swaps in fresh connection details for an already tracked environment.
    pub fn update_environment(&self, environment: &EnvironmentRef) {
        let mut state = self.inner.state.lock();
        if let Some(tracked) = state.expanded.get_mut(&environment.key()) {
            *tracked = environment.clone();
        }
    }

    pub fn clear_all(&self) {
        let mut state = self.inner.state.lock();
        state.expanded.clear();
        if let Some(timer) = state.timer.take() {
            timer.stop();
            debug!("--QueuePoller--: Stopped, nothing tracked.");
        }
    }

    pub fn update_poll_interval_seconds(&self, seconds: u64) {
        let interval = poll_interval(seconds);
        let mut state = self.inner.state.lock();
        if state.poll_interval == interval {
            return;
        }
        state.poll_interval = interval;
        if let Some(timer) = state.timer.take() {
            timer.stop();
            state.timer = Some(self.spawn_timer(interval, false));
        }
    }

    pub fn dispose(&self) {
        self.clear_all();
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().timer.is_some()
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.state.lock().poll_interval
    }

    pub fn tracked_environments(&self) -> Vec<EnvironmentRef> {
        self.inner.state.lock().expanded.values().cloned().collect()
    }

    /// Refreshes every tracked queue now, unless a round is already running.
    pub async fn refresh_tracked(&self) {
        self.inner.refresh_tracked().await;
    }

    fn untrack(&self, key: &EnvironmentKey) {
        let mut state = self.inner.state.lock();
        state.expanded.remove(key);
        if state.expanded.is_empty() {
            if let Some(timer) = state.timer.take() {
                timer.stop();
                debug!("--QueuePoller--: Stopped, nothing tracked.");
            }
        }
    }

    fn spawn_timer(&self, period: Duration, fire_immediately: bool) -> PollTimer {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        PollTimer::start(period, fire_immediately, move || {
            if let Some(inner) = weak.upgrade() {
                tokio::spawn(async move {
                    inner.refresh_tracked().await;
                });
            }
        })
    }
}

impl Inner {
    async fn refresh_tracked(&self) {
        let _guard = match PollingGuard::try_acquire(&self.is_polling) {
            Some(guard) => guard,
            None => return,
        };

        let environments: Vec<EnvironmentRef> = self.state.lock().expanded.values().cloned().collect();
        for environment in &environments {
            if let Err(e) = self.host.refresh_queue_view(environment).await {
                warn!(
                    "--QueuePoller--: Failed to refresh the queue for {}. Details: {}",
                    environment.url, e
                );
            }
        }
    }
}
