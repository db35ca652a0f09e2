use crate::config_file::{clamp_max_consecutive_errors, poll_interval, WatchConfig};
use crate::errors::{classify_fetch_error, FetchFailure};
use crate::evaluator::{evaluate, job_label, StatusNotification};
use crate::integrations::jenkins_response::LiveJob;
use crate::integrations::remote_integration::{
    PendingInputNotice, PendingInputQuery, PendingInputSummary, WatchHost, WatchServices,
};
use crate::job_status::BallColor;
use crate::timer::{PollTimer, PollingGuard};
use crate::watch::{BuildKey, EnvironmentKey, EnvironmentRef, JobKey, WatchedJobEntry};
use failure::Error;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Periodically re-checks every watched job and reports what changed.
///
/// Cheap to clone; clones share the same timer and caches.
#[derive(Clone)]
pub struct StatusPoller {
    inner: Arc<Inner>,
}

struct Inner {
    services: WatchServices,
    host: Arc<dyn WatchHost>,
    is_polling: AtomicBool,
    state: Mutex<PollerState>,
}

struct PollerState {
    poll_interval: Duration,
    max_consecutive_errors: u32,
    failure_counts: HashMap<JobKey, u32>,
    pending_input_signatures: HashMap<BuildKey, String>,
    timer: Option<PollTimer>,
}

impl PollerState {
    fn forget_job(&mut self, key: &JobKey) {
        self.failure_counts.remove(key);
        self.pending_input_signatures.retain(|build, _| build.job != *key);
    }

    /// Drops cached signatures for every build of `job` except `current`.
    fn forget_superseded_builds(&mut self, job: &JobKey, current: Option<&str>) {
        self.pending_input_signatures
            .retain(|build, _| build.job != *job || Some(build.build_url.as_str()) == current);
    }

    fn forget_environment(&mut self, environment: &EnvironmentKey) {
        self.failure_counts.retain(|job, _| !job.belongs_to(environment));
        self.pending_input_signatures
            .retain(|build, _| !build.job.belongs_to(environment));
    }
}

impl StatusPoller {
    pub fn new(services: WatchServices, host: Arc<dyn WatchHost>, config: &WatchConfig) -> StatusPoller {
        StatusPoller {
            inner: Arc::new(Inner {
                services,
                host,
                is_polling: AtomicBool::new(false),
                state: Mutex::new(PollerState {
                    poll_interval: config.status_poll_interval(),
                    max_consecutive_errors: config.max_consecutive_errors(),
                    failure_counts: HashMap::new(),
                    pending_input_signatures: HashMap::new(),
                    timer: None,
                }),
            }),
        }
    }

    /// Starts the timer and runs one cycle right away. No-op when running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut state = self.inner.state.lock();
        if state.timer.is_some() {
            return;
        }
        info!("--StatusPoller--: Starting, polling every {}s.", state.poll_interval.as_secs());
        state.timer = Some(self.spawn_timer(state.poll_interval, true));
    }

    /// Stops future cycles and drops every cache. A cycle already in flight
    /// still finishes.
    pub fn dispose(&self) {
        let mut state = self.inner.state.lock();
        if let Some(timer) = state.timer.take() {
            timer.stop();
        }
        state.failure_counts.clear();
        state.pending_input_signatures.clear();
        info!("--StatusPoller--: Disposed.");
    }

    pub fn is_running(&self) -> bool {
        self.inner.state.lock().timer.is_some()
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.state.lock().poll_interval
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
        info!("--StatusPoller--: Poll interval is now {}s.", interval.as_secs());
    }

    /// Also resets every failure counter, so the new threshold applies from
    /// zero.
    pub fn update_max_consecutive_errors(&self, count: u32) {
        let count = clamp_max_consecutive_errors(count);
        let mut state = self.inner.state.lock();
        if state.max_consecutive_errors == count {
            return;
        }
        state.max_consecutive_errors = count;
        state.failure_counts.clear();
        info!("--StatusPoller--: Notifying after {} consecutive errors.", count);
    }

    /// Runs one poll cycle now. Returns immediately if a cycle is in flight.
    pub async fn poll_watched_jobs(&self) {
        self.inner.poll_watched_jobs().await;
    }

    #[cfg(test)]
    pub(crate) fn cached_pending_inputs(&self) -> usize {
        self.inner.state.lock().pending_input_signatures.len()
    }

    #[cfg(test)]
    pub(crate) fn failure_count(&self, key: &JobKey) -> u32 {
        self.inner.state.lock().failure_counts.get(key).cloned().unwrap_or(0)
    }

    fn spawn_timer(&self, period: Duration, fire_immediately: bool) -> PollTimer {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        PollTimer::start(period, fire_immediately, move || {
            if let Some(inner) = weak.upgrade() {
                tokio::spawn(async move {
                    inner.poll_watched_jobs().await;
                });
            }
        })
    }
}

impl Inner {
    async fn poll_watched_jobs(&self) {
        let _guard = match PollingGuard::try_acquire(&self.is_polling) {
            Some(guard) => guard,
            None => {
                debug!("--StatusPoller--: Previous cycle still running, skipping.");
                return;
            }
        };

        let entries = match self.services.store.list_watched_jobs().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("--StatusPoller--: Unable to load watched jobs. Details: {}", e);
                return;
            }
        };
        if entries.is_empty() {
            return;
        }

        let environments = match self.services.environments.list_environments().await {
            Ok(environments) => environments,
            Err(e) => {
                warn!("--StatusPoller--: Unable to load environments. Details: {}", e);
                return;
            }
        };
        let environments: HashMap<EnvironmentKey, EnvironmentRef> =
            environments.into_iter().map(|env| (env.key(), env)).collect();

        let mut stale: Vec<EnvironmentKey> = Vec::new();
        let mut seen_stale: HashSet<EnvironmentKey> = HashSet::new();
        let mut changed = false;

        for entry in &entries {
            let env_key = entry.environment_key();
            match environments.get(&env_key) {
                Some(environment) => {
                    if self.check_job(entry, environment).await {
                        changed = true;
                    }
                }
                None => {
                    if seen_stale.insert(env_key.clone()) {
                        stale.push(env_key);
                    }
                }
            }
        }

        for env_key in &stale {
            info!(
                "--StatusPoller--: Environment {} no longer exists, removing its watches.",
                env_key
            );
            if let Err(e) = self
                .services
                .store
                .remove_watches_for_environment(env_key.scope, &env_key.environment_id)
                .await
            {
                warn!(
                    "--StatusPoller--: Unable to remove watches for {}. Details: {}",
                    env_key, e
                );
            }
            self.state.lock().forget_environment(env_key);
            changed = true;
        }

        info!(
            "--StatusPoller--: Checked {} watched jobs, {} stale environments removed.",
            entries.len() - stale_entry_count(&entries, &stale),
            stale.len()
        );

        if changed {
            self.host.refresh_tree();
        }
    }

    /// Returns whether the tree needs a repaint.
    async fn check_job(&self, entry: &WatchedJobEntry, environment: &EnvironmentRef) -> bool {
        match self.services.jobs.get_job(environment, &entry.job_url).await {
            Ok(live) => {
                self.state.lock().failure_counts.remove(&entry.key());
                self.apply_live_job(entry, environment, &live).await
            }
            Err(e) => self.handle_fetch_error(entry, environment, &e).await,
        }
    }

    async fn apply_live_job(&self, entry: &WatchedJobEntry, environment: &EnvironmentRef, live: &LiveJob) -> bool {
        let evaluation = evaluate(
            entry,
            &live.name,
            live.color.as_deref(),
            live.last_completed_build.as_ref(),
            &environment.url,
        );
        let label = job_label(entry, &live.name).to_string();

        match evaluation.notification {
            Some(StatusNotification::Failure { ref message }) => self.services.notifier.notify_failure(message),
            Some(StatusNotification::Recovery { ref message }) => self.services.notifier.notify_recovery(message),
            Some(StatusNotification::Completion(ref notice)) => self.services.notifier.notify_completion(notice),
            None => {}
        }

        self.check_pending_input(entry, environment, live, &label).await;

        let mut update = evaluation.status_update();
        if !live.name.trim().is_empty() && live.name != entry.job_name {
            update.job_name = Some(live.name.clone());
        }
        if !update.is_empty() {
            debug!("--StatusPoller--: Persisting {:?} for {}.", update, entry.job_url);
            if let Err(e) = self
                .services
                .store
                .update_watch_status(entry.scope, &entry.environment_id, &entry.job_url, update)
                .await
            {
                warn!(
                    "--StatusPoller--: Unable to save status for {}. Details: {}",
                    entry.job_url, e
                );
            }
        }

        evaluation.should_refresh
    }

    async fn check_pending_input(
        &self,
        entry: &WatchedJobEntry,
        environment: &EnvironmentRef,
        live: &LiveJob,
        label: &str,
    ) {
        let job = entry.key();
        let build = match live.last_build {
            Some(ref build) => build,
            None => {
                self.state.lock().forget_superseded_builds(&job, None);
                return;
            }
        };
        self.state
            .lock()
            .forget_superseded_builds(&job, Some(build.url.as_str()));
        let key = BuildKey {
            job,
            build_url: build.url.clone(),
        };

        let is_building = build
            .building
            .or_else(|| BallColor::decode(live.color.as_deref()).is_building)
            .unwrap_or(false);
        if !is_building {
            self.clear_pending_input(&key);
            return;
        }

        let query = PendingInputQuery {
            max_age: self.state.lock().poll_interval,
            notify: false,
        };
        let summary = match self
            .services
            .pending_inputs
            .get_summary(environment, &build.url, query)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                debug!(
                    "--StatusPoller--: Unable to read pending inputs for {}. Details: {}",
                    build.url, e
                );
                return;
            }
        };

        if !summary.awaiting_input {
            self.clear_pending_input(&key);
            return;
        }

        let signature = pending_input_signature(&summary);
        let is_new = {
            let mut state = self.state.lock();
            let previous = state.pending_input_signatures.insert(key, signature.clone());
            previous.as_ref() != Some(&signature)
        };
        if is_new {
            self.services.notifier.notify_pending_input(&PendingInputNotice {
                job_label: label.to_string(),
                environment_url: environment.url.clone(),
                build_url: build.url.clone(),
                input_count: summary.count,
                input_message: summary.message.clone(),
            });
        }
    }

    fn clear_pending_input(&self, key: &BuildKey) {
        if self.state.lock().pending_input_signatures.remove(key).is_some() {
            debug!("--StatusPoller--: Cleared pending input for {}.", key.build_url);
        }
    }

    async fn handle_fetch_error(&self, entry: &WatchedJobEntry, environment: &EnvironmentRef, err: &Error) -> bool {
        let key = entry.key();
        match classify_fetch_error(err) {
            FetchFailure::NotFound => {
                info!(
                    "--StatusPoller--: {} no longer exists on {}, removing the watch.",
                    entry.job_name, environment.url
                );
                self.state.lock().forget_job(&key);
                match self
                    .services
                    .store
                    .remove_watch(entry.scope, &entry.environment_id, &entry.job_url)
                    .await
                {
                    Ok(true) => {
                        self.services.notifier.notify_watch_error(&format!(
                            "Stopped watching {} on {}: the job no longer exists.",
                            entry.job_name, environment.url
                        ));
                        true
                    }
                    Ok(false) => false,
                    Err(e) => {
                        warn!(
                            "--StatusPoller--: Unable to remove watch for {}. Details: {}",
                            entry.job_url, e
                        );
                        false
                    }
                }
            }
            FetchFailure::Transient => {
                let (count, threshold) = {
                    let mut state = self.state.lock();
                    let threshold = state.max_consecutive_errors;
                    let count = state.failure_counts.entry(key).or_insert(0);
                    *count += 1;
                    (*count, threshold)
                };
                warn!(
                    "--StatusPoller--: Failed to poll {} ({}/{}). Details: {}",
                    entry.job_url, count, threshold, err
                );
                if count == threshold {
                    self.services.notifier.notify_watch_error(&format!(
                        "Unable to poll {} on {} after {} attempts: {}",
                        entry.job_name, environment.url, count, err
                    ));
                }
                false
            }
        }
    }
}

fn pending_input_signature(summary: &PendingInputSummary) -> String {
    match summary.signature {
        Some(ref signature) => signature.clone(),
        None => format!(
            "{}:{}",
            summary.count,
            summary.message.as_ref().map(|m| m.as_str()).unwrap_or("")
        ),
    }
}

fn stale_entry_count(entries: &[WatchedJobEntry], stale: &[EnvironmentKey]) -> usize {
    entries
        .iter()
        .filter(|entry| stale.contains(&entry.environment_key()))
        .count()
}

#[cfg(test)]
#[path = "status_poller_tests.rs"]
mod tests;
