//! In-memory collaborators for poller tests.

use crate::errors::RequestError;
use crate::integrations::jenkins_response::{BuildRef, LiveJob};
use crate::integrations::remote_integration::*;
use crate::watch::{EnvironmentRef, WatchScope, WatchStatusUpdate, WatchedJobEntry};
use async_trait::async_trait;
use failure::{format_err, Error};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const ENV_URL: &str = "https://jenkins.example.com";

pub fn environment(id: &str) -> EnvironmentRef {
    EnvironmentRef {
        environment_id: id.to_string(),
        scope: WatchScope::Workspace,
        url: ENV_URL.to_string(),
        username: None,
    }
}

pub fn job_url(name: &str) -> String {
    format!("{}/job/{}/", ENV_URL, name)
}

pub fn watched(environment_id: &str, name: &str) -> WatchedJobEntry {
    WatchedJobEntry::new(WatchScope::Workspace, environment_id, &job_url(name), name)
}

pub fn live_job(name: &str, color: &str, completed: Option<u64>) -> LiveJob {
    LiveJob {
        name: name.to_string(),
        color: Some(color.to_string()),
        last_build: completed.map(|number| finished_build(name, number)),
        last_completed_build: completed.map(|number| finished_build(name, number)),
    }
}

pub fn running_job(name: &str, color: &str, running: u64, completed: Option<u64>) -> LiveJob {
    LiveJob {
        name: name.to_string(),
        color: Some(color.to_string()),
        last_build: Some(BuildRef {
            number: running,
            url: build_url(name, running),
            building: Some(true),
            result: None,
        }),
        last_completed_build: completed.map(|number| finished_build(name, number)),
    }
}

pub fn build_url(name: &str, number: u64) -> String {
    format!("{}{}/", job_url(name), number)
}

fn finished_build(name: &str, number: u64) -> BuildRef {
    BuildRef {
        number,
        url: build_url(name, number),
        building: Some(false),
        result: Some("SUCCESS".to_string()),
    }
}

#[derive(Default)]
pub struct FakeEnvironments {
    environments: Mutex<Vec<EnvironmentRef>>,
}

impl FakeEnvironments {
    pub fn with(environments: Vec<EnvironmentRef>) -> Arc<FakeEnvironments> {
        Arc::new(FakeEnvironments {
            environments: Mutex::new(environments),
        })
    }

    pub fn remove(&self, environment_id: &str) {
        self.environments.lock().retain(|env| env.environment_id != environment_id);
    }
}

#[async_trait]
impl EnvironmentDirectory for FakeEnvironments {
    async fn list_environments(&self) -> Result<Vec<EnvironmentRef>, Error> {
        Ok(self.environments.lock().clone())
    }
}

#[derive(Default)]
pub struct FakeWatchStore {
    entries: Mutex<Vec<WatchedJobEntry>>,
    updates: Mutex<Vec<(String, WatchStatusUpdate)>>,
    environment_removals: Mutex<Vec<(WatchScope, String)>>,
}

impl FakeWatchStore {
    pub fn with(entries: Vec<WatchedJobEntry>) -> Arc<FakeWatchStore> {
        Arc::new(FakeWatchStore {
            entries: Mutex::new(entries),
            ..FakeWatchStore::default()
        })
    }

    pub fn entries(&self) -> Vec<WatchedJobEntry> {
        self.entries.lock().clone()
    }

    pub fn entry(&self, job_url: &str) -> Option<WatchedJobEntry> {
        self.entries.lock().iter().find(|e| e.job_url == job_url).cloned()
    }

    pub fn updates(&self) -> Vec<(String, WatchStatusUpdate)> {
        self.updates.lock().clone()
    }

    pub fn environment_removals(&self) -> Vec<(WatchScope, String)> {
        self.environment_removals.lock().clone()
    }
}

#[async_trait]
impl WatchStore for FakeWatchStore {
    async fn list_watched_jobs(&self) -> Result<Vec<WatchedJobEntry>, Error> {
        Ok(self.entries.lock().clone())
    }

    async fn update_watch_status(
        &self,
        scope: WatchScope,
        environment_id: &str,
        job_url: &str,
        update: WatchStatusUpdate,
    ) -> Result<(), Error> {
        let mut entries = self.entries.lock();
        let entry = entries
            .iter_mut()
            .find(|e| e.scope == scope && e.environment_id == environment_id && e.job_url == job_url)
            .ok_or_else(|| format_err!("no watch for {}", job_url))?;
        update.apply_to(entry);
        self.updates.lock().push((job_url.to_string(), update));
        Ok(())
    }

    async fn remove_watch(&self, scope: WatchScope, environment_id: &str, job_url: &str) -> Result<bool, Error> {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|e| !(e.scope == scope && e.environment_id == environment_id && e.job_url == job_url));
        Ok(entries.len() != before)
    }

    async fn remove_watches_for_environment(&self, scope: WatchScope, environment_id: &str) -> Result<(), Error> {
        self.entries
            .lock()
            .retain(|e| !(e.scope == scope && e.environment_id == environment_id));
        self.environment_removals.lock().push((scope, environment_id.to_string()));
        Ok(())
    }
}

/// Scripted job responses: queued errors are consumed first, then the
/// standing reply repeats. Jobs with neither answer NotFound.
#[derive(Default)]
pub struct FakeJobs {
    queued_errors: Mutex<HashMap<String, VecDeque<String>>>,
    standing: Mutex<HashMap<String, LiveJob>>,
    calls: AtomicUsize,
}

impl FakeJobs {
    pub fn new() -> Arc<FakeJobs> {
        Arc::new(FakeJobs::default())
    }

    pub fn set(&self, job_url: &str, job: LiveJob) {
        self.standing.lock().insert(job_url.to_string(), job);
    }

    /// Drops the standing reply, so the job reads as deleted.
    pub fn forget(&self, job_url: &str) {
        self.standing.lock().remove(job_url);
    }

    pub fn push_error(&self, job_url: &str, message: &str) {
        self.queued_errors
            .lock()
            .entry(job_url.to_string())
            .or_default()
            .push_back(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobDataSource for FakeJobs {
    async fn get_job(&self, _environment: &EnvironmentRef, job_url: &str) -> Result<LiveJob, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let queued = self.queued_errors.lock().get_mut(job_url).and_then(|errors| errors.pop_front());
        match queued {
            Some(message) => Err(RequestError::Transport {
                url: job_url.to_string(),
                message,
            }
            .into()),
            None => self.standing.lock().get(job_url).cloned().ok_or_else(|| {
                RequestError::NotFound {
                    url: job_url.to_string(),
                }
                .into()
            }),
        }
    }
}

#[derive(Default)]
pub struct FakePendingInputs {
    summaries: Mutex<HashMap<String, PendingInputSummary>>,
    queries: Mutex<Vec<(String, PendingInputQuery)>>,
}

impl FakePendingInputs {
    pub fn new() -> Arc<FakePendingInputs> {
        Arc::new(FakePendingInputs::default())
    }

    pub fn set(&self, build_url: &str, summary: PendingInputSummary) {
        self.summaries.lock().insert(build_url.to_string(), summary);
    }

    pub fn queries(&self) -> Vec<(String, PendingInputQuery)> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl PendingInputProvider for FakePendingInputs {
    async fn get_summary(
        &self,
        _environment: &EnvironmentRef,
        build_url: &str,
        query: PendingInputQuery,
    ) -> Result<PendingInputSummary, Error> {
        self.queries.lock().push((build_url.to_string(), query));
        Ok(self.summaries.lock().get(build_url).cloned().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Failure(String),
    Recovery(String),
    WatchError(String),
    Completion(CompletionNotice),
    PendingInput(PendingInputNotice),
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<RecordingNotifier> {
        Arc::new(RecordingNotifier::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    pub fn watch_errors(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|notice| match notice {
                Notice::WatchError(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_failure(&self, message: &str) {
        self.notices.lock().push(Notice::Failure(message.to_string()));
    }

    fn notify_recovery(&self, message: &str) {
        self.notices.lock().push(Notice::Recovery(message.to_string()));
    }

    fn notify_watch_error(&self, message: &str) {
        self.notices.lock().push(Notice::WatchError(message.to_string()));
    }

    fn notify_completion(&self, notice: &CompletionNotice) {
        self.notices.lock().push(Notice::Completion(notice.clone()));
    }

    fn notify_pending_input(&self, notice: &PendingInputNotice) {
        self.notices.lock().push(Notice::PendingInput(notice.clone()));
    }
}

#[derive(Default)]
pub struct CountingHost {
    refreshes: AtomicUsize,
}

impl CountingHost {
    pub fn new() -> Arc<CountingHost> {
        Arc::new(CountingHost::default())
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

impl WatchHost for CountingHost {
    fn refresh_tree(&self) {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records queue refreshes; environments listed in `failing` return an error.
#[derive(Default)]
pub struct RecordingQueueHost {
    refreshed: Mutex<Vec<String>>,
    failing: Mutex<Vec<String>>,
}

impl RecordingQueueHost {
    pub fn new() -> Arc<RecordingQueueHost> {
        Arc::new(RecordingQueueHost::default())
    }

    pub fn fail_for(&self, environment_id: &str) {
        self.failing.lock().push(environment_id.to_string());
    }

    pub fn refreshed(&self) -> Vec<String> {
        self.refreshed.lock().clone()
    }
}

#[async_trait]
impl QueueHost for RecordingQueueHost {
    async fn refresh_queue_view(&self, environment: &EnvironmentRef) -> Result<(), Error> {
        self.refreshed.lock().push(environment.environment_id.clone());
        if self.failing.lock().contains(&environment.environment_id) {
            return Err(format_err!("queue request for {} failed", environment.environment_id));
        }
        Ok(())
    }
}
