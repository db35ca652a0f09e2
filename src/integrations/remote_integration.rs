use crate::integrations::jenkins_response::LiveJob;
use crate::watch::{EnvironmentRef, WatchScope, WatchStatusUpdate, WatchedJobEntry};
use async_trait::async_trait;
use failure::Error;
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait EnvironmentDirectory: Send + Sync {
    async fn list_environments(&self) -> Result<Vec<EnvironmentRef>, Error>;
}

#[async_trait]
pub trait WatchStore: Send + Sync {
    async fn list_watched_jobs(&self) -> Result<Vec<WatchedJobEntry>, Error>;

    async fn update_watch_status(
        &self,
        scope: WatchScope,
        environment_id: &str,
        job_url: &str,
        update: WatchStatusUpdate,
    ) -> Result<(), Error>;

    /// Returns false when there was nothing to remove.
    async fn remove_watch(&self, scope: WatchScope, environment_id: &str, job_url: &str) -> Result<bool, Error>;

    async fn remove_watches_for_environment(&self, scope: WatchScope, environment_id: &str) -> Result<(), Error>;
}

/// Fetches live job state. Deleted jobs must surface as
/// `RequestError::NotFound` (or an HTTP 404) so the watch gets dropped.
#[async_trait]
pub trait JobDataSource: Send + Sync {
    async fn get_job(&self, environment: &EnvironmentRef, job_url: &str) -> Result<LiveJob, Error>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingInputQuery {
    /// How old a cached summary the provider may hand back.
    pub max_age: Duration,
    /// Whether the provider should raise its own notification.
    pub notify: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingInputSummary {
    pub awaiting_input: bool,
    pub signature: Option<String>,
    pub count: usize,
    pub message: Option<String>,
}

#[async_trait]
pub trait PendingInputProvider: Send + Sync {
    async fn get_summary(
        &self,
        environment: &EnvironmentRef,
        build_url: &str,
        query: PendingInputQuery,
    ) -> Result<PendingInputSummary, Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionNotice {
    pub job_label: String,
    pub environment_url: String,
    pub result: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingInputNotice {
    pub job_label: String,
    pub environment_url: String,
    pub build_url: String,
    pub input_count: usize,
    pub input_message: Option<String>,
}

pub trait Notifier: Send + Sync {
    fn notify_failure(&self, message: &str);
    fn notify_recovery(&self, message: &str);
    fn notify_watch_error(&self, message: &str);
    fn notify_completion(&self, notice: &CompletionNotice);
    fn notify_pending_input(&self, notice: &PendingInputNotice);
}

/// Host side of the status poller: repaint whatever shows watched jobs.
pub trait WatchHost: Send + Sync {
    fn refresh_tree(&self);
}

/// Host side of the queue poller.
#[async_trait]
pub trait QueueHost: Send + Sync {
    async fn refresh_queue_view(&self, environment: &EnvironmentRef) -> Result<(), Error>;
}

/// Everything the status poller reads from or writes to.
#[derive(Clone)]
pub struct WatchServices {
    pub environments: Arc<dyn EnvironmentDirectory>,
    pub store: Arc<dyn WatchStore>,
    pub jobs: Arc<dyn JobDataSource>,
    pub pending_inputs: Arc<dyn PendingInputProvider>,
    pub notifier: Arc<dyn Notifier>,
}
