use crate::job_status::JobStatus;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum WatchScope {
    Workspace,
    Global,
}

impl fmt::Display for WatchScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            WatchScope::Workspace => f.write_str("workspace"),
            WatchScope::Global => f.write_str("global"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Job,
    Pipeline,
}

/// A job the user asked to monitor. Owned by the watch store.
///
/// The three `last_*` fields hold the last *persisted* observation, not the
/// last polled one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchedJobEntry {
    pub scope: WatchScope,
    pub environment_id: String,
    pub job_url: String,
    pub job_name: String,
    pub job_kind: JobKind,
    #[serde(default)]
    pub last_status: Option<JobStatus>,
    #[serde(default)]
    pub last_completed_build_number: Option<u64>,
    #[serde(default)]
    pub last_is_building: Option<bool>,
}

impl WatchedJobEntry {
    pub fn new(scope: WatchScope, environment_id: &str, job_url: &str, job_name: &str) -> WatchedJobEntry {
        WatchedJobEntry {
            scope,
            environment_id: environment_id.to_string(),
            job_url: job_url.to_string(),
            job_name: job_name.to_string(),
            job_kind: JobKind::Job,
            last_status: None,
            last_completed_build_number: None,
            last_is_building: None,
        }
    }

    pub fn key(&self) -> JobKey {
        JobKey {
            scope: self.scope,
            environment_id: self.environment_id.clone(),
            job_url: self.job_url.clone(),
        }
    }

    pub fn environment_key(&self) -> EnvironmentKey {
        EnvironmentKey::new(self.scope, &self.environment_id)
    }

    /// Whether any completed build has been recorded for this watch yet.
    pub fn has_completion_history(&self) -> bool {
        self.last_completed_build_number.is_some() || self.last_is_building.is_some()
    }
}

/// Connection details for one Jenkins server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRef {
    pub environment_id: String,
    pub scope: WatchScope,
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl EnvironmentRef {
    pub fn key(&self) -> EnvironmentKey {
        EnvironmentKey::new(self.scope, &self.environment_id)
    }
}

/// Fields the poller writes back to the store. `None` means "leave as is".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchStatusUpdate {
    pub job_name: Option<String>,
    pub last_status: Option<JobStatus>,
    pub last_completed_build_number: Option<u64>,
    pub last_is_building: Option<bool>,
}

impl WatchStatusUpdate {
    pub fn is_empty(&self) -> bool {
        self.job_name.is_none()
            && self.last_status.is_none()
            && self.last_completed_build_number.is_none()
            && self.last_is_building.is_none()
    }

    pub fn apply_to(&self, entry: &mut WatchedJobEntry) {
        if let Some(ref name) = self.job_name {
            entry.job_name = name.clone();
        }
        if let Some(status) = self.last_status {
            entry.last_status = Some(status);
        }
        if let Some(number) = self.last_completed_build_number {
            entry.last_completed_build_number = Some(number);
        }
        if let Some(building) = self.last_is_building {
            entry.last_is_building = Some(building);
        }
    }
}

/// `scope:environmentId`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnvironmentKey {
    pub scope: WatchScope,
    pub environment_id: String,
}

impl EnvironmentKey {
    pub fn new(scope: WatchScope, environment_id: &str) -> EnvironmentKey {
        EnvironmentKey {
            scope,
            environment_id: environment_id.to_string(),
        }
    }
}

impl fmt::Display for EnvironmentKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.environment_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobKey {
    pub scope: WatchScope,
    pub environment_id: String,
    pub job_url: String,
}

impl JobKey {
    pub fn belongs_to(&self, environment: &EnvironmentKey) -> bool {
        self.scope == environment.scope && self.environment_id == environment.environment_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildKey {
    pub job: JobKey,
    pub build_url: String,
}
