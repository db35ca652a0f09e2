use crate::integrations::jenkins_response::BuildRef;
use crate::integrations::remote_integration::CompletionNotice;
use crate::job_status::{BallColor, JobStatus};
use crate::watch::{WatchStatusUpdate, WatchedJobEntry};

#[derive(Debug, Clone, PartialEq)]
pub enum StatusNotification {
    Failure { message: String },
    Recovery { message: String },
    Completion(CompletionNotice),
}

/// What one poll of a watched job changed, and what of it is worth keeping.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusEvaluation {
    pub next_status: JobStatus,
    pub is_building: Option<bool>,
    pub completed_build_number: Option<u64>,
    pub should_update_status: bool,
    pub should_update_completion: bool,
    pub should_update_building: bool,
    /// A real transition happened (not a first observation).
    pub should_refresh: bool,
    pub notification: Option<StatusNotification>,
}

impl JobStatusEvaluation {
    /// The observation fields to persist. Does not include the job name.
    pub fn status_update(&self) -> WatchStatusUpdate {
        WatchStatusUpdate {
            job_name: None,
            last_status: if self.should_update_status {
                Some(self.next_status)
            } else {
                None
            },
            last_completed_build_number: if self.should_update_completion {
                self.completed_build_number
            } else {
                None
            },
            last_is_building: if self.should_update_building {
                self.is_building
            } else {
                None
            },
        }
    }
}

pub fn job_label<'a>(entry: &'a WatchedJobEntry, live_job_name: &'a str) -> &'a str {
    if live_job_name.trim().is_empty() {
        entry.job_name.as_str()
    } else {
        live_job_name
    }
}

pub fn evaluate(
    entry: &WatchedJobEntry,
    live_job_name: &str,
    live_color: Option<&str>,
    live_last_completed_build: Option<&BuildRef>,
    environment_url: &str,
) -> JobStatusEvaluation {
    let color = BallColor::decode(live_color);
    let next_status = color.status;
    let completed_build_number = live_last_completed_build.map(|build| build.number);
    let label = job_label(entry, live_job_name);

    let previous_status = entry.last_status;
    let has_history = entry.has_completion_history();

    let status_changed = next_status != JobStatus::Unknown && previous_status != Some(next_status);
    let completion_changed =
        completed_build_number.is_some() && completed_build_number != entry.last_completed_build_number;
    let building_changed = color.is_building.is_some() && color.is_building != entry.last_is_building;

    let previous_known = match previous_status {
        Some(JobStatus::Unknown) | None => false,
        Some(_) => true,
    };

    let notification = if previous_known
        && previous_status != Some(JobStatus::Failure)
        && next_status == JobStatus::Failure
    {
        Some(StatusNotification::Failure {
            message: format!("Jenkins job {} failed on {}.", label, environment_url),
        })
    } else if previous_status == Some(JobStatus::Failure) && next_status == JobStatus::Success {
        Some(StatusNotification::Recovery {
            message: format!("Jenkins job {} is back to normal on {}.", label, environment_url),
        })
    } else if completion_changed && has_history {
        Some(StatusNotification::Completion(CompletionNotice {
            job_label: label.to_string(),
            environment_url: environment_url.to_string(),
            result: live_last_completed_build.and_then(|build| build.result.clone()),
            color: live_color.map(|c| c.to_string()),
        }))
    } else {
        None
    };

    let should_refresh = (status_changed && previous_status.is_some())
        || (completion_changed && has_history)
        || (building_changed && entry.last_is_building.is_some());

    JobStatusEvaluation {
        next_status,
        is_building: color.is_building,
        completed_build_number,
        should_update_status: status_changed,
        should_update_completion: completion_changed,
        should_update_building: building_changed,
        should_refresh,
        notification,
    }
}
