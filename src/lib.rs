#[macro_use]
extern crate serde_derive;

#[macro_use]
extern crate log;

extern crate async_trait;
extern crate failure;
extern crate log4rs;
extern crate parking_lot;
extern crate serde;
extern crate tokio;
extern crate toml;

pub mod config_file;
pub mod errors;
pub mod evaluator;
pub mod integrations;
pub mod job_status;
pub mod logging;
pub mod queue_poller;
pub mod status_poller;
pub mod timer;
pub mod watch;

#[cfg(test)]
mod test_support;

pub use config_file::WatchConfig;
pub use errors::{classify_fetch_error, ConfigError, FetchFailure, RequestError};
pub use evaluator::{evaluate, JobStatusEvaluation, StatusNotification};
pub use integrations::jenkins_response::{BuildRef, LiveJob};
pub use integrations::log_notifier::LogNotifier;
pub use integrations::remote_integration::*;
pub use job_status::{BallColor, JobStatus};
pub use queue_poller::QueuePoller;
pub use status_poller::StatusPoller;
pub use watch::*;
