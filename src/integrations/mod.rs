pub mod jenkins_response;
pub mod log_notifier;
pub mod remote_integration;
