use failure::{Error, Fail};

/// Errors a job data source reports when Jenkins can't hand back a job.
#[derive(Debug, Fail)]
pub enum RequestError {
    #[fail(display = "Jenkins has no job at {}", url)]
    NotFound { url: String },

    #[fail(display = "HTTP call to {} failed with code: {}", url, code)]
    HttpStatus { url: String, code: u16 },

    #[fail(display = "Unable to reach {}: {}", url, message)]
    Transport { url: String, message: String },
}

#[derive(Debug, Fail)]
pub enum ConfigError {
    #[fail(display = "Unable to read config file {}: {}", path, message)]
    Read { path: String, message: String },

    #[fail(display = "Unable to parse config file {}: {}", path, message)]
    Parse { path: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailure {
    /// The job is gone upstream; the watch should be dropped.
    NotFound,
    Transient,
}

pub fn classify_fetch_error(err: &Error) -> FetchFailure {
    match err.downcast_ref::<RequestError>() {
        Some(RequestError::NotFound { .. }) => FetchFailure::NotFound,
        Some(RequestError::HttpStatus { code: 404, .. }) => FetchFailure::NotFound,
        _ => FetchFailure::Transient,
    }
}
