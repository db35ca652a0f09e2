use crate::errors::ConfigError;
use failure::Error;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const MIN_POLL_INTERVAL_SECONDS: u64 = 5;
pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 60;
pub const DEFAULT_QUEUE_POLL_INTERVAL_SECONDS: u64 = 10;
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 3;

/// Poller settings, read from the top level of a TOML file.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct WatchConfig {
    pub poll_interval_seconds: u64,
    pub max_consecutive_errors: u32,
    pub queue_poll_interval_seconds: u64,
}

impl Default for WatchConfig {
    fn default() -> WatchConfig {
        WatchConfig {
            poll_interval_seconds: DEFAULT_POLL_INTERVAL_SECONDS,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            queue_poll_interval_seconds: DEFAULT_QUEUE_POLL_INTERVAL_SECONDS,
        }
    }
}

impl WatchConfig {
    pub fn from_toml_str(contents: &str) -> Result<WatchConfig, Error> {
        parse(contents, "<inline>")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<WatchConfig, Error> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = parse(&contents, &path.display().to_string())?;
        info!(
            "--Config--: Loaded {}: poll every {}s, queue every {}s, {} errors before notifying.",
            path.display(),
            config.poll_interval_seconds,
            config.queue_poll_interval_seconds,
            config.max_consecutive_errors
        );
        Ok(config)
    }

    pub fn status_poll_interval(&self) -> Duration {
        poll_interval(self.poll_interval_seconds)
    }

    pub fn queue_poll_interval(&self) -> Duration {
        poll_interval(self.queue_poll_interval_seconds)
    }

    pub fn max_consecutive_errors(&self) -> u32 {
        clamp_max_consecutive_errors(self.max_consecutive_errors)
    }
}

fn parse(contents: &str, path_label: &str) -> Result<WatchConfig, Error> {
    let config = toml::from_str::<WatchConfig>(contents).map_err(|e| ConfigError::Parse {
        path: path_label.to_string(),
        message: e.to_string(),
    })?;
    Ok(config)
}

pub fn clamp_poll_interval_seconds(seconds: u64) -> u64 {
    seconds.max(MIN_POLL_INTERVAL_SECONDS)
}

pub fn poll_interval(seconds: u64) -> Duration {
    Duration::from_secs(clamp_poll_interval_seconds(seconds))
}

pub fn clamp_max_consecutive_errors(count: u32) -> u32 {
    count.max(1)
}
