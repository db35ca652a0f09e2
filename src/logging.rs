use failure::{format_err, Error};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

const CONSOLE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} - {m}{n}";

/// Load the log4rs configuration the host ships (see `log4rs.yml`).
pub fn init_from_file<P: AsRef<Path>>(path: P) -> Result<(), Error> {
    log4rs::init_file(path.as_ref(), Default::default())
        .map_err(|e| format_err!("Unable to load log config {}: {}", path.as_ref().display(), e))?;
    info!("--Logging--: Initialized from {}", path.as_ref().display());
    Ok(())
}

/// Console-only logging for hosts without a log4rs file.
pub fn init_console(level: LevelFilter) -> Result<(), Error> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}
