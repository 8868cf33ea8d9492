//! Tracing setup for the difftrim binary.
//!
//! Stdout carries the fitted diff, so log output goes to stderr, or to a
//! daily-rolling file under `[log] dir` when configured.

use crate::config::{expand_path, LogConfig};
use crate::error::{ConfigError, ConfigResult};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;

const LOG_FILE_PREFIX: &str = "difftrim.log";

/// Parse a level name (`off`, `error`, `warn`, `info`, `debug`, `trace`).
pub fn parse_level(level: &str) -> ConfigResult<LevelFilter> {
    level
        .trim()
        .to_ascii_lowercase()
        .parse::<LevelFilter>()
        .map_err(|_| ConfigError::LogLevel(level.to_string()))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the program; it is `None` when logging to stderr.
pub fn init(config: &LogConfig) -> ConfigResult<Option<WorkerGuard>> {
    let level = parse_level(&config.level)?;

    match config.dir.as_deref() {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(expand_path(dir), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_ansi(false)
                .with_writer(writer)
                .try_init()
                .map_err(|_| ConfigError::LogInit)?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_max_level(level)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|_| ConfigError::LogInit)?;
            Ok(None)
        }
    }
}
