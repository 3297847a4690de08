//! File logging for the explorer.
//!
//! The terminal belongs to the TUI, so events only go to `<log_dir>/<log_file>`,
//! which is truncated at startup. Filtering follows `RUST_LOG` (default `info`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "quiz-map.log";

/// Flushes and closes the log writer when dropped
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Create the log directory and empty the log file
fn prepare_log_file(log_dir: &Path, log_file: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let path = log_dir.join(log_file);
    fs::write(&path, "")?;
    Ok(path)
}

/// Install the global subscriber. Keep the returned guard alive for the whole run.
///
/// # Errors
///
/// Fails if the log file cannot be prepared or a subscriber is already installed.
pub fn init_logging(log_dir: &Path, log_file: &str) -> io::Result<LoggingGuard> {
    prepare_log_file(log_dir, log_file)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}
