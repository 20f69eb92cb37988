//! Tracing subscriber setup.
//!
//! Logs go to stderr as colored text, or as JSON lines when
//! `LOG_FORMAT=json`. An optional log file receives the same events
//! without ANSI codes. `RUST_LOG` overrides the configured level.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

use crate::config::LoggingLevel;
use crate::error::{WorkerError, WorkerResult};

/// Whether `LOG_FORMAT` asks for JSON output.
fn json_requested() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Install the global subscriber.
///
/// The returned guard flushes the log file when dropped and must be held
/// until the program exits.
pub fn init_logging(level: LoggingLevel, log_file: Option<&Path>) -> WorkerResult<Option<WorkerGuard>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.level_filter().into())
        .from_env_lossy();

    let stderr_layer = if json_requested() {
        fmt::layer().json().with_writer(std::io::stderr).boxed()
    } else {
        fmt::layer()
            .with_ansi(true)
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = tracing_appender::non_blocking(file_appender(path)?);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(env_filter)
        .try_init()
        .map_err(|e| WorkerError::logging(e.to_string()))?;

    Ok(guard)
}

/// Appender writing to exactly `path`, never rotated.
fn file_appender(path: &Path) -> WorkerResult<RollingFileAppender> {
    let file_name = path
        .file_name()
        .ok_or_else(|| WorkerError::logging(format!("invalid log file {}", path.display())))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name.to_string_lossy())
        .build(dir)
        .map_err(|e| WorkerError::logging(format!("cannot open {}: {}", path.display(), e)))
}
