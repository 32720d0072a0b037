//! Logging initialization and configuration.
//!
//! Logs go to stderr so they never mix with the JSON printed on stdout:
//! - **Console**: pretty, compact or JSON lines, chosen by configuration
//! - **File**: optional daily rolling JSON files in the configured directory

use std::path::Path;

use mockshape_core::{LogFormat, LoggingConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Keeps the non-blocking writers alive. Buffered lines are flushed when
/// this is dropped, so hold it until the end of `main`.
#[must_use = "dropping the guard stops log output"]
pub struct LogGuard {
    _stderr: WorkerGuard,
    _file: Option<WorkerGuard>,
}

/// Environment variable consulted when `RUST_LOG` is unset.
pub const LOG_LEVEL_ENV: &str = "MOCKSHAPE_LOG_LEVEL";

/// Initialize the logging system.
///
/// The filter comes from `RUST_LOG`, then [`LOG_LEVEL_ENV`], then
/// `config.level`. `format` selects the console layout.
///
/// # Errors
///
/// Returns an error if the filter cannot be parsed, the log directory cannot
/// be created, or a global subscriber is already installed.
pub fn init(config: &LoggingConfig, format: LogFormat) -> anyhow::Result<LogGuard> {
    let level = std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| config.level.clone());
    let env_filter = env_filter(&level)?;

    let (non_blocking_stderr, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());

    let console_layer = match format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(non_blocking_stderr)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(non_blocking_stderr)
            .with_target(true)
            .with_ansi(false)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking_stderr)
            .with_target(true)
            .boxed(),
    };

    let mut file_guard = None;
    let file_layer = match &config.directory {
        Some(dir) => {
            prepare_directory(dir)?;
            // Rolling file appender - creates new file daily
            let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "mockshape");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
            file_guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking_file)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    Ok(LogGuard {
        _stderr: stderr_guard,
        _file: file_guard,
    })
}

/// Builds the filter, preferring `RUST_LOG` over `fallback`.
fn env_filter(fallback: &str) -> anyhow::Result<EnvFilter> {
    Ok(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?)
}

/// Ensures the log directory exists.
fn prepare_directory(dir: &Path) -> anyhow::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_accepts_levels() {
        for level in ["trace", "debug", "info", "warn", "error", "mockshape_core=debug"] {
            assert!(env_filter(level).is_ok(), "level {level} should parse");
        }
    }

    #[test]
    fn test_prepare_directory_creates_nested_dirs() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("logs").join("mockshape");

        prepare_directory(&nested).unwrap();
        assert!(nested.is_dir());
        // Idempotent on an existing directory.
        prepare_directory(&nested).unwrap();
    }
}
