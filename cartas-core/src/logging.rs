//! Structured logging setup using the `tracing` ecosystem.
//!
//! Console output always goes to stderr so streamed message previews on
//! stdout stay clean. File output rotates daily and can be JSON.

use std::path::Path;

use tracing_appender::rolling;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::AppConfig;
use crate::error::CtResult;

const LOG_FILE_PREFIX: &str = "cartas.log";

/// Initialize the global tracing subscriber.
///
/// # Arguments
/// * `level` - Filter directive: "trace", "debug", "info", "warn", "error"
///   or a full `EnvFilter` expression such as `cartas_api=debug,info`
/// * `log_dir` - Directory for rotated log files
/// * `json_output` - Use JSON lines for the file output
pub fn init_logging(level: &str, log_dir: &Path, json_output: bool) -> CtResult<LogGuard> {
    std::fs::create_dir_all(log_dir)?;

    let (non_blocking, guard) =
        tracing_appender::non_blocking(rolling::daily(log_dir, LOG_FILE_PREFIX));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    let file_layer = if json_output {
        fmt::layer()
            .with_writer(non_blocking)
            .json()
            .with_file(true)
            .with_line_number(true)
            .boxed()
    } else {
        fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter_for(level))
        .with(console_layer)
        .with(file_layer)
        .init();

    tracing::info!("logging initialized at level={level}, dir={}", log_dir.display());

    Ok(LogGuard { _guard: guard })
}

/// Initialize logging from the `[logging]` section of the configuration.
///
/// `verbose` forces debug level regardless of the configured level.
pub fn init_from_config(config: &AppConfig, verbose: bool) -> CtResult<LogGuard> {
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let dir = config.effective_log_dir()?;
    init_logging(level, &dir, config.logging.json_output)
}

/// Guard that keeps the non-blocking log writer alive.
/// Drop this to flush and close the log file.
pub struct LogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Initialize a minimal stderr-only logger for tests or scripts.
pub fn init_console_logging(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(filter_for(level))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

fn filter_for(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_logging_does_not_panic() {
        // Subsequent calls are no-ops.
        init_console_logging("debug");
        init_console_logging("info");
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let filter = filter_for("not a [valid filter");
        assert_eq!(filter.to_string(), "info");
    }
}
