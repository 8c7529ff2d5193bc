// Local crates
use crate::error::LogAnalyticsError;
use crate::helpers::load_config::LoggingConfig;

// External crates
use anyhow::{Context, Result};
use std::panic;
use tracing::error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_error::ErrorLayer;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*, registry::Registry};

const DEBUG_FILTER: &str = "debug,hyper=info,hyper_util=info,h2=info,reqwest=info,rustls=info";
const LOG_FILE_PREFIX: &str = "log-analytics.log";

/// Keeps the non-blocking writers flushing until the tool exits.
#[derive(Debug)]
#[must_use = "dropping the guard stops log output"]
pub struct TracingGuard {
    _guards: Vec<WorkerGuard>,
}

/// Install the global subscriber.
///
/// Logs go to stderr so stdout carries only query output. `RUST_LOG` overrides
/// both `--debug` and the configured level.
pub fn init_tracing(debug: bool, config: &LoggingConfig) -> Result<TracingGuard> {
    let mut guards = Vec::new();

    let default_directive = if debug { DEBUG_FILTER } else { config.level.as_str() };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .with_context(|| format!("invalid log filter {default_directive:?}"))?;

    let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(std::io::stderr());
    guards.push(stderr_guard);

    let fmt_layer = (!config.json).then(|| {
        fmt::layer()
            .with_writer(stderr_writer.clone())
            .with_target(false)
            .with_file(debug)
            .with_line_number(debug)
            .with_timer(fmt::time::UtcTime::rfc_3339())
    });

    let json_layer = config.json.then(|| {
        fmt::layer()
            .json()
            .with_writer(stderr_writer.clone())
            .with_target(true)
            .with_timer(fmt::time::UtcTime::rfc_3339())
    });

    let file_layer = match &config.directory {
        Some(dir) => {
            let file_appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_FILE_PREFIX)
                .build(dir)
                .map_err(|e| {
                    LogAnalyticsError::config(format!(
                        "failed to open log directory {}: {e}",
                        dir.display()
                    ))
                })?;
            let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
            guards.push(file_guard);
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(file_writer)
                    .with_file(true)
                    .with_line_number(true)
                    .with_thread_ids(true)
                    .with_timer(fmt::time::UtcTime::rfc_3339()),
            )
        }
        None => None,
    };

    let subscriber = Registry::default()
        .with(filter)
        .with(fmt_layer)
        .with(json_layer)
        .with(file_layer)
        .with(ErrorLayer::default());

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set global tracing subscriber")?;

    Ok(TracingGuard { _guards: guards })
}

/// Route panics through `tracing` so they reach the log file too.
pub fn init_panic_handler() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let msg = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("Unknown panic");

        let location = panic_info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_else(|| "unknown location".to_string());

        error!(
            message = %msg,
            location = %location,
            "Application panicked!"
        );
        default_hook(panic_info);
    }));
}
