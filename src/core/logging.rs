//! Structured logging
//!
//! Sets up the global tracing subscriber: JSON or human-readable text, written
//! to stdout or to a daily-rotated file through a non-blocking writer.

use crate::core::config::{LogFormat, LogOutput, LoggingConfig};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Keeps the background log writer alive; drop it only on shutdown
pub struct Logger {
    _guard: WorkerGuard,
}

impl Logger {
    /// Install the global subscriber described by `config`
    ///
    /// `RUST_LOG`, when set, takes precedence over the configured level.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let level = parse_log_level(&config.level)?;
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.as_str()));

        let (writer, guard) = match config.output {
            LogOutput::Stdout => tracing_appender::non_blocking(std::io::stdout()),
            LogOutput::File => {
                let log_file = config
                    .log_file
                    .as_deref()
                    .context("log_file must be specified when output is 'file'")?;
                file_writer(log_file)?
            }
        };

        let fmt_layer = match config.format {
            LogFormat::Json => fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(true)
                .with_target(true)
                .boxed(),
            LogFormat::Text => fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(config.output == LogOutput::Stdout)
                .boxed(),
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("Failed to initialize tracing subscriber")?;

        tracing::info!(
            level = %config.level,
            format = ?config.format,
            output = ?config.output,
            "Logging system initialized"
        );

        Ok(Logger { _guard: guard })
    }
}

/// Daily-rolling appender in the log file's directory, named after the file
fn file_writer(log_file: &Path) -> Result<(NonBlocking, WorkerGuard)> {
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(directory).context("Failed to create log directory")?;

    let filename = log_file
        .file_name()
        .context("Log file must have a filename")?;

    let appender = tracing_appender::rolling::daily(directory, filename);
    Ok(tracing_appender::non_blocking(appender))
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("Invalid log level: {}", level),
    }
}
