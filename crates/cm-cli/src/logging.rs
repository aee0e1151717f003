//! Logging initialization

use anyhow::{Context, Result};
use cm_core::config::LoggingConfig;
use std::io;
use std::path::PathBuf;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::args::{Args, LogFormat};

/// Initialize logging from CLI arguments and the `[logging]` config section
///
/// Flags win over the config file: `-q`/`-v` over `level`, `--log-file`
/// over `file`, `--log-format` over `json_format`. Logs go to stderr so that
/// command output on stdout stays parseable. Returns the file writer guard
/// when a log file is in use.
pub fn init(args: &Args, config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    // Determine log level
    let level = if args.quiet {
        Level::ERROR
    } else {
        match args.verbose {
            0 => config.level.parse().unwrap_or(Level::INFO),
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let format = args.log_format.unwrap_or(if config.json_format {
        LogFormat::Json
    } else {
        LogFormat::Text
    });

    // Build env filter
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let log_file = args
        .log_file
        .clone()
        .or_else(|| config.file.as_ref().map(PathBuf::from));

    let (file_writer, guard) = match log_file {
        Some(ref log_file) => {
            let file = std::fs::File::create(log_file)
                .with_context(|| format!("Failed to create log file: {}", log_file.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    // Set up subscriber based on format
    match format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(io::stderr)
                        .with_target(args.verbose >= 2)
                        .with_thread_ids(args.verbose >= 3)
                        .with_file(args.verbose >= 3)
                        .with_line_number(args.verbose >= 3),
                )
                .with(file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer)))
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(io::stderr))
                .with(file_writer.map(|writer| fmt::layer().json().with_writer(writer)))
                .init();
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(io::stderr))
                .with(file_writer.map(|writer| fmt::layer().with_ansi(false).with_writer(writer)))
                .init();
        }
    }

    Ok(guard)
}
