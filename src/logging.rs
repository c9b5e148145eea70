use crate::common::error::{Result, ScraperError};
use crate::config::LoggingConfig;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console output for people, a daily rotated JSON file for later digging.
///
/// `RUST_LOG` wins over the configured filter. The returned guard flushes the
/// file writer when dropped, so hold it until the process ends.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.directory)?;

    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(file_writer);
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => configured_filter(config)?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| ScraperError::Config(format!("Failed to install logger: {}", e)))?;

    Ok(guard)
}

fn configured_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(&config.filter).map_err(|e| {
        ScraperError::Config(format!("Invalid log filter '{}': {}", config.filter, e))
    })
}
