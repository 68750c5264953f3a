//! Structured logging and tracing for Pumpcontrol
//!
//! Installs one process-wide `tracing` subscriber (console and optional rolling
//! file) and hands out per-component [`StructuredLogger`]s.

mod level;
mod state;
mod structured;

pub use level::{default_directive, parse_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

use crate::config::LoggingConfig;
use crate::error::{PumpError, Result};
use state::{INIT_ERROR, INIT_ONCE, LOG_GUARD};
use std::path::Path;
use tracing::info;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize logging system based on configuration.
///
/// Only the first call installs a subscriber; later calls return the outcome
/// of that first attempt.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    INIT_ONCE.call_once(|| {
        if let Err(e) = install(config) {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(PumpError::config(err.clone()));
    }
    Ok(())
}

fn install(config: &LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(level).into());

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.console_output {
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        layers.push(if config.json_format {
            base.json().with_filter(LevelFilter::from_level(level)).boxed()
        } else {
            base.with_filter(LevelFilter::from_level(level)).boxed()
        });
    }

    if let Some(file) = config.file.as_deref().filter(|f| !f.trim().is_empty()) {
        // A path with an extension names the file; its parent holds the rotated logs
        let p = Path::new(file);
        let dir = if p.extension().is_some() {
            p.parent().unwrap_or(p)
        } else {
            p
        };
        let appender = rolling::Builder::new()
            .rotation(rolling::Rotation::DAILY)
            .filename_prefix("pumpcontrol")
            .filename_suffix("log")
            .max_log_files(config.backup_count.max(1) as usize)
            .build(dir)
            .map_err(|e| PumpError::io(format!("Failed to create log file appender: {}", e)))?;
        let (writer, guard) = non_blocking(appender);
        let _ = LOG_GUARD.set(guard);

        let base = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        layers.push(if config.json_format {
            base.json().with_filter(LevelFilter::from_level(level)).boxed()
        } else {
            base.with_filter(LevelFilter::from_level(level)).boxed()
        });
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| PumpError::config(format!("Failed to install subscriber: {}", e)))?;

    info!(
        "Logging initialized - level: {:?}, console: {}, file: {}",
        level,
        config.console_output,
        config.file.as_deref().unwrap_or("-")
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        let first = init_logging(&config).is_ok();
        let second = init_logging(&config).is_ok();
        assert_eq!(first, second);
    }

    #[test]
    fn test_structured_logger() {
        let logger = get_logger("test_component");
        assert_eq!(logger.component(), "test_component");

        // These should not panic
        logger.info("Test info message");
        logger.debug("Test debug message");
        logger.warn("Test warning message");
        logger.error("Test error message");
    }
}
