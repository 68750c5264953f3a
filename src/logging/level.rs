use crate::error::{PumpError, Result};
use tracing::Level;

/// Parse a configured level name into a tracing `Level`
pub fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_uppercase().as_str() {
        "TRACE" => Ok(Level::TRACE),
        "DEBUG" => Ok(Level::DEBUG),
        "INFO" => Ok(Level::INFO),
        "WARN" | "WARNING" => Ok(Level::WARN),
        "ERROR" => Ok(Level::ERROR),
        _ => Err(PumpError::config(format!(
            "Invalid log level: {}",
            level_str
        ))),
    }
}

/// Default `EnvFilter` directive when `RUST_LOG` is unset
pub fn default_directive(level: Level) -> String {
    format!("pumpcontrol={},reqwest=warn,hyper=warn", level)
}
