//! Configuration management for Pumpcontrol
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files. The per-run selection parameters live in
//! [`crate::selector::SelectionConfig`] and come from the remote control source.

use crate::error::{PumpError, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod defaults;

/// Environment variable that points at an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "PUMPCONTROL_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// IANA time zone that defines "local" for day keys and hour matching
    pub timezone: String,

    /// Spot price feed
    pub feed: FeedConfig,

    /// Remote configuration/override source
    pub control: ControlConfig,

    /// Slot selection tuning
    pub selection: SelectionTuning,

    /// Daily price cache
    pub cache: CacheConfig,

    /// Appliance bridge
    pub bridge: BridgeConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Spot price feed endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Scheme and host of the price service
    pub base_url: String,

    /// Price region, e.g. SE3
    pub region: String,

    /// HTTP timeout in seconds
    pub timeout_seconds: u64,
}

/// Remote configuration/override document location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Base URL; `/.json` is appended. Built-in defaults apply when unset.
    pub url: Option<String>,

    /// HTTP timeout in seconds
    pub timeout_seconds: u64,
}

/// Slot selection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionTuning {
    /// Feed slots per configured runtime hour
    pub slots_per_hour: u32,
}

/// Daily price cache location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// JSON store file; the lock file sits next to it with a `.lock` suffix
    pub path: String,
}

/// Appliance bridge connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the bridge, e.g. `https://192.168.1.20`
    pub url: String,

    /// API username; read from the store key `hue_id` when unset
    pub username: Option<String>,

    /// Name of the controlled light/plug
    pub device_name: String,

    /// Bridges ship self-signed certificates
    pub accept_invalid_certs: bool,

    /// HTTP timeout in seconds
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Whether to log to the console (stderr)
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,

    /// Optional directory or file path for a daily rolling log file
    pub file: Option<String>,

    /// Number of rotated files to keep
    pub backup_count: u32,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PumpError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first existing default location
    pub fn load() -> Result<Self> {
        Self::load_from(std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
    }

    /// Load from `explicit` when given, otherwise search the default locations
    pub fn load_from(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let default_paths = ["pumpcontrol.yaml", "/etc/pumpcontrol/config.yaml"];
        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parsed time zone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| PumpError::config(format!("unknown time zone: {}", self.timezone)))
    }

    /// Lock file guarding the cache store
    pub fn cache_lock_path(&self) -> String {
        format!("{}.lock", self.cache.path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.timezone.parse::<Tz>().is_err() {
            return Err(PumpError::validation(
                "timezone",
                "Unknown IANA time zone",
            ));
        }

        if self.feed.base_url.trim().is_empty() {
            return Err(PumpError::validation(
                "feed.base_url",
                "Price service URL cannot be empty",
            ));
        }

        if self.feed.region.trim().is_empty() {
            return Err(PumpError::validation(
                "feed.region",
                "Region cannot be empty",
            ));
        }

        if self.selection.slots_per_hour == 0 {
            return Err(PumpError::validation(
                "selection.slots_per_hour",
                "Must be greater than 0",
            ));
        }

        if self.cache.path.trim().is_empty() {
            return Err(PumpError::validation(
                "cache.path",
                "Cache path cannot be empty",
            ));
        }

        if self.bridge.device_name.trim().is_empty() {
            return Err(PumpError::validation(
                "bridge.device_name",
                "Device name cannot be empty",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.feed.region, "SE3");
        assert_eq!(config.selection.slots_per_hour, 4);
        assert_eq!(config.bridge.device_name, "Poolpump");
        assert_eq!(config.tz().unwrap(), chrono_tz::Europe::Stockholm);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        config.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.selection.slots_per_hour = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.bridge.device_name = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_falls_back_to_defaults() {
        let config: AppConfig = serde_yaml::from_str("feed:\n  region: SE4\n").unwrap();
        assert_eq!(config.feed.region, "SE4");
        assert_eq!(config.feed.base_url, "https://spot.utilitarian.io");
        assert_eq!(config.cache.path, "pumpcontrol.json");
        assert_eq!(config.cache_lock_path(), "pumpcontrol.json.lock");
    }
}
