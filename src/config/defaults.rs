use super::*;

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://spot.utilitarian.io".to_string(),
            region: "SE3".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_seconds: 10,
        }
    }
}

impl Default for SelectionTuning {
    fn default() -> Self {
        Self { slots_per_hour: 4 }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: "pumpcontrol.json".to_string(),
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            url: "https://philips-hue.local".to_string(),
            username: None,
            device_name: "Poolpump".to_string(),
            accept_invalid_certs: true,
            timeout_seconds: 10,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            console_output: true,
            json_format: false,
            file: None,
            backup_count: 5,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Stockholm".to_string(),
            feed: FeedConfig::default(),
            control: ControlConfig::default(),
            selection: SelectionTuning::default(),
            cache: CacheConfig::default(),
            bridge: BridgeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
