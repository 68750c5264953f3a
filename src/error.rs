//! Error types and handling for Pumpcontrol
//!
//! Every failure surfaced by the decision engine and its collaborators maps to
//! one of these kinds so the binary can log it and exit without touching the
//! pump.

use thiserror::Error;

/// Result type alias for Pumpcontrol operations
pub type Result<T> = std::result::Result<T, PumpError>;

/// Main error type for Pumpcontrol
#[derive(Debug, Error)]
pub enum PumpError {
    /// Price feed, control source or bridge returned non-success or was unreachable
    #[error("Remote fetch error: {message}")]
    RemoteFetch { message: String },

    /// JSON or field parsing failure on a fetched payload
    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    /// The daily price cache could not be read, written or locked
    #[error("Cache unavailable: {message}")]
    CacheUnavailable { message: String },

    /// Application configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// The bridge answered but the device could not be used
    #[error("Bridge error: {message}")]
    Bridge { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl PumpError {
    /// Create a new remote fetch error
    pub fn remote_fetch<S: Into<String>>(message: S) -> Self {
        Self::RemoteFetch {
            message: message.into(),
        }
    }

    /// Create a new malformed payload error
    pub fn malformed<S: Into<String>>(message: S) -> Self {
        Self::MalformedPayload {
            message: message.into(),
        }
    }

    /// Create a new cache unavailable error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::CacheUnavailable {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new bridge error
    pub fn bridge<S: Into<String>>(message: S) -> Self {
        Self::Bridge {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Short stable label used in log fields
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RemoteFetch { .. } => "remote_fetch",
            Self::MalformedPayload { .. } => "malformed_payload",
            Self::CacheUnavailable { .. } => "cache_unavailable",
            Self::Config { .. } => "config",
            Self::Validation { .. } => "validation",
            Self::Bridge { .. } => "bridge",
            Self::Io { .. } => "io",
        }
    }
}

impl From<std::io::Error> for PumpError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for PumpError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

impl From<serde_json::Error> for PumpError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}

impl From<reqwest::Error> for PumpError {
    fn from(err: reqwest::Error) -> Self {
        Self::remote_fetch(err.to_string())
    }
}
