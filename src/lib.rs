//! # Pumpcontrol - spot-price driven pool pump scheduler
//!
//! Decides once per invocation whether the pool pump should run and switches
//! the smart plug behind a Hue-style bridge accordingly.
//!
//! ## Architecture
//!
//! - `config`: YAML application configuration and validation
//! - `logging`: Structured logging and tracing
//! - `clock`: Time zone aware instant parsing and day keys
//! - `prices`: Price points and feed payload parsing
//! - `feed`: Remote spot price feed client
//! - `persistence`: Durable key-value store for the daily price cache
//! - `provider`: Cached price provider with forced refetch fallback
//! - `selector`: Cheapest-slot selection with out-of-hours penalty
//! - `overrides`: Manual override windows
//! - `control`: Remote configuration/override document
//! - `decision`: Override-first decision combiner
//! - `bridge`: Appliance bridge client
//! - `runner`: One complete invocation

pub mod bridge;
pub mod clock;
pub mod config;
pub mod control;
pub mod decision;
pub mod error;
pub mod feed;
pub mod logging;
pub mod overrides;
pub mod persistence;
pub mod prices;
pub mod provider;
pub mod runner;
pub mod selector;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::AppConfig;
pub use decision::{Decision, DecisionCombiner, DecisionSource};
pub use error::{PumpError, Result};
pub use runner::{RunReport, Runner};
