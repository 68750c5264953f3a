//! Appliance control bridge
//!
//! The pump is a smart plug behind a Hue-style bridge. Only reading and
//! writing its on/off state is needed; discovery and pairing happen outside
//! this program (pairing leaves the API username under the store key
//! `hue_id`).

use crate::config::BridgeConfig;
use crate::error::{PumpError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::persistence::PriceStore;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;

/// Store key holding the bridge API username
pub const USERNAME_KEY: &str = "hue_id";

/// The controlled device
#[async_trait]
pub trait Appliance: Send + Sync {
    /// Current on/off state
    async fn is_on(&self) -> Result<bool>;

    /// Switch the device on or off
    async fn set_on(&self, on: bool) -> Result<()>;
}

/// Hue-style REST bridge bound to one named light
pub struct HueBridge {
    client: reqwest::Client,
    api: String,
    device_id: String,
    logger: StructuredLogger,
}

/// Hue reports failures as `[{"error": {...}}]` with HTTP 200
fn bridge_error(body: &Value) -> Option<String> {
    body.as_array()?
        .iter()
        .filter_map(|item| item.get("error"))
        .map(|err| {
            err.get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown bridge error")
                .to_string()
        })
        .next()
}

impl HueBridge {
    /// Resolve credentials and the device id for `cfg.device_name`
    pub async fn connect(cfg: &BridgeConfig, store: &dyn PriceStore) -> Result<Self> {
        let configured = cfg.username.as_deref().map(str::trim).filter(|u| !u.is_empty());
        let username = match configured {
            Some(u) => u.to_string(),
            None => store
                .get(USERNAME_KEY)?
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    PumpError::bridge(
                        "no bridge username configured or stored; pair the bridge first",
                    )
                })?,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .danger_accept_invalid_certs(cfg.accept_invalid_certs)
            .build()?;
        let api = format!("{}/api/{}", cfg.url.trim_end_matches('/'), username);
        let logger = get_logger("bridge").with_field("device", &cfg.device_name);

        let overview = Self::get_json(&client, &api).await?;
        let device_id = overview
            .get("lights")
            .and_then(Value::as_object)
            .and_then(|lights| {
                lights.iter().find_map(|(id, light)| {
                    (light.get("name").and_then(Value::as_str) == Some(cfg.device_name.as_str()))
                        .then(|| id.clone())
                })
            })
            .ok_or_else(|| {
                PumpError::bridge(format!(
                    "{} not found in list of controlled units",
                    cfg.device_name
                ))
            })?;

        logger.debug(&format!("Resolved device id {}", device_id));
        Ok(Self {
            client,
            api,
            device_id,
            logger,
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    async fn get_json(client: &reqwest::Client, url: &str) -> Result<Value> {
        let resp = client
            .get(url)
            .send()
            .await
            .map_err(|e| PumpError::remote_fetch(format!("bridge unreachable: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PumpError::remote_fetch(format!(
                "bridge request failed: HTTP {status}"
            )));
        }
        let body: Value = resp.json().await.map_err(|e| PumpError::malformed(e.to_string()))?;
        match bridge_error(&body) {
            Some(msg) => Err(PumpError::bridge(msg)),
            None => Ok(body),
        }
    }
}

#[async_trait]
impl Appliance for HueBridge {
    async fn is_on(&self) -> Result<bool> {
        let url = format!("{}/lights/{}", self.api, self.device_id);
        let body = Self::get_json(&self.client, &url).await?;
        body.pointer("/state/on")
            .and_then(Value::as_bool)
            .ok_or_else(|| PumpError::malformed("bridge light has no state.on"))
    }

    async fn set_on(&self, on: bool) -> Result<()> {
        let url = format!("{}/lights/{}/state", self.api, self.device_id);
        let resp = self
            .client
            .put(&url)
            .json(&json!({ "on": on }))
            .send()
            .await
            .map_err(|e| PumpError::remote_fetch(format!("bridge unreachable: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(PumpError::remote_fetch(format!(
                "setting running to {on} failed: HTTP {status}"
            )));
        }
        let body: Value = resp.json().await.unwrap_or(Value::Null);
        if let Some(msg) = bridge_error(&body) {
            return Err(PumpError::bridge(format!("setting running to {on} failed: {msg}")));
        }
        self.logger.info(&format!("Set running to {}", on));
        Ok(())
    }
}
