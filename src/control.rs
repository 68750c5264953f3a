//! Remote configuration and override source
//!
//! `GET {url}/.json` returns `{config?: {...}, override?: [...]}`. Missing
//! parts fall back to built-in defaults; override entries are kept raw and
//! parsed one by one by the resolver.

use crate::config::ControlConfig;
use crate::error::{PumpError, Result};
use crate::logging::{StructuredLogger, get_logger};
use crate::overrides::OverrideEntry;
use crate::selector::SelectionConfig;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Per-run control document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlDocument {
    #[serde(deserialize_with = "null_as_default")]
    pub config: SelectionConfig,

    #[serde(rename = "override", deserialize_with = "override_list")]
    pub overrides: Vec<OverrideEntry>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts a list, `null`, or an object keyed by id (as some realtime
/// databases store arrays); object entries keep key order
fn override_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<OverrideEntry>, D::Error> {
    use serde::de::Error;
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(Vec::new()),
        Some(serde_json::Value::Array(items)) => {
            Ok(items.into_iter().map(OverrideEntry).collect())
        }
        Some(serde_json::Value::Object(map)) => {
            Ok(map.into_iter().map(|(_, v)| OverrideEntry(v)).collect())
        }
        Some(other) => Err(D::Error::custom(format!(
            "`override` must be a list, got {other}"
        ))),
    }
}

impl ControlDocument {
    /// Parse a control document body. `null` means "nothing configured".
    pub fn parse(body: &str) -> Result<Self> {
        let doc: Option<Self> = serde_json::from_str(body)
            .map_err(|e| PumpError::malformed(format!("control document: {e}")))?;
        Ok(doc.unwrap_or_default())
    }
}

/// Source of the per-run control document
#[async_trait]
pub trait ControlSource: Send + Sync {
    async fn fetch(&self) -> Result<ControlDocument>;
}

/// Built-in defaults and no overrides
pub struct DefaultControl;

#[async_trait]
impl ControlSource for DefaultControl {
    async fn fetch(&self) -> Result<ControlDocument> {
        Ok(ControlDocument::default())
    }
}

/// HTTP control document client
pub struct HttpControlSource {
    client: reqwest::Client,
    url: String,
    logger: StructuredLogger,
}

impl HttpControlSource {
    pub fn new(base_url: &str, cfg: &ControlConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            url: format!("{}/.json", base_url.trim_end_matches('/')),
            logger: get_logger("control"),
        })
    }
}

#[async_trait]
impl ControlSource for HttpControlSource {
    async fn fetch(&self) -> Result<ControlDocument> {
        let resp = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| PumpError::remote_fetch(format!("control source unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            self.logger.error(&format!("Control source error: {}", status));
            return Err(PumpError::remote_fetch(format!(
                "could not fetch control document: HTTP {status}"
            )));
        }

        let doc = ControlDocument::parse(&resp.text().await?)?;
        self.logger.debug(&format!(
            "Control document: {:?}, {} override(s)",
            doc.config,
            doc.overrides.len()
        ));
        Ok(doc)
    }
}

/// Pick the HTTP source when a URL is configured
pub fn control_source(cfg: &ControlConfig) -> Result<Box<dyn ControlSource>> {
    match cfg.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => Ok(Box::new(HttpControlSource::new(url, cfg)?)),
        None => Ok(Box::new(DefaultControl)),
    }
}
