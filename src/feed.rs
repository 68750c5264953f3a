//! Remote spot price feed
//!
//! `GET {base_url}/electricity/{region}/latest` returns a JSON array of
//! `{value, timestamp}` entries. The body is handed back verbatim so the
//! provider can cache exactly what the service sent.

use crate::config::FeedConfig;
use crate::error::{PumpError, Result};
use crate::logging::{StructuredLogger, get_logger};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::time::Duration;

/// Source of raw price feed payloads
#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// Fetch the latest payload. Non-success is a `RemoteFetch` error.
    async fn fetch_latest(&self) -> Result<String>;
}

/// HTTP client for the spot price service
pub struct SpotPriceClient {
    client: reqwest::Client,
    url: String,
    logger: StructuredLogger,
}

impl SpotPriceClient {
    /// Build a client for the configured service and region
    pub fn new(cfg: &FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()?;
        let url = format!(
            "{}/electricity/{}/latest",
            cfg.base_url.trim_end_matches('/'),
            cfg.region.trim()
        );
        let logger = get_logger("feed").with_field("region", cfg.region.trim());
        Ok(Self {
            client,
            url,
            logger,
        })
    }
}

#[async_trait]
impl PriceFeed for SpotPriceClient {
    async fn fetch_latest(&self) -> Result<String> {
        self.logger.debug(&format!("Fetching {}", self.url));
        let resp = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, concat!("pumpcontrol/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|e| PumpError::remote_fetch(format!("price feed unreachable: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            self.logger.error(&format!("Price feed error: {}", status));
            return Err(PumpError::remote_fetch(format!(
                "could not fetch electricity prices: HTTP {status}"
            )));
        }

        let body = resp.text().await?;
        self.logger
            .info(&format!("Fetched price feed ({} bytes)", body.len()));
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn cfg(base_url: String) -> FeedConfig {
        FeedConfig {
            base_url,
            region: "SE3".to_string(),
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn returns_body_verbatim() {
        let mut server = Server::new_async().await;
        let body = r#"[{"value":"0.10","timestamp":"2024-01-01T00:00:00Z"}]"#;
        let mock = server
            .mock("GET", "/electricity/SE3/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await;

        let client = SpotPriceClient::new(&cfg(server.url())).unwrap();
        assert_eq!(client.fetch_latest().await.unwrap(), body);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_is_remote_fetch_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/electricity/SE3/latest")
            .with_status(503)
            .create_async()
            .await;

        let client = SpotPriceClient::new(&cfg(format!("{}/", server.url()))).unwrap();
        let err = client.fetch_latest().await.unwrap_err();
        assert!(matches!(err, PumpError::RemoteFetch { .. }));
    }
}
