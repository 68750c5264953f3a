//! Price cache provider
//!
//! Serves today's price points from the daily cache, fetching the feed on a
//! miss. When the points left after local-day filtering are empty, the feed is
//! fetched once more with the cache bypassed; this covers an entry written
//! shortly before midnight that holds nothing for the new day.

use crate::clock::price_key;
use crate::error::Result;
use crate::feed::PriceFeed;
use crate::logging::{StructuredLogger, get_logger};
use crate::persistence::PriceStore;
use crate::prices::{PricePoint, parse_feed, retain_local_day};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::sync::Arc;

pub struct PriceCacheProvider {
    feed: Arc<dyn PriceFeed>,
    store: Arc<dyn PriceStore>,
    tz: Tz,
    logger: StructuredLogger,
}

impl PriceCacheProvider {
    pub fn new(feed: Arc<dyn PriceFeed>, store: Arc<dyn PriceStore>, tz: Tz) -> Self {
        Self {
            feed,
            store,
            tz,
            logger: get_logger("provider"),
        }
    }

    /// Price points whose local calendar day is `day`, possibly empty.
    ///
    /// The store lock is held for the whole call and released on every exit
    /// path, including a failed fetch.
    pub async fn get_prices(&self, day: NaiveDate) -> Result<Vec<PricePoint>> {
        // Blocks the worker thread; fine for a single-shot run
        let _guard = self.store.lock()?;

        let prices = self.load(day, false).await?;
        if !prices.is_empty() {
            return Ok(prices);
        }

        self.logger
            .warn(&format!("No prices for {} after filtering, forcing refetch", day));
        let prices = self.load(day, true).await?;
        if prices.is_empty() {
            self.logger
                .warn(&format!("Feed still has no prices for {}", day));
        }
        Ok(prices)
    }

    async fn load(&self, day: NaiveDate, force: bool) -> Result<Vec<PricePoint>> {
        let key = price_key(day);

        if !force && let Some(body) = self.store.get(&key)? {
            match parse_feed(&body, self.tz) {
                Ok(mut points) => {
                    retain_local_day(&mut points, day, self.tz);
                    self.logger.debug(&format!(
                        "Cache hit for {} ({} points for the day)",
                        key,
                        points.len()
                    ));
                    return Ok(points);
                }
                Err(e) => {
                    // Unusable entry: report nothing so the caller refetches
                    self.logger
                        .warn(&format!("Ignoring unreadable cache entry {}: {}", key, e));
                    return Ok(Vec::new());
                }
            }
        }

        self.logger.info(&format!(
            "Fetching prices for {} ({})",
            key,
            if force { "forced" } else { "cache miss" }
        ));
        let body = self.feed.fetch_latest().await?;
        self.store.set(&key, &body)?;

        let mut points = parse_feed(&body, self.tz)?;
        retain_local_day(&mut points, day, self.tz);
        self.logger
            .debug(&format!("Feed yielded {} points for {}", points.len(), day));
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PumpError;
    use crate::persistence::FileStore;
    use crate::testing::ScriptedFeed;
    use chrono_tz::UTC;

    const JAN1: &str = r#"[
        {"value": "1.0", "timestamp": "2024-01-01T08:00:00Z"},
        {"value": "0.5", "timestamp": "2024-01-01T09:00:00Z"}
    ]"#;
    const DEC31: &str = r#"[{"value": "2.0", "timestamp": "2023-12-31T20:00:00Z"}]"#;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn provider(
        feed: &Arc<ScriptedFeed>,
        dir: &tempfile::TempDir,
    ) -> (PriceCacheProvider, Arc<FileStore>) {
        let store = Arc::new(FileStore::new(
            dir.path().join("cache.json"),
            dir.path().join("cache.lock"),
        ));
        (PriceCacheProvider::new(feed.clone(), store.clone(), UTC), store)
    }

    #[tokio::test]
    async fn miss_fetches_and_caches_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ScriptedFeed::new(vec![Ok(JAN1.to_string())]));
        let (provider, store) = provider(&feed, &dir);

        let prices = provider.get_prices(day()).await.unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(store.get("prices20240101").unwrap().as_deref(), Some(JAN1));
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test]
    async fn second_call_same_day_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ScriptedFeed::new(vec![Ok(JAN1.to_string())]));
        let (provider, _) = provider(&feed, &dir);

        provider.get_prices(day()).await.unwrap();
        let prices = provider.get_prices(day()).await.unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(feed.calls(), 1);
    }

    #[tokio::test]
    async fn stale_entry_forces_exactly_one_refetch() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ScriptedFeed::new(vec![Ok(JAN1.to_string())]));
        let (provider, store) = provider(&feed, &dir);
        // Written before midnight under today's key
        store.set("prices20240101", DEC31).unwrap();

        let prices = provider.get_prices(day()).await.unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(feed.calls(), 1);
        assert_eq!(store.get("prices20240101").unwrap().as_deref(), Some(JAN1));
    }

    #[tokio::test]
    async fn corrupt_cache_entry_refetches_once() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ScriptedFeed::new(vec![Ok(JAN1.to_string())]));
        let (provider, store) = provider(&feed, &dir);
        store.set("prices20240101", "<html>oops</html>").unwrap();

        let prices = provider.get_prices(day()).await.unwrap();
        assert_eq!(prices.len(), 2);
        assert_eq!(feed.calls(), 1);
        assert_eq!(store.get("prices20240101").unwrap().as_deref(), Some(JAN1));
    }

    #[tokio::test]
    async fn still_empty_after_forced_refetch_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ScriptedFeed::new(vec![
            Ok(DEC31.to_string()),
            Ok(DEC31.to_string()),
            Ok(DEC31.to_string()),
        ]));
        let (provider, _) = provider(&feed, &dir);

        let prices = provider.get_prices(day()).await.unwrap();
        assert!(prices.is_empty());
        assert_eq!(feed.calls(), 2);
    }

    #[tokio::test]
    async fn fetch_failure_is_fatal_and_releases_lock() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ScriptedFeed::new(vec![Err(PumpError::remote_fetch("503"))]));
        let (provider, store) = provider(&feed, &dir);

        let err = provider.get_prices(day()).await.unwrap_err();
        assert!(matches!(err, PumpError::RemoteFetch { .. }));
        assert!(!store.contains("prices20240101").unwrap());
        drop(store.lock().unwrap());
    }

    #[tokio::test]
    async fn malformed_fresh_payload_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let feed = Arc::new(ScriptedFeed::new(vec![Ok("<html>".to_string())]));
        let (provider, _) = provider(&feed, &dir);

        let err = provider.get_prices(day()).await.unwrap_err();
        assert!(matches!(err, PumpError::MalformedPayload { .. }));
        assert_eq!(feed.calls(), 1);
    }
}
