//! One invocation: decide, then reconcile the pump with the decision
//!
//! Any error before the final write aborts the run and leaves the pump as it
//! is.

use crate::bridge::{Appliance, HueBridge};
use crate::config::AppConfig;
use crate::control::{ControlSource, control_source};
use crate::decision::{DecisionCombiner, DecisionSource};
use crate::error::Result;
use crate::feed::SpotPriceClient;
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::persistence::{FileStore, PriceStore};
use crate::provider::PriceCacheProvider;
use chrono::DateTime;
use chrono_tz::Tz;
use std::sync::Arc;

/// What one run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub desired: bool,
    pub previous: bool,
    pub changed: bool,
    pub source: DecisionSource,
}

pub struct Runner {
    control: Box<dyn ControlSource>,
    combiner: DecisionCombiner,
    appliance: Box<dyn Appliance>,
    tz: Tz,
    logger: StructuredLogger,
}

impl Runner {
    pub fn new(
        control: Box<dyn ControlSource>,
        combiner: DecisionCombiner,
        appliance: Box<dyn Appliance>,
        tz: Tz,
        device: &str,
    ) -> Self {
        let context = LogContext::new("runner").with_field("device", device.to_string());
        let logger = get_logger_with_context(context);
        Self {
            control,
            combiner,
            appliance,
            tz,
            logger,
        }
    }

    /// Wire the production collaborators from the application configuration
    pub async fn from_config(cfg: &AppConfig) -> Result<Self> {
        cfg.validate()?;
        let tz = cfg.tz()?;

        let store: Arc<dyn PriceStore> =
            Arc::new(FileStore::new(&cfg.cache.path, cfg.cache_lock_path()));
        let feed = Arc::new(SpotPriceClient::new(&cfg.feed)?);
        let provider = PriceCacheProvider::new(feed, store.clone(), tz);
        let combiner = DecisionCombiner::new(provider, tz, cfg.selection.slots_per_hour);

        let appliance = HueBridge::connect(&cfg.bridge, store.as_ref()).await?;

        Ok(Self::new(
            control_source(&cfg.control)?,
            combiner,
            Box::new(appliance),
            tz,
            &cfg.bridge.device_name,
        ))
    }

    /// Run once at the current time
    pub async fn run_now(&self) -> Result<RunReport> {
        self.run_once(chrono::Utc::now().with_timezone(&self.tz)).await
    }

    /// Decide for `now` and switch the pump if it disagrees
    pub async fn run_once(&self, now: DateTime<Tz>) -> Result<RunReport> {
        let doc = self.control.fetch().await?;
        let decision = self.combiner.decide(&doc.config, &doc.overrides, now).await?;

        let previous = self.appliance.is_on().await?;
        self.logger.info(&format!("Currently running is {}", previous));
        self.logger.info(&format!(
            "Should be running is {} ({:?})",
            decision.run, decision.source
        ));

        let changed = previous != decision.run;
        if changed {
            self.logger.info(&format!("Setting running to {}", decision.run));
            self.appliance.set_on(decision.run).await?;
        }

        Ok(RunReport {
            desired: decision.run,
            previous,
            changed,
            source: decision.source,
        })
    }
}
