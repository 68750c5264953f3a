//! Decision combiner
//!
//! Overrides first; price selection only when no override applies.

use crate::clock::local_date;
use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};
use crate::overrides::{OverrideEntry, OverrideResolver};
use crate::provider::PriceCacheProvider;
use crate::selector::{PriceSelector, SelectionConfig};
use chrono::DateTime;
use chrono_tz::Tz;

/// Where a decision came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    Override,
    Price,
}

/// Outcome of one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    /// Pump should be on
    pub run: bool,
    pub source: DecisionSource,
}

pub struct DecisionCombiner {
    resolver: OverrideResolver,
    selector: PriceSelector,
    provider: PriceCacheProvider,
    tz: Tz,
    logger: StructuredLogger,
}

impl DecisionCombiner {
    pub fn new(provider: PriceCacheProvider, tz: Tz, slots_per_hour: u32) -> Self {
        Self {
            resolver: OverrideResolver::new(tz),
            selector: PriceSelector::new(tz, slots_per_hour),
            provider,
            tz,
            logger: get_logger("decision"),
        }
    }

    /// Decide whether the pump should be on at `now`.
    ///
    /// Prices are only fetched when no override applies.
    pub async fn decide(
        &self,
        config: &SelectionConfig,
        overrides: &[OverrideEntry],
        now: DateTime<Tz>,
    ) -> Result<Decision> {
        let outcome = self.resolver.resolve(overrides, now);
        if outcome.applies {
            self.logger
                .info(&format!("Override decides: run={}", outcome.state));
            return Ok(Decision {
                run: outcome.state,
                source: DecisionSource::Override,
            });
        }

        let prices = self.provider.get_prices(local_date(&now, self.tz)).await?;
        let run = self.selector.decide(&prices, config, now);
        self.logger.info(&format!("Price selection decides: run={}", run));
        Ok(Decision {
            run,
            source: DecisionSource::Price,
        })
    }
}
