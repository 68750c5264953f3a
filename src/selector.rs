//! Price selector
//!
//! Penalises slots outside the preferred hours, ranks every slot by adjusted
//! price and runs the pump when the current slot is among the cheapest
//! `runtime * slots_per_hour`.

use crate::logging::{StructuredLogger, get_logger};
use crate::prices::PricePoint;
use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, de};

/// Per-run selection parameters from the control document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// First preferred local hour (inclusive)
    #[serde(rename = "notbefore", deserialize_with = "lenient_start_hour")]
    pub not_before: u32,

    /// End of the preferred hours (exclusive)
    #[serde(rename = "notafter", deserialize_with = "lenient_end_hour")]
    pub not_after: u32,

    /// Runtime in hour-equivalents
    #[serde(deserialize_with = "lenient_u32")]
    pub runtime: u32,

    /// Surcharge added to slots outside the preferred hours
    #[serde(rename = "othersadd", deserialize_with = "lenient_f64")]
    pub others_add: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            not_before: 8,
            not_after: 19,
            runtime: 4,
            others_add: 4.0,
        }
    }
}

impl SelectionConfig {
    /// Whether a local hour lies in `[not_before, not_after)`
    pub const fn is_preferred(&self, hour: u32) -> bool {
        hour >= self.not_before && hour < self.not_after
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Lenient {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let v = match Lenient::deserialize(deserializer)? {
        Lenient::Number(n) => n,
        Lenient::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(&s), &"a decimal"))?,
    };
    if v.is_finite() {
        Ok(v)
    } else {
        Err(de::Error::custom("value must be finite"))
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let v = lenient_f64(deserializer)?;
    if v < 0.0 || v.fract() != 0.0 || v > f64::from(u32::MAX) {
        return Err(de::Error::invalid_value(
            de::Unexpected::Float(v),
            &"a non-negative integer",
        ));
    }
    Ok(v as u32)
}

fn bounded_hour<'de, D: Deserializer<'de>>(deserializer: D, max: u32) -> Result<u32, D::Error> {
    let v = lenient_u32(deserializer)?;
    if v > max {
        return Err(de::Error::invalid_value(
            de::Unexpected::Unsigned(u64::from(v)),
            &format!("an hour between 0 and {max}").as_str(),
        ));
    }
    Ok(v)
}

fn lenient_start_hour<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    bounded_hour(deserializer, 23)
}

/// 24 means "up to midnight"
fn lenient_end_hour<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    bounded_hour(deserializer, 24)
}

/// A price point after the out-of-hours surcharge
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSlot {
    pub point: PricePoint,
    pub adjusted: f64,
    pub hour: u32,
    pub minute: u32,
}

pub struct PriceSelector {
    tz: Tz,
    slots_per_hour: u32,
    logger: StructuredLogger,
}

impl PriceSelector {
    pub fn new(tz: Tz, slots_per_hour: u32) -> Self {
        Self {
            tz,
            slots_per_hour,
            logger: get_logger("selector"),
        }
    }

    /// Cheapest slots by adjusted price, at most `runtime * slots_per_hour`.
    ///
    /// Equal adjusted prices keep feed order.
    pub fn select(&self, prices: &[PricePoint], config: &SelectionConfig) -> Vec<RankedSlot> {
        let mut ranked: Vec<RankedSlot> = prices
            .iter()
            .map(|p| {
                let local = p.local(self.tz);
                let hour = local.hour();
                let adjusted = if config.is_preferred(hour) {
                    p.value
                } else {
                    p.value + config.others_add
                };
                RankedSlot {
                    point: p.clone(),
                    adjusted,
                    hour,
                    minute: local.minute(),
                }
            })
            .collect();

        // `sort_by` is stable
        ranked.sort_by(|a, b| a.adjusted.total_cmp(&b.adjusted));

        let wanted = config.runtime.saturating_mul(self.slots_per_hour) as usize;
        ranked.truncate(wanted);
        ranked
    }

    /// Whether the pump should run at `now` on price alone
    pub fn decide(
        &self,
        prices: &[PricePoint],
        config: &SelectionConfig,
        now: DateTime<Tz>,
    ) -> bool {
        let now = now.with_timezone(&self.tz);
        let (hour, minute) = (now.hour(), now.minute());
        let selected = self.select(prices, config);

        let current = selected
            .iter()
            .find(|s| s.hour == hour && s.minute <= minute);

        match current {
            Some(slot) => {
                self.logger.info(&format!(
                    "Current slot {} is among the {} cheapest (adjusted {:.4})",
                    slot.point.timestamp,
                    selected.len(),
                    slot.adjusted
                ));
                true
            }
            None => {
                self.logger.info(&format!(
                    "No selected slot for {:02}:{:02} among {} of {} prices",
                    hour,
                    minute,
                    selected.len(),
                    prices.len()
                ));
                false
            }
        }
    }
}
