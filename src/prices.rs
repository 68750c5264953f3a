//! Spot price points and feed payload parsing

use crate::clock::{local_date, parse_instant};
use crate::error::{PumpError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use serde::Deserialize;

/// Price for one metering slot
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub value: f64,
    pub timestamp: DateTime<FixedOffset>,
}

impl PricePoint {
    pub const fn new(value: f64, timestamp: DateTime<FixedOffset>) -> Self {
        Self { value, timestamp }
    }

    /// Wall-clock time of the slot start in `tz`
    pub fn local(&self, tz: Tz) -> DateTime<Tz> {
        self.timestamp.with_timezone(&tz)
    }
}

/// The feed sends values either as JSON numbers or as decimal strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    value: FeedValue,
    timestamp: String,
}

impl FeedEntry {
    fn into_point(self, tz: Tz) -> Result<PricePoint> {
        let value = match self.value {
            FeedValue::Number(v) => v,
            FeedValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| PumpError::malformed(format!("price value {s:?} is not a decimal")))?,
        };
        if !value.is_finite() {
            return Err(PumpError::malformed(format!("price value {value} is not finite")));
        }
        Ok(PricePoint::new(value, parse_instant(&self.timestamp, tz)?))
    }
}

/// Parse a raw feed body into price points, in feed order.
///
/// Any malformed entry fails the whole payload: a partial price list is never
/// acted upon.
pub fn parse_feed(body: &str, tz: Tz) -> Result<Vec<PricePoint>> {
    let entries: Vec<FeedEntry> = serde_json::from_str(body)?;
    entries.into_iter().map(|e| e.into_point(tz)).collect()
}

/// Keep only the points whose local calendar day is `day`
pub fn retain_local_day(points: &mut Vec<PricePoint>, day: NaiveDate, tz: Tz) {
    points.retain(|p| local_date(&p.timestamp, tz) == day);
}
