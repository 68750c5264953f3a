//! Time helpers shared by the price and override paths
//!
//! "Local" always means the configured IANA zone, never the host zone.

use crate::error::{PumpError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an instant into a fixed offset.
///
/// RFC 3339 strings keep their own offset. Zone-less date-times are read as
/// local wall-clock time in `tz`; on a DST fold the earlier instant is used.
pub fn parse_instant(raw: &str, tz: Tz) -> Result<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(dt);
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| PumpError::malformed(format!("unrecognised timestamp: {raw:?}")))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|local| local.fixed_offset())
        .ok_or_else(|| PumpError::malformed(format!("timestamp does not exist in {tz}: {raw:?}")))
}

/// Local calendar date of an instant
pub fn local_date<Z: TimeZone>(instant: &DateTime<Z>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Cache key for the prices of one local day, e.g. `prices20240101`
pub fn price_key(date: NaiveDate) -> String {
    format!("prices{}", date.format("%Y%m%d"))
}
