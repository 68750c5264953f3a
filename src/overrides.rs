//! Manual override windows
//!
//! An operator can force the pump on or off for a time range. The first
//! window containing "now" wins. When none contains "now" but one starts or
//! ends today, the pump is forced off for the rest of the day instead of
//! falling back to price selection.

use crate::clock::{local_date, parse_instant};
use crate::logging::{StructuredLogger, get_logger};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One override entry exactly as received; parsed lazily so a single bad
/// entry cannot fail the whole control document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverrideEntry(pub Value);

/// A parsed override window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub state: bool,
}

/// Why an entry was left out of the scan
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("entry is not an object")]
    NotAnObject,
    #[error("missing or non-string `{0}`")]
    MissingField(&'static str),
    #[error("unparseable `{field}`: {raw:?}")]
    BadTimestamp { field: &'static str, raw: String },
}

/// Outcome of the override scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverrideOutcome {
    /// Whether the override decides the run
    pub applies: bool,
    /// Forced pump state when `applies`
    pub state: bool,
}

impl OverrideOutcome {
    pub const fn inactive() -> Self {
        Self {
            applies: false,
            state: false,
        }
    }

    pub const fn forced(state: bool) -> Self {
        Self {
            applies: true,
            state,
        }
    }
}

/// `true`, `"on"` and `"1"` mean on; anything else means off
pub fn normalized_state(raw: &Value) -> bool {
    match raw {
        Value::Bool(b) => *b,
        Value::String(s) => s == "on" || s == "1",
        _ => false,
    }
}

impl OverrideEntry {
    /// Build an entry from its three fields
    pub fn new(start: &str, end: &str, state: Value) -> Self {
        Self(serde_json::json!({ "start": start, "end": end, "state": state }))
    }

    /// Parse into a window; zone-less timestamps are local to `tz`
    pub fn parse(&self, tz: Tz) -> Result<OverrideWindow, SkipReason> {
        let obj = self.0.as_object().ok_or(SkipReason::NotAnObject)?;
        let instant = |field: &'static str| -> Result<DateTime<FixedOffset>, SkipReason> {
            let raw = obj
                .get(field)
                .and_then(Value::as_str)
                .ok_or(SkipReason::MissingField(field))?;
            parse_instant(raw, tz).map_err(|_| SkipReason::BadTimestamp {
                field,
                raw: raw.to_string(),
            })
        };
        Ok(OverrideWindow {
            start: instant("start")?,
            end: instant("end")?,
            state: obj.get("state").is_some_and(normalized_state),
        })
    }
}

impl OverrideWindow {
    /// `start <= now <= end`, compared as absolute instants
    pub fn contains<Z: chrono::TimeZone>(&self, now: &DateTime<Z>) -> bool {
        let now = now.with_timezone(&Utc);
        self.start.with_timezone(&Utc) <= now && now <= self.end.with_timezone(&Utc)
    }

    /// Whether the window starts or ends on local day `day`
    pub fn touches_day(&self, day: NaiveDate, tz: Tz) -> bool {
        local_date(&self.start, tz) == day || local_date(&self.end, tz) == day
    }
}

pub struct OverrideResolver {
    tz: Tz,
    logger: StructuredLogger,
}

impl OverrideResolver {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            logger: get_logger("overrides"),
        }
    }

    /// Scan `entries` in order against `now`
    pub fn resolve(&self, entries: &[OverrideEntry], now: DateTime<Tz>) -> OverrideOutcome {
        let today = local_date(&now, self.tz);
        let mut saw_today_window = false;

        for (idx, entry) in entries.iter().enumerate() {
            let window = match entry.parse(self.tz) {
                Ok(window) => window,
                Err(reason) => {
                    self.logger
                        .warn(&format!("Skipping override #{}: {}", idx, reason));
                    continue;
                }
            };

            if window.contains(&now) {
                self.logger.info(&format!(
                    "Override #{} active ({} .. {}), forcing {}",
                    idx,
                    window.start,
                    window.end,
                    if window.state { "on" } else { "off" }
                ));
                return OverrideOutcome::forced(window.state);
            }

            if window.touches_day(today, self.tz) {
                saw_today_window = true;
            }
        }

        if saw_today_window {
            self.logger
                .info("Override scheduled today but not active now, forcing off");
        }
        OverrideOutcome {
            applies: saw_today_window,
            state: false,
        }
    }
}
