//! Timestamp helpers shared by every layer.
//!
//! All punch and attendance times are naive local date-times as reported by
//! the device clock. They are rendered as `YYYY-MM-DD HH:MM:SS` everywhere a
//! string form is needed, so lexical order equals chronological order.

use chrono::{NaiveDateTime, TimeDelta};

use crate::{Error, Result};

/// Second-precision timestamp format used in buffers and stores.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_timestamp(ts: NaiveDateTime) -> String {
  ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a timestamp, accepting either a space or a `T` separator.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
  let s = s.trim();
  NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
    .map_err(|_| Error::InvalidTimestamp(s.to_owned()))
}

/// Fractional hours from `start` to `end`; negative if `end` precedes `start`.
pub fn hours_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
  (end - start).num_seconds() as f64 / 3600.0
}

/// Convert fractional hours (as configured in settings) to a delta, at
/// millisecond resolution. `None` when not finite or out of range.
pub fn delta_from_hours(hours: f64) -> Option<TimeDelta> {
  let millis = (hours * 3_600_000.0).round();
  if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
    return None;
  }
  TimeDelta::try_milliseconds(millis as i64)
}
