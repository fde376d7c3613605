//! Check-in events: normalized punches bound to an employee.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Direction ───────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum Direction {
  #[serde(rename = "IN")]
  #[strum(serialize = "IN")]
  In,
  #[serde(rename = "OUT")]
  #[strum(serialize = "OUT")]
  Out,
}

/// Where a check-in came from.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CheckinSource {
  #[default]
  Device,
  /// Injected by an approved regularization request.
  Regularization,
}

// ─── CheckinEvent ────────────────────────────────────────────────────────────

/// One observed boundary crossing. Unique per `(employee_id, timestamp)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinEvent {
  pub checkin_id:    Uuid,
  pub employee_id:   String,
  pub timestamp:     NaiveDateTime,
  /// Provisional until reconciliation rewrites the day's first and last.
  pub direction:     Direction,
  /// The device-local user id that produced the punch.
  pub device_id:     Option<String>,
  pub device_ip:     Option<String>,
  pub source:        CheckinSource,
  /// The attendance record this event was folded into, if any.
  pub attendance_id: Option<Uuid>,
}

impl CheckinEvent {
  /// The calendar date of the event timestamp.
  pub fn date(&self) -> NaiveDate { self.timestamp.date() }
}

/// Input to [`crate::store::AttendanceStore::record_checkin`].
#[derive(Debug, Clone)]
pub struct NewCheckin {
  pub employee_id: String,
  pub timestamp:   NaiveDateTime,
  pub direction:   Direction,
  pub device_id:   Option<String>,
  pub device_ip:   Option<String>,
  pub source:      CheckinSource,
}

impl NewCheckin {
  pub fn regularized(
    employee_id: impl Into<String>,
    timestamp: NaiveDateTime,
    direction: Direction,
  ) -> Self {
    Self {
      employee_id: employee_id.into(),
      timestamp,
      direction,
      device_id: None,
      device_ip: None,
      source: CheckinSource::Regularization,
    }
  }
}

// ─── Per-day grouping ────────────────────────────────────────────────────────

/// The ordered check-ins of one employee on one calendar date.
#[derive(Debug, Clone)]
pub struct DayPunches {
  pub date:   NaiveDate,
  pub events: Vec<CheckinEvent>,
}

impl DayPunches {
  /// Sorts by timestamp; ties cannot occur for a single employee.
  pub fn new(date: NaiveDate, mut events: Vec<CheckinEvent>) -> Self {
    events.sort_by_key(|e| e.timestamp);
    Self { date, events }
  }

  pub fn first(&self) -> Option<&CheckinEvent> { self.events.first() }

  pub fn last(&self) -> Option<&CheckinEvent> { self.events.last() }

  pub fn len(&self) -> usize { self.events.len() }

  pub fn is_empty(&self) -> bool { self.events.is_empty() }

  pub fn timestamps(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
    self.events.iter().map(|e| e.timestamp)
  }
}

/// Group events by the calendar date of their timestamp.
pub fn group_by_date(
  events: impl IntoIterator<Item = CheckinEvent>,
) -> BTreeMap<NaiveDate, DayPunches> {
  let mut by_date: BTreeMap<NaiveDate, Vec<CheckinEvent>> = BTreeMap::new();
  for event in events {
    by_date.entry(event.date()).or_default().push(event);
  }
  by_date
    .into_iter()
    .map(|(date, events)| (date, DayPunches::new(date, events)))
    .collect()
}

#[cfg(test)]
pub(crate) mod tests {
  use std::str::FromStr;

  use super::*;

  pub(crate) fn event(ts: &str) -> CheckinEvent {
    CheckinEvent {
      checkin_id:    Uuid::new_v4(),
      employee_id:   "EMP1".into(),
      timestamp:     crate::clock::parse_timestamp(ts).unwrap(),
      direction:     Direction::Out,
      device_id:     None,
      device_ip:     None,
      source:        CheckinSource::Device,
      attendance_id: None,
    }
  }

  #[test]
  fn direction_strings() {
    assert_eq!(Direction::In.to_string(), "IN");
    assert_eq!(Direction::from_str("OUT").unwrap(), Direction::Out);
  }

  #[test]
  fn groups_by_calendar_date_and_orders() {
    let grouped = group_by_date(vec![
      event("2025-01-10 18:00:00"),
      event("2025-01-11 08:59:00"),
      event("2025-01-10 09:00:00"),
      event("2025-01-10 13:00:00"),
    ]);
    assert_eq!(grouped.len(), 2);

    let day = &grouped[&NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()];
    assert_eq!(day.len(), 3);
    assert_eq!(
      day.first().unwrap().timestamp.to_string(),
      "2025-01-10 09:00:00"
    );
    assert_eq!(
      day.last().unwrap().timestamp.to_string(),
      "2025-01-10 18:00:00"
    );
  }

  #[test]
  fn late_night_punch_stays_on_its_calendar_date() {
    let grouped = group_by_date(vec![
      event("2025-01-10 23:59:59"),
      event("2025-01-11 00:00:01"),
    ]);
    assert_eq!(grouped.len(), 2);
    assert!(grouped.values().all(|d| d.len() == 1));
  }
}
