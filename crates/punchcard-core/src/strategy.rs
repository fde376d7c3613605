//! Working-hours strategies over a day's ordered punches.
//!
//! [`FirstLastStrategy`] yields the span written to attendance records.
//! [`PairedInOutStrategy`] yields the "actual duration" used in reporting,
//! where interior punches are breaks.

use crate::{checkin::DayPunches, clock::hours_between};

pub trait WorkingHoursStrategy: Send + Sync {
  fn name(&self) -> &'static str;

  /// Worked hours for the day; zero for an empty or single-punch day.
  fn working_hours(&self, day: &DayPunches) -> f64;
}

/// Everything between the first and the last punch counts as worked.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstLastStrategy;

impl WorkingHoursStrategy for FirstLastStrategy {
  fn name(&self) -> &'static str { "first-last" }

  fn working_hours(&self, day: &DayPunches) -> f64 {
    match (day.first(), day.last()) {
      (Some(first), Some(last)) => {
        hours_between(first.timestamp, last.timestamp).max(0.0)
      }
      _ => 0.0,
    }
  }
}

/// Punches alternate IN, OUT, IN, OUT…; each complete pair adds its span.
/// A trailing unmatched punch contributes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PairedInOutStrategy;

impl WorkingHoursStrategy for PairedInOutStrategy {
  fn name(&self) -> &'static str { "paired" }

  fn working_hours(&self, day: &DayPunches) -> f64 {
    let times: Vec<_> = day.timestamps().collect();
    times
      .chunks_exact(2)
      .map(|pair| hours_between(pair[0], pair[1]))
      .filter(|h| *h > 0.0)
      .sum()
  }
}
