//! Attendance settings, loaded once per run and passed by value.

use serde::{Deserialize, Serialize};

/// Tunables for reconciliation, auto-submission and regularization.
///
/// Every field has a default; a missing settings source yields
/// [`AttendanceSettings::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceSettings {
  pub enable_regularization:       bool,
  /// Hours after the start of the attendance date before a request may be
  /// raised.
  pub regularization_from_hours:   f64,
  /// Hours after which the regularization window closes. Also the second
  /// auto-submission trigger, measured from shift end.
  pub regularization_to_hours:     f64,
  pub max_requests_per_month:      u32,
  /// Below this a day with punches is a half day.
  pub min_working_hours:           f64,
  pub checkin_grace_start_minutes: i64,
  pub checkout_grace_end_minutes:  i64,
}

impl Default for AttendanceSettings {
  fn default() -> Self {
    Self {
      enable_regularization:       false,
      regularization_from_hours:   0.0,
      regularization_to_hours:     24.0,
      max_requests_per_month:      3,
      min_working_hours:           4.0,
      checkin_grace_start_minutes: 0,
      checkout_grace_end_minutes:  0,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_source_falls_back_per_field() {
    let s: AttendanceSettings = serde_json::from_str(
      r#"{"enable_regularization": true, "min_working_hours": 6}"#,
    )
    .unwrap();
    assert!(s.enable_regularization);
    assert_eq!(s.min_working_hours, 6.0);
    assert_eq!(s.regularization_to_hours, 24.0);
    assert_eq!(s.max_requests_per_month, 3);
  }
}
