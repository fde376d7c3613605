//! Employee registry entries.

use serde::{Deserialize, Serialize};

/// An employee as seen by the attendance engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub employee_id:    String,
  #[serde(default)]
  pub employee_name:  Option<String>,
  /// The enrolment number used on the biometric devices.
  #[serde(default)]
  pub device_user_id: Option<String>,
  #[serde(default = "default_active")]
  pub active:         bool,
  /// Name of the employee's default [`crate::shift::ShiftType`].
  #[serde(default)]
  pub default_shift:  Option<String>,
  #[serde(default)]
  pub holiday_list:   Option<String>,
  #[serde(default)]
  pub company:        Option<String>,
  #[serde(default)]
  pub department:     Option<String>,
}

fn default_active() -> bool { true }

impl Employee {
  pub fn new(employee_id: impl Into<String>) -> Self {
    Self {
      employee_id:    employee_id.into(),
      employee_name:  None,
      device_user_id: None,
      active:         true,
      default_shift:  None,
      holiday_list:   None,
      company:        None,
      department:     None,
    }
  }
}
