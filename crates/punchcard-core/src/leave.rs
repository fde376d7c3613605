//! Leave applications and holiday lists: the calendar context of a day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The leave-derived status of a day, before any punches are considered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
  HalfDay,
  OnLeave,
}

/// An approved leave application covering a specific date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedLeave {
  pub leave_application: String,
  pub leave_type:        String,
  pub half_day:          bool,
}

impl ApprovedLeave {
  pub fn status(&self) -> LeaveStatus {
    if self.half_day {
      LeaveStatus::HalfDay
    } else {
      LeaveStatus::OnLeave
    }
  }
}

/// A leave application as kept by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveApplication {
  pub leave_application: String,
  pub employee_id:       String,
  pub leave_type:        String,
  pub from_date:         NaiveDate,
  pub to_date:           NaiveDate,
  #[serde(default)]
  pub half_day:          bool,
  #[serde(default)]
  pub approved:          bool,
}

impl LeaveApplication {
  pub fn covers(&self, date: NaiveDate) -> bool {
    self.from_date <= date && date <= self.to_date
  }

  pub fn as_approved(&self) -> ApprovedLeave {
    ApprovedLeave {
      leave_application: self.leave_application.clone(),
      leave_type:        self.leave_type.clone(),
      half_day:          self.half_day,
    }
  }
}

/// One dated entry of a named holiday list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
  pub holiday_list: String,
  pub holiday_date: NaiveDate,
  pub description:  Option<String>,
}
