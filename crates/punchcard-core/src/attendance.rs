//! Attendance records: the authoritative daily outcome per employee.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, leave::LeaveStatus};

// ─── Status ──────────────────────────────────────────────────────────────────

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
pub enum AttendanceStatus {
  Present,
  Absent,
  #[serde(rename = "Half Day")]
  #[strum(serialize = "Half Day")]
  HalfDay,
  #[serde(rename = "On Leave")]
  #[strum(serialize = "On Leave")]
  OnLeave,
}

impl From<LeaveStatus> for AttendanceStatus {
  fn from(status: LeaveStatus) -> Self {
    match status {
      LeaveStatus::HalfDay => Self::HalfDay,
      LeaveStatus::OnLeave => Self::OnLeave,
    }
  }
}

/// Status of a day that has punches, in priority order: full leave wins,
/// then half-day leave or short hours, then present.
///
/// Zero hours is never present, whatever the configured minimum.
pub fn decide_status(
  leave: Option<LeaveStatus>,
  working_hours: f64,
  min_working_hours: f64,
) -> AttendanceStatus {
  match leave {
    Some(LeaveStatus::OnLeave) => AttendanceStatus::OnLeave,
    Some(LeaveStatus::HalfDay) => AttendanceStatus::HalfDay,
    None if working_hours <= 0.0 || working_hours < min_working_hours => {
      AttendanceStatus::HalfDay
    }
    None => AttendanceStatus::Present,
  }
}

/// Status of a day without punches.
pub fn status_without_punches(leave: Option<LeaveStatus>) -> AttendanceStatus {
  leave.map_or(AttendanceStatus::Absent, AttendanceStatus::from)
}

// ─── Submission state ────────────────────────────────────────────────────────

/// Document submission state. Transitions are Open → Submitted → Cancelled.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DocStatus {
  #[default]
  Open,
  Submitted,
  Cancelled,
}

impl DocStatus {
  pub fn code(self) -> i64 {
    match self {
      Self::Open => 0,
      Self::Submitted => 1,
      Self::Cancelled => 2,
    }
  }

  pub fn from_code(code: i64) -> Result<Self> {
    match code {
      0 => Ok(Self::Open),
      1 => Ok(Self::Submitted),
      2 => Ok(Self::Cancelled),
      other => Err(Error::UnknownDocStatus(other)),
    }
  }
}

// ─── Record ──────────────────────────────────────────────────────────────────

/// The fields of a record that reconciliation derives. Two outcomes compare
/// equal exactly when re-running reconciliation would change nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayOutcome {
  pub status:            AttendanceStatus,
  pub in_time:           Option<NaiveDateTime>,
  pub out_time:          Option<NaiveDateTime>,
  pub working_hours:     f64,
  pub shift:             Option<String>,
  pub company:           Option<String>,
  pub leave_type:        Option<String>,
  pub leave_application: Option<String>,
}

/// At most one per `(employee_id, attendance_date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
  pub attendance_id:     Uuid,
  pub employee_id:       String,
  pub attendance_date:   NaiveDate,
  pub status:            AttendanceStatus,
  pub in_time:           Option<NaiveDateTime>,
  pub out_time:          Option<NaiveDateTime>,
  pub working_hours:     f64,
  pub shift:             Option<String>,
  pub company:           Option<String>,
  pub leave_type:        Option<String>,
  pub leave_application: Option<String>,
  pub doc_status:        DocStatus,
  /// Bumped by the store on every write; used for compare-and-set updates.
  pub version:           u32,
}

impl AttendanceRecord {
  pub fn is_open(&self) -> bool { self.doc_status == DocStatus::Open }

  pub fn outcome(&self) -> DayOutcome {
    DayOutcome {
      status:            self.status,
      in_time:           self.in_time,
      out_time:          self.out_time,
      working_hours:     self.working_hours,
      shift:             self.shift.clone(),
      company:           self.company.clone(),
      leave_type:        self.leave_type.clone(),
      leave_application: self.leave_application.clone(),
    }
  }

  pub fn apply(&mut self, outcome: DayOutcome) {
    self.status = outcome.status;
    self.in_time = outcome.in_time;
    self.out_time = outcome.out_time;
    self.working_hours = outcome.working_hours;
    self.shift = outcome.shift;
    self.company = outcome.company;
    self.leave_type = outcome.leave_type;
    self.leave_application = outcome.leave_application;
  }
}

/// Input to [`crate::store::AttendanceStore::insert_attendance`]. New records
/// are always open.
#[derive(Debug, Clone)]
pub struct NewAttendance {
  pub employee_id:     String,
  pub attendance_date: NaiveDate,
  pub outcome:         DayOutcome,
}
