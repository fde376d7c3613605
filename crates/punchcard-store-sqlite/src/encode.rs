//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are `YYYY-MM-DD HH:MM:SS`, dates `YYYY-MM-DD`, times of day
//! `HH:MM:SS`. Status enums are stored by their display names; regularization
//! time inputs as compact JSON. UUIDs are hyphenated lowercase strings.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use punchcard_core::{
  attendance::{AttendanceRecord, AttendanceStatus, DocStatus},
  checkin::{CheckinEvent, CheckinSource, Direction},
  clock::{format_timestamp, parse_timestamp},
  employee::Employee,
  regularization::{RegularizationRequest, TimeInput, WorkflowState},
  shift::ShiftType,
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_ts(ts: NaiveDateTime) -> String { format_timestamp(ts) }

pub fn decode_ts(s: &str) -> Result<NaiveDateTime> { Ok(parse_timestamp(s)?) }

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_time(t: NaiveTime) -> String { t.format(TIME_FORMAT).to_string() }

pub fn decode_time(s: &str) -> Result<NaiveTime> {
  NaiveTime::parse_from_str(s, TIME_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

/// Half-open timestamp bounds covering one calendar date.
pub fn day_bounds(d: NaiveDate) -> (String, String) {
  let next = d.succ_opt().unwrap_or(NaiveDate::MAX);
  (
    encode_ts(d.and_time(NaiveTime::MIN)),
    encode_ts(next.and_time(NaiveTime::MIN)),
  )
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_direction(s: &str) -> Result<Direction> {
  s.parse()
    .map_err(|_| punchcard_core::Error::UnknownDirection(s.to_owned()).into())
}

fn decode_source(s: &str) -> Result<CheckinSource> {
  s.parse()
    .map_err(|_| Error::DateParse(format!("unknown check-in source: {s:?}")))
}

fn decode_status(s: &str) -> Result<AttendanceStatus> {
  s.parse()
    .map_err(|_| punchcard_core::Error::UnknownStatus(s.to_owned()).into())
}

fn decode_workflow_state(s: &str) -> Result<WorkflowState> {
  s.parse()
    .map_err(|_| punchcard_core::Error::UnknownWorkflowState(s.to_owned()).into())
}

pub fn encode_time_input(t: &TimeInput) -> Result<String> {
  Ok(serde_json::to_string(t)?)
}

fn decode_time_input(s: &str) -> Result<TimeInput> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const CHECKIN_COLUMNS: &str = "checkin_id, employee_id, timestamp, \
  direction, device_id, device_ip, source, attendance_id";

/// Raw strings read from a `checkins` row.
pub struct RawCheckin {
  pub checkin_id:    String,
  pub employee_id:   String,
  pub timestamp:     String,
  pub direction:     String,
  pub device_id:     Option<String>,
  pub device_ip:     Option<String>,
  pub source:        String,
  pub attendance_id: Option<String>,
}

impl RawCheckin {
  /// Expects the columns in [`CHECKIN_COLUMNS`] order.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      checkin_id:    row.get(0)?,
      employee_id:   row.get(1)?,
      timestamp:     row.get(2)?,
      direction:     row.get(3)?,
      device_id:     row.get(4)?,
      device_ip:     row.get(5)?,
      source:        row.get(6)?,
      attendance_id: row.get(7)?,
    })
  }

  pub fn into_event(self) -> Result<CheckinEvent> {
    Ok(CheckinEvent {
      checkin_id:    decode_uuid(&self.checkin_id)?,
      employee_id:   self.employee_id,
      timestamp:     decode_ts(&self.timestamp)?,
      direction:     decode_direction(&self.direction)?,
      device_id:     self.device_id,
      device_ip:     self.device_ip,
      source:        decode_source(&self.source)?,
      attendance_id: self.attendance_id.as_deref().map(decode_uuid).transpose()?,
    })
  }
}

pub const ATTENDANCE_COLUMNS: &str = "attendance_id, employee_id, \
  attendance_date, status, in_time, out_time, working_hours, shift, company, \
  leave_type, leave_application, doc_status, version";

/// Raw values read from an `attendance` row.
pub struct RawAttendance {
  pub attendance_id:     String,
  pub employee_id:       String,
  pub attendance_date:   String,
  pub status:            String,
  pub in_time:           Option<String>,
  pub out_time:          Option<String>,
  pub working_hours:     f64,
  pub shift:             Option<String>,
  pub company:           Option<String>,
  pub leave_type:        Option<String>,
  pub leave_application: Option<String>,
  pub doc_status:        i64,
  pub version:           u32,
}

impl RawAttendance {
  /// Expects the columns in [`ATTENDANCE_COLUMNS`] order.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attendance_id:     row.get(0)?,
      employee_id:       row.get(1)?,
      attendance_date:   row.get(2)?,
      status:            row.get(3)?,
      in_time:           row.get(4)?,
      out_time:          row.get(5)?,
      working_hours:     row.get(6)?,
      shift:             row.get(7)?,
      company:           row.get(8)?,
      leave_type:        row.get(9)?,
      leave_application: row.get(10)?,
      doc_status:        row.get(11)?,
      version:           row.get(12)?,
    })
  }

  pub fn into_record(self) -> Result<AttendanceRecord> {
    Ok(AttendanceRecord {
      attendance_id:     decode_uuid(&self.attendance_id)?,
      employee_id:       self.employee_id,
      attendance_date:   decode_date(&self.attendance_date)?,
      status:            decode_status(&self.status)?,
      in_time:           self.in_time.as_deref().map(decode_ts).transpose()?,
      out_time:          self.out_time.as_deref().map(decode_ts).transpose()?,
      working_hours:     self.working_hours,
      shift:             self.shift,
      company:           self.company,
      leave_type:        self.leave_type,
      leave_application: self.leave_application,
      doc_status:        DocStatus::from_code(self.doc_status)?,
      version:           self.version,
    })
  }
}

pub const REGULARIZATION_COLUMNS: &str = "request_id, employee_id, \
  attendance_date, in_time, out_time, reason, workflow_state, attendance_status";

/// Raw strings read from a `regularizations` row.
pub struct RawRegularization {
  pub request_id:        String,
  pub employee_id:       String,
  pub attendance_date:   String,
  pub in_time:           Option<String>,
  pub out_time:          Option<String>,
  pub reason:            Option<String>,
  pub workflow_state:    String,
  pub attendance_status: String,
}

impl RawRegularization {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:        row.get(0)?,
      employee_id:       row.get(1)?,
      attendance_date:   row.get(2)?,
      in_time:           row.get(3)?,
      out_time:          row.get(4)?,
      reason:            row.get(5)?,
      workflow_state:    row.get(6)?,
      attendance_status: row.get(7)?,
    })
  }

  pub fn into_request(self) -> Result<RegularizationRequest> {
    Ok(RegularizationRequest {
      request_id:        decode_uuid(&self.request_id)?,
      employee_id:       self.employee_id,
      attendance_date:   decode_date(&self.attendance_date)?,
      in_time:           self.in_time.as_deref().map(decode_time_input).transpose()?,
      out_time:          self.out_time.as_deref().map(decode_time_input).transpose()?,
      reason:            self.reason,
      workflow_state:    decode_workflow_state(&self.workflow_state)?,
      attendance_status: decode_status(&self.attendance_status)?,
    })
  }
}

pub const EMPLOYEE_COLUMNS: &str = "employee_id, employee_name, device_user_id, \
  active, default_shift, holiday_list, company, department";

/// Employee rows need no decoding beyond SQLite's own types.
pub fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
  Ok(Employee {
    employee_id:    row.get(0)?,
    employee_name:  row.get(1)?,
    device_user_id: row.get(2)?,
    active:         row.get(3)?,
    default_shift:  row.get(4)?,
    holiday_list:   row.get(5)?,
    company:        row.get(6)?,
    department:     row.get(7)?,
  })
}

pub struct RawShift {
  pub name:       String,
  pub start_time: String,
  pub end_time:   String,
}

impl RawShift {
  pub fn into_shift(self) -> Result<ShiftType> {
    Ok(ShiftType {
      name:       self.name,
      start_time: decode_time(&self.start_time)?,
      end_time:   decode_time(&self.end_time)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn day_bounds_are_half_open() {
    let d = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
    let (lo, hi) = day_bounds(d);
    assert_eq!(lo, "2025-01-31 00:00:00");
    assert_eq!(hi, "2025-02-01 00:00:00");
  }

  #[test]
  fn time_input_column_roundtrip() {
    let t = TimeInput::SinceMidnight(33_300);
    let s = encode_time_input(&t).unwrap();
    assert_eq!(decode_time_input(&s).unwrap(), t);
  }
}
