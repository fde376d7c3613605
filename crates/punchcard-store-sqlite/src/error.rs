//! Error type for `punchcard-store-sqlite`.

use chrono::NaiveDate;
use punchcard_core::attendance::DocStatus;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] punchcard_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("attendance for {employee_id} on {date} already exists")]
  DuplicateAttendance {
    employee_id: String,
    date:        NaiveDate,
  },

  /// The record changed since it was read.
  #[error("attendance {0} was modified concurrently")]
  StaleAttendance(Uuid),

  #[error("attendance {0} is not open")]
  AttendanceNotOpen(Uuid),

  #[error("attendance {0} is submitted and cannot be deleted")]
  SubmittedAttendance(Uuid),

  #[error("attendance {id} cannot move from {from:?} to {to:?}")]
  InvalidDocStatus {
    id:   Uuid,
    from: DocStatus,
    to:   DocStatus,
  },

  #[error("attendance not found: {0}")]
  AttendanceNotFound(Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
