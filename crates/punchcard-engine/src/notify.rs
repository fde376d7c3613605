//! Notification hook for irreversible transitions.

use chrono::NaiveDate;
use punchcard_core::attendance::AttendanceStatus;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
  /// An attendance record was finalized.
  AttendanceSubmitted {
    attendance_id:   Uuid,
    employee_id:     String,
    attendance_date: NaiveDate,
    status:          AttendanceStatus,
    working_hours:   f64,
  },
  /// An approved regularization was written to attendance.
  RegularizationApplied {
    request_id:      Uuid,
    employee_id:     String,
    attendance_date: NaiveDate,
  },
  RegularizationCancelled {
    request_id:      Uuid,
    employee_id:     String,
    attendance_date: NaiveDate,
  },
}

pub trait Notifier: Send + Sync {
  fn notify(&self, event: &Notification);
}

/// Emits each notification as a `tracing` event under `punchcard::notify`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  fn notify(&self, event: &Notification) {
    match event {
      Notification::AttendanceSubmitted {
        attendance_id,
        employee_id,
        attendance_date,
        status,
        working_hours,
      } => tracing::info!(
        target: "punchcard::notify",
        %attendance_id,
        %employee_id,
        %attendance_date,
        %status,
        working_hours,
        "attendance submitted"
      ),
      Notification::RegularizationApplied {
        request_id,
        employee_id,
        attendance_date,
      } => tracing::info!(
        target: "punchcard::notify",
        %request_id,
        %employee_id,
        %attendance_date,
        "regularization applied"
      ),
      Notification::RegularizationCancelled {
        request_id,
        employee_id,
        attendance_date,
      } => tracing::info!(
        target: "punchcard::notify",
        %request_id,
        %employee_id,
        %attendance_date,
        "regularization cancelled"
      ),
    }
  }
}
