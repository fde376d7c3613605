//! Collaborator traits: the attendance store, the employee directory and the
//! raw punch buffer.
//!
//! Backends implement these (e.g. `punchcard-store-sqlite`); the engine in
//! `punchcard-engine` depends only on the traits.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  attendance::{AttendanceRecord, DocStatus, NewAttendance},
  checkin::{CheckinEvent, NewCheckin},
  employee::Employee,
  leave::ApprovedLeave,
  punch::BufferedPunch,
  regularization::{RegularizationRequest, WorkflowState},
  shift::ShiftType,
};

// ─── Attendance store ────────────────────────────────────────────────────────

/// Persistent home of check-ins, attendance records and regularization
/// requests.
///
/// Writes to attendance records are compare-and-set on
/// [`AttendanceRecord::version`]: a write against a version that is no
/// longer current fails instead of overwriting another run's result.
pub trait AttendanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Check-ins ─────────────────────────────────────────────────────────

  /// Persist a check-in. Returns `None` if the employee already has one at
  /// the same timestamp.
  fn record_checkin(
    &self,
    input: NewCheckin,
  ) -> impl Future<Output = Result<Option<CheckinEvent>, Self::Error>> + Send + '_;

  /// All check-ins of an employee, ordered by timestamp.
  fn list_checkins<'a>(
    &'a self,
    employee_id: &'a str,
  ) -> impl Future<Output = Result<Vec<CheckinEvent>, Self::Error>> + Send + 'a;

  /// Check-ins of an employee whose timestamp falls on `date`, ordered.
  fn checkins_on<'a>(
    &'a self,
    employee_id: &'a str,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<CheckinEvent>, Self::Error>> + Send + 'a;

  /// Rewrite the direction and attendance link of an existing check-in.
  fn update_checkin<'a>(
    &'a self,
    event: &'a CheckinEvent,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Returns `false` if no such check-in existed.
  fn delete_checkin(
    &self,
    checkin_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Attendance ────────────────────────────────────────────────────────

  fn get_attendance<'a>(
    &'a self,
    employee_id: &'a str,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>>
  + Send
  + 'a;

  fn get_attendance_by_id(
    &self,
    attendance_id: Uuid,
  ) -> impl Future<Output = Result<Option<AttendanceRecord>, Self::Error>>
  + Send
  + '_;

  /// Every record of an employee, in date order.
  fn list_attendance<'a>(
    &'a self,
    employee_id: &'a str,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + 'a;

  /// Every open record across all employees.
  fn list_open_attendance(
    &self,
  ) -> impl Future<Output = Result<Vec<AttendanceRecord>, Self::Error>> + Send + '_;

  /// Create an open record at version 1. Fails if one already exists for
  /// the same employee and date.
  fn insert_attendance(
    &self,
    input: NewAttendance,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  /// Overwrite the derived fields of an open record. `record.version` must
  /// be the stored version; the returned record carries the bumped one.
  fn update_attendance<'a>(
    &'a self,
    record: &'a AttendanceRecord,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + 'a;

  /// Move a record to `status`, guarded by `expected_version`.
  fn set_doc_status(
    &self,
    attendance_id: Uuid,
    expected_version: u32,
    status: DocStatus,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  /// Delete a record that is not submitted. Returns `false` if absent.
  fn delete_attendance(
    &self,
    attendance_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Regularization requests ───────────────────────────────────────────

  /// Insert or replace a request by its id.
  fn save_regularization<'a>(
    &'a self,
    request: &'a RegularizationRequest,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn get_regularization(
    &self,
    request_id: Uuid,
  ) -> impl Future<Output = Result<Option<RegularizationRequest>, Self::Error>>
  + Send
  + '_;

  /// Requests of an employee in `state` whose attendance date lies in
  /// `from..=to`.
  fn count_regularizations<'a>(
    &'a self,
    employee_id: &'a str,
    from: NaiveDate,
    to: NaiveDate,
    state: WorkflowState,
  ) -> impl Future<Output = Result<u32, Self::Error>> + Send + 'a;
}

// ─── Directory ───────────────────────────────────────────────────────────────

/// Employee registry plus the leave and holiday calendars.
pub trait Directory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Resolve a device-local user id. Inactive employees are returned too;
  /// callers check [`Employee::active`].
  fn employee_by_device_user<'a>(
    &'a self,
    device_user_id: &'a str,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + 'a;

  fn get_employee<'a>(
    &'a self,
    employee_id: &'a str,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + 'a;

  fn list_active_employees(
    &self,
  ) -> impl Future<Output = Result<Vec<Employee>, Self::Error>> + Send + '_;

  fn get_shift<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<ShiftType>, Self::Error>> + Send + 'a;

  /// The approved leave application covering `date`, if any.
  fn approved_leave_covering<'a>(
    &'a self,
    employee_id: &'a str,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<ApprovedLeave>, Self::Error>> + Send + 'a;

  /// Every date up to and including `until` covered by one of the
  /// employee's approved leave applications, ascending and without repeats.
  fn approved_leave_dates<'a>(
    &'a self,
    employee_id: &'a str,
    until: NaiveDate,
  ) -> impl Future<Output = Result<Vec<NaiveDate>, Self::Error>> + Send + 'a;

  /// Whether `date` is in the employee's holiday list. Employees without a
  /// list have no holidays.
  fn is_holiday<'a>(
    &'a self,
    employee_id: &'a str,
    date: NaiveDate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;
}

// ─── Punch buffer ────────────────────────────────────────────────────────────

/// Append-only per-device, per-day log of raw punches.
///
/// The buffer stores what it is given; deduplication on
/// [`BufferedPunch::key`] is the caller's job.
pub trait PunchBuffer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn append<'a>(
    &'a self,
    device_ip: &'a str,
    day: NaiveDate,
    punches: &'a [BufferedPunch],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Everything stored for the device and day; empty if nothing was.
  fn load_all<'a>(
    &'a self,
    device_ip: &'a str,
    day: NaiveDate,
  ) -> impl Future<Output = Result<Vec<BufferedPunch>, Self::Error>> + Send + 'a;

  /// Drop every day except `keep`. Returns how many logs were removed.
  fn rotate(
    &self,
    keep: NaiveDate,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
