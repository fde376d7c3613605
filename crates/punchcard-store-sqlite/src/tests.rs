//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use punchcard_core::{
  attendance::{AttendanceStatus, DayOutcome, DocStatus, NewAttendance},
  checkin::{CheckinSource, Direction, NewCheckin},
  employee::Employee,
  leave::{Holiday, LeaveApplication},
  regularization::{RegularizationRequest, TimeInput, WorkflowState},
  shift::ShiftType,
  store::{AttendanceStore, Directory},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2025, 1, d).unwrap() }

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
  date(d).and_hms_opt(h, m, 0).unwrap()
}

fn device_checkin(employee: &str, ts: NaiveDateTime) -> NewCheckin {
  NewCheckin {
    employee_id: employee.into(),
    timestamp:   ts,
    direction:   Direction::Out,
    device_id:   Some("1001".into()),
    device_ip:   Some("10.0.0.5".into()),
    source:      CheckinSource::Device,
  }
}

fn present(in_time: NaiveDateTime, out_time: NaiveDateTime) -> DayOutcome {
  DayOutcome {
    status:            AttendanceStatus::Present,
    in_time:           Some(in_time),
    out_time:          Some(out_time),
    working_hours:     9.0,
    shift:             None,
    company:           None,
    leave_type:        None,
    leave_application: None,
  }
}

fn new_attendance(employee: &str, d: u32) -> NewAttendance {
  NewAttendance {
    employee_id:     employee.into(),
    attendance_date: date(d),
    outcome:         present(at(d, 9, 0), at(d, 18, 0)),
  }
}

// ─── Check-ins ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn record_and_list_checkins_in_order() {
  let s = store().await;
  s.record_checkin(device_checkin("EMP1", at(10, 18, 0)))
    .await
    .unwrap();
  s.record_checkin(device_checkin("EMP1", at(10, 9, 0)))
    .await
    .unwrap();
  s.record_checkin(device_checkin("EMP2", at(10, 9, 5)))
    .await
    .unwrap();

  let events = s.list_checkins("EMP1").await.unwrap();
  assert_eq!(events.len(), 2);
  assert_eq!(events[0].timestamp, at(10, 9, 0));
  assert_eq!(events[1].timestamp, at(10, 18, 0));
  assert_eq!(events[0].device_ip.as_deref(), Some("10.0.0.5"));
  assert_eq!(events[0].source, CheckinSource::Device);
}

#[tokio::test]
async fn duplicate_checkin_is_ignored() {
  let s = store().await;
  let first = s
    .record_checkin(device_checkin("EMP1", at(10, 9, 0)))
    .await
    .unwrap();
  assert!(first.is_some());

  let again = s
    .record_checkin(device_checkin("EMP1", at(10, 9, 0)))
    .await
    .unwrap();
  assert!(again.is_none());
  assert_eq!(s.list_checkins("EMP1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn checkins_on_selects_one_calendar_date() {
  let s = store().await;
  for ts in [at(10, 23, 59), at(11, 0, 0), at(11, 8, 30), at(12, 0, 0)] {
    s.record_checkin(device_checkin("EMP1", ts)).await.unwrap();
  }
  let day = s.checkins_on("EMP1", date(11)).await.unwrap();
  assert_eq!(day.len(), 2);
  assert!(day.iter().all(|e| e.date() == date(11)));
}

#[tokio::test]
async fn update_checkin_rewrites_direction_and_link() {
  let s = store().await;
  let mut event = s
    .record_checkin(device_checkin("EMP1", at(10, 9, 0)))
    .await
    .unwrap()
    .unwrap();
  let record = s.insert_attendance(new_attendance("EMP1", 10)).await.unwrap();

  event.direction = Direction::In;
  event.attendance_id = Some(record.attendance_id);
  s.update_checkin(&event).await.unwrap();

  let stored = &s.list_checkins("EMP1").await.unwrap()[0];
  assert_eq!(stored.direction, Direction::In);
  assert_eq!(stored.attendance_id, Some(record.attendance_id));
}

#[tokio::test]
async fn deleting_attendance_unlinks_checkins() {
  let s = store().await;
  let mut event = s
    .record_checkin(device_checkin("EMP1", at(10, 9, 0)))
    .await
    .unwrap()
    .unwrap();
  let record = s.insert_attendance(new_attendance("EMP1", 10)).await.unwrap();
  event.attendance_id = Some(record.attendance_id);
  s.update_checkin(&event).await.unwrap();

  assert!(s.delete_attendance(record.attendance_id).await.unwrap());
  let stored = &s.list_checkins("EMP1").await.unwrap()[0];
  assert_eq!(stored.attendance_id, None);
}

#[tokio::test]
async fn delete_checkin_reports_presence() {
  let s = store().await;
  let event = s
    .record_checkin(device_checkin("EMP1", at(10, 9, 0)))
    .await
    .unwrap()
    .unwrap();
  assert!(s.delete_checkin(event.checkin_id).await.unwrap());
  assert!(!s.delete_checkin(event.checkin_id).await.unwrap());
}

// ─── Attendance ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_attendance() {
  let s = store().await;
  let record = s.insert_attendance(new_attendance("EMP1", 10)).await.unwrap();
  assert_eq!(record.version, 1);
  assert_eq!(record.doc_status, DocStatus::Open);

  let fetched = s.get_attendance("EMP1", date(10)).await.unwrap().unwrap();
  assert_eq!(fetched, record);
  let by_id = s
    .get_attendance_by_id(record.attendance_id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_id, record);
  assert!(s.get_attendance("EMP1", date(11)).await.unwrap().is_none());
}

#[tokio::test]
async fn second_record_for_same_day_is_rejected() {
  let s = store().await;
  s.insert_attendance(new_attendance("EMP1", 10)).await.unwrap();
  let err = s
    .insert_attendance(new_attendance("EMP1", 10))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicateAttendance { .. }));
}

#[tokio::test]
async fn update_bumps_version_and_detects_stale_writes() {
  let s = store().await;
  let record = s.insert_attendance(new_attendance("EMP1", 10)).await.unwrap();

  let mut edit = record.clone();
  edit.status = AttendanceStatus::HalfDay;
  edit.working_hours = 2.5;
  let updated = s.update_attendance(&edit).await.unwrap();
  assert_eq!(updated.version, 2);

  let stored = s.get_attendance("EMP1", date(10)).await.unwrap().unwrap();
  assert_eq!(stored.status, AttendanceStatus::HalfDay);
  assert_eq!(stored.version, 2);

  // `edit` still carries version 1.
  let err = s.update_attendance(&edit).await.unwrap_err();
  assert!(matches!(err, Error::StaleAttendance(_)));
}

#[tokio::test]
async fn submitted_record_is_frozen() {
  let s = store().await;
  let record = s.insert_attendance(new_attendance("EMP1", 10)).await.unwrap();
  let submitted = s
    .set_doc_status(record.attendance_id, record.version, DocStatus::Submitted)
    .await
    .unwrap();
  assert_eq!(submitted.doc_status, DocStatus::Submitted);
  assert_eq!(submitted.version, 2);

  let mut edit = submitted.clone();
  edit.working_hours = 1.0;
  let err = s.update_attendance(&edit).await.unwrap_err();
  assert!(matches!(err, Error::AttendanceNotOpen(_)));

  let err = s.delete_attendance(record.attendance_id).await.unwrap_err();
  assert!(matches!(err, Error::SubmittedAttendance(_)));

  assert!(s.list_open_attendance().await.unwrap().is_empty());
}

#[tokio::test]
async fn doc_status_never_moves_backwards() {
  let s = store().await;
  let record = s.insert_attendance(new_attendance("EMP1", 10)).await.unwrap();
  let submitted = s
    .set_doc_status(record.attendance_id, 1, DocStatus::Submitted)
    .await
    .unwrap();

  let err = s
    .set_doc_status(record.attendance_id, submitted.version, DocStatus::Submitted)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidDocStatus { .. }));

  let err = s
    .set_doc_status(record.attendance_id, 1, DocStatus::Cancelled)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::StaleAttendance(_)));

  let cancelled = s
    .set_doc_status(record.attendance_id, submitted.version, DocStatus::Cancelled)
    .await
    .unwrap();
  assert_eq!(cancelled.doc_status, DocStatus::Cancelled);
  assert!(s.delete_attendance(record.attendance_id).await.unwrap());
}

#[tokio::test]
async fn missing_record_errors() {
  let s = store().await;
  let id = Uuid::new_v4();
  let err = s
    .set_doc_status(id, 1, DocStatus::Submitted)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AttendanceNotFound(_)));
  assert!(!s.delete_attendance(id).await.unwrap());
}

#[tokio::test]
async fn list_open_spans_employees() {
  let s = store().await;
  s.insert_attendance(new_attendance("EMP1", 10)).await.unwrap();
  s.insert_attendance(new_attendance("EMP2", 10)).await.unwrap();
  let r = s.insert_attendance(new_attendance("EMP1", 11)).await.unwrap();
  s.set_doc_status(r.attendance_id, r.version, DocStatus::Submitted)
    .await
    .unwrap();

  assert_eq!(s.list_open_attendance().await.unwrap().len(), 2);
  assert_eq!(s.list_attendance("EMP1").await.unwrap().len(), 2);
}

// ─── Regularization requests ─────────────────────────────────────────────────

#[tokio::test]
async fn regularization_roundtrip_and_count() {
  let s = store().await;
  let mut req = RegularizationRequest::new(
    "EMP1",
    date(5),
    Some(TimeInput::TimeOfDay(NaiveTime::from_hms_opt(9, 15, 0).unwrap())),
    Some(TimeInput::SinceMidnight(65_400)),
  );
  req.reason = Some("forgot to punch".into());
  s.save_regularization(&req).await.unwrap();

  let fetched = s.get_regularization(req.request_id).await.unwrap().unwrap();
  assert_eq!(fetched, req);

  req.workflow_state = WorkflowState::ApprovedByHr;
  s.save_regularization(&req).await.unwrap();

  let n = s
    .count_regularizations("EMP1", date(1), date(31), WorkflowState::ApprovedByHr)
    .await
    .unwrap();
  assert_eq!(n, 1);
  let n = s
    .count_regularizations("EMP1", date(6), date(31), WorkflowState::ApprovedByHr)
    .await
    .unwrap();
  assert_eq!(n, 0);
}

// ─── Directory ───────────────────────────────────────────────────────────────

async fn seeded() -> SqliteStore {
  let s = store().await;
  s.upsert_shift(&ShiftType {
    name:       "General".into(),
    start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
    end_time:   NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
  })
  .await
  .unwrap();

  let mut emp = Employee::new("EMP1");
  emp.device_user_id = Some("1001".into());
  emp.default_shift = Some("General".into());
  emp.holiday_list = Some("HL-2025".into());
  s.upsert_employee(&emp).await.unwrap();

  let mut gone = Employee::new("EMP9");
  gone.device_user_id = Some("1009".into());
  gone.active = false;
  s.upsert_employee(&gone).await.unwrap();

  s.add_holiday(&Holiday {
    holiday_list: "HL-2025".into(),
    holiday_date: date(12),
    description:  Some("Founders day".into()),
  })
  .await
  .unwrap();
  s
}

#[tokio::test]
async fn employee_lookup_by_device_user() {
  let s = seeded().await;
  let emp = s.employee_by_device_user("1001").await.unwrap().unwrap();
  assert_eq!(emp.employee_id, "EMP1");
  assert!(emp.active);

  let inactive = s.employee_by_device_user("1009").await.unwrap().unwrap();
  assert!(!inactive.active);
  assert!(s.employee_by_device_user("4242").await.unwrap().is_none());

  let active = s.list_active_employees().await.unwrap();
  assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn upsert_employee_replaces_fields() {
  let s = seeded().await;
  let mut emp = s.get_employee("EMP1").await.unwrap().unwrap();
  emp.company = Some("Acme".into());
  s.upsert_employee(&emp).await.unwrap();
  let again = s.get_employee("EMP1").await.unwrap().unwrap();
  assert_eq!(again.company.as_deref(), Some("Acme"));
}

#[tokio::test]
async fn shift_and_holiday_lookup() {
  let s = seeded().await;
  let shift = s.get_shift("General").await.unwrap().unwrap();
  assert_eq!(shift.end_time, NaiveTime::from_hms_opt(18, 0, 0).unwrap());
  assert!(s.get_shift("Night").await.unwrap().is_none());

  assert!(s.is_holiday("EMP1", date(12)).await.unwrap());
  assert!(!s.is_holiday("EMP1", date(13)).await.unwrap());
  // No holiday list, no holidays.
  assert!(!s.is_holiday("EMP9", date(12)).await.unwrap());
}

#[tokio::test]
async fn only_approved_leave_covers_a_date() {
  let s = seeded().await;
  s.record_leave(&LeaveApplication {
    leave_application: "LA-001".into(),
    employee_id:       "EMP1".into(),
    leave_type:        "Casual Leave".into(),
    from_date:         date(11),
    to_date:           date(11),
    half_day:          false,
    approved:          true,
  })
  .await
  .unwrap();
  s.record_leave(&LeaveApplication {
    leave_application: "LA-002".into(),
    employee_id:       "EMP1".into(),
    leave_type:        "Sick Leave".into(),
    from_date:         date(14),
    to_date:           date(16),
    half_day:          false,
    approved:          false,
  })
  .await
  .unwrap();

  let leave = s
    .approved_leave_covering("EMP1", date(11))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(leave.leave_application, "LA-001");
  assert!(!leave.half_day);
  assert!(s.approved_leave_covering("EMP1", date(15)).await.unwrap().is_none());

  s.record_leave(&LeaveApplication {
    leave_application: "LA-003".into(),
    employee_id:       "EMP1".into(),
    leave_type:        "Casual Leave".into(),
    from_date:         date(11),
    to_date:           date(13),
    half_day:          true,
    approved:          true,
  })
  .await
  .unwrap();
  assert_eq!(
    s.approved_leave_dates("EMP1", date(31)).await.unwrap(),
    vec![date(11), date(12), date(13)]
  );
  assert_eq!(
    s.approved_leave_dates("EMP1", date(12)).await.unwrap(),
    vec![date(11), date(12)]
  );
  assert!(s.approved_leave_dates("EMP1", date(10)).await.unwrap().is_empty());
  assert!(s.approved_leave_dates("EMP2", date(31)).await.unwrap().is_empty());
}
