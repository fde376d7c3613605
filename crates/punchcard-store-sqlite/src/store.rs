//! [`SqliteStore`]: the SQLite implementation of [`AttendanceStore`] and
//! [`Directory`].

use std::{collections::BTreeSet, path::Path};

use chrono::NaiveDate;
use punchcard_core::{
  attendance::{AttendanceRecord, DocStatus, NewAttendance},
  checkin::{CheckinEvent, NewCheckin},
  employee::Employee,
  leave::{ApprovedLeave, Holiday, LeaveApplication},
  regularization::{RegularizationRequest, WorkflowState},
  shift::ShiftType,
  store::{AttendanceStore, Directory},
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    ATTENDANCE_COLUMNS, CHECKIN_COLUMNS, EMPLOYEE_COLUMNS, RawAttendance,
    RawCheckin, RawRegularization, RawShift, REGULARIZATION_COLUMNS,
    day_bounds, decode_date, employee_from_row, encode_date, encode_time,
    encode_time_input, encode_ts, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Attendance store and employee directory backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// What a guarded write found when it matched no row.
enum Miss {
  Missing,
  Found { version: u32, doc_status: i64 },
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_attendance(
    &self,
    filter: &'static str,
    params: Vec<String>,
  ) -> Result<Vec<AttendanceRecord>> {
    let raws: Vec<RawAttendance> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE {filter} \
           ORDER BY attendance_date, employee_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawAttendance::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAttendance::into_record).collect()
  }

  async fn query_checkins(
    &self,
    filter: &'static str,
    params: Vec<String>,
  ) -> Result<Vec<CheckinEvent>> {
    let raws: Vec<RawCheckin> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {CHECKIN_COLUMNS} FROM checkins WHERE {filter} \
           ORDER BY timestamp"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawCheckin::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawCheckin::into_event).collect()
  }

  async fn miss(&self, attendance_id: Uuid) -> Result<Miss> {
    let id_str = encode_uuid(attendance_id);
    let found: Option<(u32, i64)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT version, doc_status FROM attendance WHERE attendance_id = ?1",
              rusqlite::params![id_str],
              |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(match found {
      None => Miss::Missing,
      Some((version, doc_status)) => Miss::Found { version, doc_status },
    })
  }

  // ── Directory seeding ─────────────────────────────────────────────────

  /// Insert or replace an employee by id.
  pub async fn upsert_employee(&self, employee: &Employee) -> Result<()> {
    let e = employee.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO employees (
             employee_id, employee_name, device_user_id, active,
             default_shift, holiday_list, company, department
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
           ON CONFLICT (employee_id) DO UPDATE SET
             employee_name  = excluded.employee_name,
             device_user_id = excluded.device_user_id,
             active         = excluded.active,
             default_shift  = excluded.default_shift,
             holiday_list   = excluded.holiday_list,
             company        = excluded.company,
             department     = excluded.department",
          rusqlite::params![
            e.employee_id,
            e.employee_name,
            e.device_user_id,
            e.active,
            e.default_shift,
            e.holiday_list,
            e.company,
            e.department,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn upsert_shift(&self, shift: &ShiftType) -> Result<()> {
    let name = shift.name.clone();
    let start = encode_time(shift.start_time);
    let end = encode_time(shift.end_time);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO shift_types (name, start_time, end_time)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (name) DO UPDATE SET
             start_time = excluded.start_time,
             end_time   = excluded.end_time",
          rusqlite::params![name, start, end],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn add_holiday(&self, holiday: &Holiday) -> Result<()> {
    let list = holiday.holiday_list.clone();
    let date = encode_date(holiday.holiday_date);
    let description = holiday.description.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO holidays (holiday_list, holiday_date, description)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![list, date, description],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace a leave application by its name.
  pub async fn record_leave(&self, leave: &LeaveApplication) -> Result<()> {
    let l = leave.clone();
    let from = encode_date(l.from_date);
    let to = encode_date(l.to_date);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO leave_applications (
             leave_application, employee_id, leave_type,
             from_date, to_date, half_day, approved
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            l.leave_application,
            l.employee_id,
            l.leave_type,
            from,
            to,
            l.half_day,
            l.approved,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── AttendanceStore impl ────────────────────────────────────────────────────

impl AttendanceStore for SqliteStore {
  type Error = Error;

  // ── Check-ins ─────────────────────────────────────────────────────────

  async fn record_checkin(&self, input: NewCheckin) -> Result<Option<CheckinEvent>> {
    let event = CheckinEvent {
      checkin_id:    Uuid::new_v4(),
      employee_id:   input.employee_id,
      timestamp:     input.timestamp,
      direction:     input.direction,
      device_id:     input.device_id,
      device_ip:     input.device_ip,
      source:        input.source,
      attendance_id: None,
    };

    let id_str     = encode_uuid(event.checkin_id);
    let employee   = event.employee_id.clone();
    let ts_str     = encode_ts(event.timestamp);
    let direction  = event.direction.to_string();
    let device_id  = event.device_id.clone();
    let device_ip  = event.device_ip.clone();
    let source     = event.source.to_string();

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO checkins (
             checkin_id, employee_id, timestamp, direction,
             device_id, device_ip, source
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            id_str, employee, ts_str, direction, device_id, device_ip, source,
          ],
        )?;
        Ok(n > 0)
      })
      .await?;

    Ok(inserted.then_some(event))
  }

  async fn list_checkins(&self, employee_id: &str) -> Result<Vec<CheckinEvent>> {
    self
      .query_checkins("employee_id = ?1", vec![employee_id.to_owned()])
      .await
  }

  async fn checkins_on(
    &self,
    employee_id: &str,
    date: NaiveDate,
  ) -> Result<Vec<CheckinEvent>> {
    let (lo, hi) = day_bounds(date);
    self
      .query_checkins(
        "employee_id = ?1 AND timestamp >= ?2 AND timestamp < ?3",
        vec![employee_id.to_owned(), lo, hi],
      )
      .await
  }

  async fn update_checkin(&self, event: &CheckinEvent) -> Result<()> {
    let id_str     = encode_uuid(event.checkin_id);
    let direction  = event.direction.to_string();
    let attendance = event.attendance_id.map(encode_uuid);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE checkins SET direction = ?2, attendance_id = ?3
           WHERE checkin_id = ?1",
          rusqlite::params![id_str, direction, attendance],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_checkin(&self, checkin_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(checkin_id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM checkins WHERE checkin_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;
    Ok(n > 0)
  }

  // ── Attendance ────────────────────────────────────────────────────────

  async fn get_attendance(
    &self,
    employee_id: &str,
    date: NaiveDate,
  ) -> Result<Option<AttendanceRecord>> {
    let mut found = self
      .query_attendance(
        "employee_id = ?1 AND attendance_date = ?2",
        vec![employee_id.to_owned(), encode_date(date)],
      )
      .await?;
    Ok(found.pop())
  }

  async fn get_attendance_by_id(
    &self,
    attendance_id: Uuid,
  ) -> Result<Option<AttendanceRecord>> {
    let mut found = self
      .query_attendance("attendance_id = ?1", vec![encode_uuid(attendance_id)])
      .await?;
    Ok(found.pop())
  }

  async fn list_attendance(&self, employee_id: &str) -> Result<Vec<AttendanceRecord>> {
    self
      .query_attendance("employee_id = ?1", vec![employee_id.to_owned()])
      .await
  }

  async fn list_open_attendance(&self) -> Result<Vec<AttendanceRecord>> {
    self
      .query_attendance("doc_status = 0", Vec::new())
      .await
  }

  async fn insert_attendance(&self, input: NewAttendance) -> Result<AttendanceRecord> {
    let o = input.outcome;
    let record = AttendanceRecord {
      attendance_id:     Uuid::new_v4(),
      employee_id:       input.employee_id,
      attendance_date:   input.attendance_date,
      status:            o.status,
      in_time:           o.in_time,
      out_time:          o.out_time,
      working_hours:     o.working_hours,
      shift:             o.shift,
      company:           o.company,
      leave_type:        o.leave_type,
      leave_application: o.leave_application,
      doc_status:        DocStatus::Open,
      version:           1,
    };

    let r = record.clone();
    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO attendance (
             attendance_id, employee_id, attendance_date, status,
             in_time, out_time, working_hours, shift, company,
             leave_type, leave_application, doc_status, version
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            encode_uuid(r.attendance_id),
            r.employee_id,
            encode_date(r.attendance_date),
            r.status.to_string(),
            r.in_time.map(encode_ts),
            r.out_time.map(encode_ts),
            r.working_hours,
            r.shift,
            r.company,
            r.leave_type,
            r.leave_application,
            r.doc_status.code(),
            r.version,
          ],
        )?;
        Ok(n > 0)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateAttendance {
        employee_id: record.employee_id,
        date:        record.attendance_date,
      });
    }
    Ok(record)
  }

  async fn update_attendance(
    &self,
    record: &AttendanceRecord,
  ) -> Result<AttendanceRecord> {
    let r = record.clone();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE attendance SET
             status = ?3, in_time = ?4, out_time = ?5, working_hours = ?6,
             shift = ?7, company = ?8, leave_type = ?9, leave_application = ?10,
             version = version + 1
           WHERE attendance_id = ?1 AND version = ?2 AND doc_status = 0",
          rusqlite::params![
            encode_uuid(r.attendance_id),
            r.version,
            r.status.to_string(),
            r.in_time.map(encode_ts),
            r.out_time.map(encode_ts),
            r.working_hours,
            r.shift,
            r.company,
            r.leave_type,
            r.leave_application,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(match self.miss(record.attendance_id).await? {
        Miss::Missing => Error::AttendanceNotFound(record.attendance_id),
        Miss::Found { version, .. } if version != record.version => {
          Error::StaleAttendance(record.attendance_id)
        }
        Miss::Found { .. } => Error::AttendanceNotOpen(record.attendance_id),
      });
    }

    let mut updated = record.clone();
    updated.version += 1;
    Ok(updated)
  }

  async fn set_doc_status(
    &self,
    attendance_id: Uuid,
    expected_version: u32,
    status: DocStatus,
  ) -> Result<AttendanceRecord> {
    let id_str = encode_uuid(attendance_id);
    let code = status.code();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE attendance SET doc_status = ?3, version = version + 1
           WHERE attendance_id = ?1 AND version = ?2 AND doc_status < ?3",
          rusqlite::params![id_str, expected_version, code],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(match self.miss(attendance_id).await? {
        Miss::Missing => Error::AttendanceNotFound(attendance_id),
        Miss::Found { version, .. } if version != expected_version => {
          Error::StaleAttendance(attendance_id)
        }
        Miss::Found { doc_status, .. } => Error::InvalidDocStatus {
          id:   attendance_id,
          from: DocStatus::from_code(doc_status)?,
          to:   status,
        },
      });
    }

    self
      .get_attendance_by_id(attendance_id)
      .await?
      .ok_or(Error::AttendanceNotFound(attendance_id))
  }

  async fn delete_attendance(&self, attendance_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(attendance_id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM attendance WHERE attendance_id = ?1 AND doc_status != 1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if n > 0 {
      return Ok(true);
    }
    match self.miss(attendance_id).await? {
      Miss::Missing => Ok(false),
      Miss::Found { .. } => Err(Error::SubmittedAttendance(attendance_id)),
    }
  }

  // ── Regularization requests ───────────────────────────────────────────

  async fn save_regularization(&self, request: &RegularizationRequest) -> Result<()> {
    let in_time = request.in_time.as_ref().map(encode_time_input).transpose()?;
    let out_time = request.out_time.as_ref().map(encode_time_input).transpose()?;
    let r = request.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO regularizations (
             request_id, employee_id, attendance_date, in_time, out_time,
             reason, workflow_state, attendance_status
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            encode_uuid(r.request_id),
            r.employee_id,
            encode_date(r.attendance_date),
            in_time,
            out_time,
            r.reason,
            r.workflow_state.to_string(),
            r.attendance_status.to_string(),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_regularization(
    &self,
    request_id: Uuid,
  ) -> Result<Option<RegularizationRequest>> {
    let id_str = encode_uuid(request_id);
    let raw: Option<RawRegularization> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {REGULARIZATION_COLUMNS} FROM regularizations WHERE request_id = ?1"
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawRegularization::from_row)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawRegularization::into_request).transpose()
  }

  async fn count_regularizations(
    &self,
    employee_id: &str,
    from: NaiveDate,
    to: NaiveDate,
    state: WorkflowState,
  ) -> Result<u32> {
    let employee = employee_id.to_owned();
    let from = encode_date(from);
    let to = encode_date(to);
    let state = state.to_string();
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM regularizations
           WHERE employee_id = ?1
             AND attendance_date BETWEEN ?2 AND ?3
             AND workflow_state = ?4",
          rusqlite::params![employee, from, to, state],
          |r| r.get::<_, u32>(0),
        )?)
      })
      .await?;
    Ok(n)
  }
}

// ─── Directory impl ──────────────────────────────────────────────────────────

impl Directory for SqliteStore {
  type Error = Error;

  async fn employee_by_device_user(
    &self,
    device_user_id: &str,
  ) -> Result<Option<Employee>> {
    let user = device_user_id.to_owned();
    let found = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE device_user_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![user], employee_from_row)
            .optional()?,
        )
      })
      .await?;
    Ok(found)
  }

  async fn get_employee(&self, employee_id: &str) -> Result<Option<Employee>> {
    let id = employee_id.to_owned();
    let found = self
      .conn
      .call(move |conn| {
        let sql =
          format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?1");
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id], employee_from_row)
            .optional()?,
        )
      })
      .await?;
    Ok(found)
  }

  async fn list_active_employees(&self) -> Result<Vec<Employee>> {
    let employees = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE active = 1 \
           ORDER BY employee_id"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], employee_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(employees)
  }

  async fn get_shift(&self, name: &str) -> Result<Option<ShiftType>> {
    let name = name.to_owned();
    let raw: Option<RawShift> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT name, start_time, end_time FROM shift_types WHERE name = ?1",
              rusqlite::params![name],
              |row| {
                Ok(RawShift {
                  name:       row.get(0)?,
                  start_time: row.get(1)?,
                  end_time:   row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawShift::into_shift).transpose()
  }

  async fn approved_leave_covering(
    &self,
    employee_id: &str,
    date: NaiveDate,
  ) -> Result<Option<ApprovedLeave>> {
    let id = employee_id.to_owned();
    let date = encode_date(date);
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT leave_application, leave_type, half_day
               FROM leave_applications
               WHERE employee_id = ?1 AND approved = 1
                 AND from_date <= ?2 AND to_date >= ?2
               ORDER BY half_day, leave_application
               LIMIT 1",
              rusqlite::params![id, date],
              |row| {
                Ok(ApprovedLeave {
                  leave_application: row.get(0)?,
                  leave_type:        row.get(1)?,
                  half_day:          row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;
    Ok(found)
  }

  async fn approved_leave_dates(
    &self,
    employee_id: &str,
    until: NaiveDate,
  ) -> Result<Vec<NaiveDate>> {
    let id = employee_id.to_owned();
    let until_s = encode_date(until);
    let spans: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT from_date, to_date FROM leave_applications
           WHERE employee_id = ?1 AND approved = 1 AND from_date <= ?2",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id, until_s], |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut dates = BTreeSet::new();
    for (from, to) in spans {
      let (from, to) = (decode_date(&from)?, decode_date(&to)?);
      let last = to.min(until);
      dates.extend(from.iter_days().take_while(|d| *d <= last));
    }
    Ok(dates.into_iter().collect())
  }

  async fn is_holiday(&self, employee_id: &str, date: NaiveDate) -> Result<bool> {
    let id = employee_id.to_owned();
    let date = encode_date(date);
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM holidays h
               JOIN employees e ON e.holiday_list = h.holiday_list
               WHERE e.employee_id = ?1 AND h.holiday_date = ?2",
              rusqlite::params![id, date],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }
}
