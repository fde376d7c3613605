//! Auto-submission: finalize open records once their correction window has
//! passed.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use punchcard_core::{
  attendance::{
    AttendanceRecord, DocStatus, decide_status, status_without_punches,
  },
  clock::delta_from_hours,
  shift::ShiftType,
  store::{AttendanceStore, Directory},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Engine, Error, Result, notify::Notification, report::BatchReport};

/// Grace after shift end before a record is always due.
pub const SUBMIT_GRACE_HOURS: i64 = 4;

/// Shift end assumed when neither a shift nor an out time is known.
pub fn default_shift_end() -> NaiveTime {
  NaiveTime::from_hms_opt(18, 30, 0).unwrap_or(NaiveTime::MIN)
}

/// Expected end of the working day for `record`: the shift's end if the
/// shift is known, else the record's own out time, else 18:30.
pub fn expected_shift_end(
  record: &AttendanceRecord,
  shift: Option<&ShiftType>,
) -> NaiveDateTime {
  shift
    .map(|s| s.end_on(record.attendance_date))
    .or(record.out_time)
    .unwrap_or_else(|| record.attendance_date.and_time(default_shift_end()))
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitDecision {
  Submitted(AttendanceRecord),
  /// Neither window has elapsed yet.
  NotDue { shift_end: NaiveDateTime },
  BelowMinimum { working_hours: f64 },
  /// Already submitted or cancelled.
  NotOpen,
}

impl<S, D> Engine<S, D>
where
  S: AttendanceStore,
  D: Directory,
{
  /// Window A (shift end + 4 h) or, with regularization enabled, window B
  /// (shift end + the regularization window). A window whose end is not
  /// representable is never reached.
  pub fn is_due(&self, shift_end: NaiveDateTime, now: NaiveDateTime) -> bool {
    let passed = |window: Option<TimeDelta>| {
      window
        .and_then(|w| shift_end.checked_add_signed(w))
        .is_some_and(|due| now >= due)
    };
    if passed(TimeDelta::try_hours(SUBMIT_GRACE_HOURS)) {
      return true;
    }
    self.settings.enable_regularization
      && passed(delta_from_hours(self.settings.regularization_to_hours))
  }

  /// The shift that governs `record`: its own, else the employee's default.
  async fn shift_for(&self, record: &AttendanceRecord) -> Result<Option<ShiftType>> {
    let name = match &record.shift {
      Some(name) => Some(name.clone()),
      None => self
        .directory
        .get_employee(&record.employee_id)
        .await
        .map_err(Error::directory)?
        .and_then(|e| e.default_shift),
    };
    match name {
      Some(name) => self.directory.get_shift(&name).await.map_err(Error::directory),
      None => Ok(None),
    }
  }

  /// Submit `record` if it is due and has enough hours.
  ///
  /// The status is recomputed with the reconciliation rule first, so a
  /// submitted record always agrees with what reconciliation would derive.
  pub async fn try_submit(
    &self,
    record: &AttendanceRecord,
    now: NaiveDateTime,
  ) -> Result<SubmitDecision> {
    if !record.is_open() {
      return Ok(SubmitDecision::NotOpen);
    }

    let shift = self.shift_for(record).await?;
    let shift_end = expected_shift_end(record, shift.as_ref());
    if !self.is_due(shift_end, now) {
      return Ok(SubmitDecision::NotDue { shift_end });
    }
    if record.working_hours < self.settings.min_working_hours {
      return Ok(SubmitDecision::BelowMinimum {
        working_hours: record.working_hours,
      });
    }

    let leave = self
      .directory
      .approved_leave_covering(&record.employee_id, record.attendance_date)
      .await
      .map_err(Error::directory)?
      .map(|l| l.status());
    let status = if record.in_time.is_some() {
      decide_status(leave, record.working_hours, self.settings.min_working_hours)
    } else {
      status_without_punches(leave)
    };

    let mut current = record.clone();
    if current.status != status {
      debug!(
        attendance_id = %record.attendance_id,
        from = %current.status,
        to = %status,
        "status corrected before submission"
      );
      current.status = status;
      current = self
        .store
        .update_attendance(&current)
        .await
        .map_err(Error::store)?;
    }

    let submitted = self
      .store
      .set_doc_status(current.attendance_id, current.version, DocStatus::Submitted)
      .await
      .map_err(Error::store)?;

    self.notifier.notify(&Notification::AttendanceSubmitted {
      attendance_id:   submitted.attendance_id,
      employee_id:     submitted.employee_id.clone(),
      attendance_date: submitted.attendance_date,
      status:          submitted.status,
      working_hours:   submitted.working_hours,
    });
    Ok(SubmitDecision::Submitted(submitted))
  }

  /// Sweep every open record. Returns the ids submitted by this run.
  pub async fn auto_submit_due(&self, now: NaiveDateTime) -> Result<BatchReport<Uuid>> {
    let open = self
      .store
      .list_open_attendance()
      .await
      .map_err(Error::store)?;
    let report = self.submit_each(&open, now).await;
    info!(
      open = open.len(),
      submitted = report.succeeded.len(),
      failures = report.failed.len(),
      "auto-submit sweep finished"
    );
    Ok(report)
  }

  /// Try to submit specific records, e.g. the ones a reconciliation run
  /// just produced. Ids that no longer exist are skipped.
  pub async fn submit_records(
    &self,
    ids: &[Uuid],
    now: NaiveDateTime,
  ) -> Result<BatchReport<Uuid>> {
    let mut records = Vec::with_capacity(ids.len());
    for id in ids {
      if let Some(r) = self
        .store
        .get_attendance_by_id(*id)
        .await
        .map_err(Error::store)?
      {
        records.push(r);
      }
    }
    Ok(self.submit_each(&records, now).await)
  }

  async fn submit_each(
    &self,
    records: &[AttendanceRecord],
    now: NaiveDateTime,
  ) -> BatchReport<Uuid> {
    let mut report = BatchReport::default();
    for record in records {
      match self.try_submit(record, now).await {
        Ok(SubmitDecision::Submitted(r)) => report.push_ok(r.attendance_id),
        Ok(decision) => debug!(
          attendance_id = %record.attendance_id,
          ?decision,
          "left open"
        ),
        Err(e) => {
          warn!(
            attendance_id = %record.attendance_id,
            employee_id = %record.employee_id,
            error = %e,
            "auto-submit failed"
          );
          report.push_err(
            format!("{}/{}", record.employee_id, record.attendance_date),
            e,
          );
        }
      }
    }
    report
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;
  use punchcard_core::attendance::AttendanceStatus;

  use super::*;

  fn record(out: Option<NaiveDateTime>) -> AttendanceRecord {
    AttendanceRecord {
      attendance_id:     Uuid::nil(),
      employee_id:       "EMP1".into(),
      attendance_date:   NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
      status:            AttendanceStatus::Present,
      in_time:           None,
      out_time:          out,
      working_hours:     0.0,
      shift:             None,
      company:           None,
      leave_type:        None,
      leave_application: None,
      doc_status:        DocStatus::Open,
      version:           1,
    }
  }

  fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, d)
      .unwrap()
      .and_hms_opt(h, m, 0)
      .unwrap()
  }

  #[test]
  fn shift_end_fallbacks() {
    let night = ShiftType {
      name:       "Night".into(),
      start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
      end_time:   NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
    };
    let r = record(Some(at(10, 17, 0)));
    assert_eq!(expected_shift_end(&r, Some(&night)), at(11, 6, 0));
    assert_eq!(expected_shift_end(&r, None), at(10, 17, 0));
    assert_eq!(expected_shift_end(&record(None), None), at(10, 18, 30));
  }
}
