//! Daily reconciliation: check-ins plus leave and holiday calendars → one
//! attendance record per employee per calendar date.
//!
//! Reconciliation is idempotent. A day whose computed outcome equals the
//! stored record is not written, and check-ins whose direction and link are
//! already right are not touched, so re-running with unchanged inputs
//! performs no mutations.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use punchcard_core::{
  attendance::{
    AttendanceRecord, DayOutcome, NewAttendance, decide_status,
    status_without_punches,
  },
  checkin::{DayPunches, Direction, group_by_date},
  employee::Employee,
  leave::ApprovedLeave,
  store::{AttendanceStore, Directory},
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{Engine, Error, Result, report::BatchReport};

// ─── Results ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayChange {
  Created,
  Updated,
  Unchanged,
  /// A submitted or cancelled record exists; it was left alone.
  Frozen,
  /// Holiday without check-ins; no record is kept for it.
  Holiday,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayResult {
  pub date:   NaiveDate,
  pub change: DayChange,
  pub record: Option<AttendanceRecord>,
}

/// Everything one employee's reconciliation touched.
#[derive(Debug, Clone, Serialize)]
pub struct Reconciliation {
  pub employee_id: String,
  pub days:        Vec<DayResult>,
  pub failed:      Vec<(NaiveDate, String)>,
}

impl Reconciliation {
  /// Ids of the records this run created or updated, for the submitter.
  pub fn touched(&self) -> Vec<Uuid> {
    self
      .days
      .iter()
      .filter(|d| matches!(d.change, DayChange::Created | DayChange::Updated))
      .filter_map(|d| d.record.as_ref().map(|r| r.attendance_id))
      .collect()
  }

  pub fn count(&self, change: DayChange) -> usize {
    self.days.iter().filter(|d| d.change == change).count()
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

impl<S, D> Engine<S, D>
where
  S: AttendanceStore,
  D: Directory,
{
  /// The record fields a day should have, given its punches (if any) and
  /// the leave covering it.
  pub fn day_outcome(
    &self,
    employee: Option<&Employee>,
    day: Option<&DayPunches>,
    leave: Option<&ApprovedLeave>,
  ) -> DayOutcome {
    let leave_status = leave.map(ApprovedLeave::status);
    let (status, in_time, out_time, working_hours) = match day {
      Some(day) if !day.is_empty() => {
        let hours = if day.len() < 2 {
          0.0
        } else {
          self.strategy.working_hours(day)
        };
        (
          decide_status(leave_status, hours, self.settings.min_working_hours),
          day.first().map(|e| e.timestamp),
          (day.len() > 1).then(|| day.last().map(|e| e.timestamp)).flatten(),
          hours,
        )
      }
      _ => (status_without_punches(leave_status), None, None, 0.0),
    };

    DayOutcome {
      status,
      in_time,
      out_time,
      working_hours,
      shift: employee.and_then(|e| e.default_shift.clone()),
      company: employee.and_then(|e| e.company.clone()),
      leave_type: leave.map(|l| l.leave_type.clone()),
      leave_application: leave.map(|l| l.leave_application.clone()),
    }
  }

  /// Reconcile every date on which `employee_id` has check-ins, an open
  /// record or approved leave. Leave days after `today` wait until they
  /// arrive.
  ///
  /// A failure on one date is recorded and the remaining dates still run.
  /// Errors loading the employee's inputs fail the whole call.
  pub async fn reconcile_employee(
    &self,
    employee_id: &str,
    today: NaiveDate,
  ) -> Result<Reconciliation> {
    let employee = self
      .directory
      .get_employee(employee_id)
      .await
      .map_err(Error::directory)?;
    let events = self
      .store
      .list_checkins(employee_id)
      .await
      .map_err(Error::store)?;
    let records = self
      .store
      .list_attendance(employee_id)
      .await
      .map_err(Error::store)?;

    let leave_dates = self
      .directory
      .approved_leave_dates(employee_id, today)
      .await
      .map_err(Error::directory)?;

    let by_date = group_by_date(events);
    let dates: BTreeSet<NaiveDate> = by_date
      .keys()
      .copied()
      .chain(records.iter().filter(|r| r.is_open()).map(|r| r.attendance_date))
      .chain(leave_dates)
      .collect();

    let mut result = Reconciliation {
      employee_id: employee_id.to_owned(),
      days:        Vec::new(),
      failed:      Vec::new(),
    };

    for date in dates {
      let existing = records.iter().find(|r| r.attendance_date == date);
      match self
        .reconcile_day(employee_id, employee.as_ref(), date, by_date.get(&date), existing)
        .await
      {
        Ok(day) => {
          debug!(%employee_id, %date, change = ?day.change, "day reconciled");
          result.days.push(day);
        }
        Err(e) => {
          warn!(%employee_id, %date, error = %e, "day reconciliation failed");
          result.failed.push((date, e.to_string()));
        }
      }
    }

    Ok(result)
  }

  async fn reconcile_day(
    &self,
    employee_id: &str,
    employee: Option<&Employee>,
    date: NaiveDate,
    day: Option<&DayPunches>,
    existing: Option<&AttendanceRecord>,
  ) -> Result<DayResult> {
    let has_punches = day.is_some_and(|d| !d.is_empty());

    if !has_punches
      && self
        .directory
        .is_holiday(employee_id, date)
        .await
        .map_err(Error::directory)?
    {
      return Ok(DayResult {
        date,
        change: DayChange::Holiday,
        record: existing.cloned(),
      });
    }

    if let Some(record) = existing.filter(|r| !r.is_open()) {
      return Ok(DayResult {
        date,
        change: DayChange::Frozen,
        record: Some(record.clone()),
      });
    }

    let leave = self
      .directory
      .approved_leave_covering(employee_id, date)
      .await
      .map_err(Error::directory)?;
    let outcome = self.day_outcome(employee, day, leave.as_ref());

    let (change, record) = match existing {
      Some(record) if record.outcome() == outcome => {
        (DayChange::Unchanged, record.clone())
      }
      Some(record) => {
        let mut next = record.clone();
        next.apply(outcome);
        let saved = self
          .store
          .update_attendance(&next)
          .await
          .map_err(Error::store)?;
        (DayChange::Updated, saved)
      }
      None => {
        let saved = self
          .store
          .insert_attendance(NewAttendance {
            employee_id: employee_id.to_owned(),
            attendance_date: date,
            outcome,
          })
          .await
          .map_err(Error::store)?;
        (DayChange::Created, saved)
      }
    };

    if let Some(day) = day.filter(|d| !d.is_empty()) {
      self.fix_boundaries(day, record.attendance_id).await?;
    }

    Ok(DayResult {
      date,
      change,
      record: Some(record),
    })
  }

  /// Force the day's first check-in to IN and its last to OUT, and link
  /// both to the record. A lone check-in is only the IN boundary.
  async fn fix_boundaries(&self, day: &DayPunches, attendance_id: Uuid) -> Result<()> {
    let mut boundaries = Vec::with_capacity(2);
    if let Some(first) = day.first() {
      boundaries.push((first, Direction::In));
    }
    if day.len() > 1 {
      if let Some(last) = day.last() {
        boundaries.push((last, Direction::Out));
      }
    }

    for (event, direction) in boundaries {
      if event.direction == direction && event.attendance_id == Some(attendance_id) {
        continue;
      }
      let mut fixed = event.clone();
      fixed.direction = direction;
      fixed.attendance_id = Some(attendance_id);
      self
        .store
        .update_checkin(&fixed)
        .await
        .map_err(Error::store)?;
    }
    Ok(())
  }

  /// Reconcile every active employee. One employee's failure does not stop
  /// the sweep.
  pub async fn reconcile_all(&self, today: NaiveDate) -> Result<BatchReport<Reconciliation>> {
    let employees = self
      .directory
      .list_active_employees()
      .await
      .map_err(Error::directory)?;

    let mut report = BatchReport::default();
    for employee in employees {
      match self.reconcile_employee(&employee.employee_id, today).await {
        Ok(rec) => {
          for (date, reason) in &rec.failed {
            report.push_err(format!("{}/{date}", employee.employee_id), reason);
          }
          report.push_ok(rec);
        }
        Err(e) => {
          warn!(employee_id = %employee.employee_id, error = %e, "reconciliation failed");
          report.push_err(employee.employee_id, e);
        }
      }
    }

    info!(
      employees = report.succeeded.len(),
      failures = report.failed.len(),
      "reconciliation sweep finished"
    );
    Ok(report)
  }
}
