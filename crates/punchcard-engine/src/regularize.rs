//! Regularization processor: drives requests through the approval workflow
//! and writes approved corrections into check-ins and attendance.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use punchcard_core::{
  attendance::{AttendanceRecord, DayOutcome, DocStatus, NewAttendance},
  checkin::{CheckinEvent, Direction, NewCheckin},
  clock::hours_between,
  regularization::{RegularizationRequest, WorkflowAction, WorkflowState},
  store::{AttendanceStore, Directory},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  Engine, Error, Result,
  eligibility::{Eligibility, EligibilityContext, assess_eligibility},
  notify::Notification,
};

/// First and last day of the month containing `date`.
pub fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
  let first = date.with_day(1).unwrap_or(date);
  let next_month = if first.month() == 12 {
    NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
  } else {
    NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
  };
  let last = next_month.and_then(|d| d.pred_opt()).unwrap_or(date);
  (first, last)
}

/// What a cancellation removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelSummary {
  pub checkins_removed:   usize,
  pub attendance_removed: Option<Uuid>,
}

impl<S, D> Engine<S, D>
where
  S: AttendanceStore,
  D: Directory,
{
  /// Persist a new draft. Requests with missing or inverted times are
  /// rejected here, before they enter the workflow.
  pub async fn create_request(
    &self,
    mut request: RegularizationRequest,
  ) -> Result<RegularizationRequest> {
    request.resolved_times()?;
    request.workflow_state = WorkflowState::Draft;
    self
      .store
      .save_regularization(&request)
      .await
      .map_err(Error::store)?;
    Ok(request)
  }

  pub async fn get_request(&self, request_id: Uuid) -> Result<RegularizationRequest> {
    self
      .store
      .get_regularization(request_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::RequestNotFound(request_id))
  }

  async fn approved_in_month(&self, employee_id: &str, date: NaiveDate) -> Result<u32> {
    let (first, last) = month_bounds(date);
    self
      .store
      .count_regularizations(employee_id, first, last, WorkflowState::ApprovedByHr)
      .await
      .map_err(Error::store)
  }

  /// Apply `action` to a stored request.
  ///
  /// Unlisted transitions fail without side effects. Reaching final
  /// approval applies the correction; cancelling rolls it back.
  pub async fn transition_request(
    &self,
    request_id: Uuid,
    action: WorkflowAction,
  ) -> Result<RegularizationRequest> {
    let mut request = self.get_request(request_id).await?;
    let next = request.next_state(action)?;

    match action {
      WorkflowAction::SubmitToManager => {
        if !self.settings.enable_regularization {
          return Err(Error::RegularizationDisabled);
        }
        request.resolved_times()?;
        let approved = self
          .approved_in_month(&request.employee_id, request.attendance_date)
          .await?;
        if approved >= self.settings.max_requests_per_month {
          return Err(Error::MonthlyLimitReached {
            employee_id: request.employee_id,
            limit:       self.settings.max_requests_per_month,
          });
        }
      }
      WorkflowAction::Cancel => {
        self.apply_cancelled(&mut request).await?;
        return Ok(request);
      }
      _ => {}
    }

    let from = request.workflow_state;
    request.workflow_state = next;
    if next.is_final_approval() {
      self.apply_approved(&request).await?;
    }
    self
      .store
      .save_regularization(&request)
      .await
      .map_err(Error::store)?;

    debug!(%request_id, %from, to = %next, "regularization transitioned");
    Ok(request)
  }

  /// Write an approved correction: IN and OUT check-ins at the requested
  /// times, and a submitted attendance record carrying them.
  pub async fn apply_approved(
    &self,
    request: &RegularizationRequest,
  ) -> Result<AttendanceRecord> {
    if !request.workflow_state.is_final_approval() {
      return Err(Error::NotApproved(request.workflow_state));
    }
    let (in_ts, out_ts) = request.resolved_times()?;
    let employee_id = request.employee_id.as_str();
    let date = request.attendance_date;

    let existing = self
      .store
      .get_attendance(employee_id, date)
      .await
      .map_err(Error::store)?;
    if existing.as_ref().is_some_and(|r| !r.is_open()) {
      return Err(Error::AttendanceSubmitted {
        employee_id: employee_id.to_owned(),
        date,
      });
    }

    let employee = self
      .directory
      .get_employee(employee_id)
      .await
      .map_err(Error::directory)?;

    let in_event = self.upsert_checkin(employee_id, in_ts, Direction::In).await?;
    let out_event = self.upsert_checkin(employee_id, out_ts, Direction::Out).await?;

    let outcome = DayOutcome {
      status:            request.attendance_status,
      in_time:           Some(in_ts),
      out_time:          Some(out_ts),
      working_hours:     hours_between(in_ts, out_ts),
      shift:             employee.as_ref().and_then(|e| e.default_shift.clone()),
      company:           employee.as_ref().and_then(|e| e.company.clone()),
      leave_type:        None,
      leave_application: None,
    };

    let record = match existing {
      Some(mut record) => {
        record.apply(outcome);
        self
          .store
          .update_attendance(&record)
          .await
          .map_err(Error::store)?
      }
      None => self
        .store
        .insert_attendance(NewAttendance {
          employee_id: employee_id.to_owned(),
          attendance_date: date,
          outcome,
        })
        .await
        .map_err(Error::store)?,
    };

    for mut event in [in_event, out_event] {
      event.attendance_id = Some(record.attendance_id);
      self
        .store
        .update_checkin(&event)
        .await
        .map_err(Error::store)?;
    }

    let submitted = self
      .store
      .set_doc_status(record.attendance_id, record.version, DocStatus::Submitted)
      .await
      .map_err(Error::store)?;

    info!(
      request_id = %request.request_id,
      %employee_id,
      %date,
      "regularization applied"
    );
    self.notifier.notify(&Notification::RegularizationApplied {
      request_id:      request.request_id,
      employee_id:     employee_id.to_owned(),
      attendance_date: date,
    });
    Ok(submitted)
  }

  /// The check-in at exactly `ts`, created if missing and with its
  /// direction set.
  async fn upsert_checkin(
    &self,
    employee_id: &str,
    ts: NaiveDateTime,
    direction: Direction,
  ) -> Result<CheckinEvent> {
    loop {
      let found = self
        .store
        .checkins_on(employee_id, ts.date())
        .await
        .map_err(Error::store)?
        .into_iter()
        .find(|e| e.timestamp == ts);

      if let Some(mut event) = found {
        if event.direction != direction {
          event.direction = direction;
          self
            .store
            .update_checkin(&event)
            .await
            .map_err(Error::store)?;
        }
        return Ok(event);
      }

      let input = NewCheckin::regularized(employee_id, ts, direction);
      if let Some(event) = self.store.record_checkin(input).await.map_err(Error::store)? {
        return Ok(event);
      }
      // Lost a race with another writer; read theirs.
    }
  }

  /// Roll back an applied correction and mark the request cancelled.
  ///
  /// Deletes the check-ins at exactly the requested times and the
  /// attendance record whose in/out equal them. A submitted record is
  /// moved to cancelled before it is deleted.
  pub async fn apply_cancelled(
    &self,
    request: &mut RegularizationRequest,
  ) -> Result<CancelSummary> {
    let next = request.next_state(WorkflowAction::Cancel)?;
    let (in_ts, out_ts) = request.resolved_times()?;
    let employee_id = request.employee_id.clone();

    let mut checkins_removed = 0;
    let events = self
      .store
      .checkins_on(&employee_id, request.attendance_date)
      .await
      .map_err(Error::store)?;
    for event in events {
      if (event.timestamp == in_ts || event.timestamp == out_ts)
        && self
          .store
          .delete_checkin(event.checkin_id)
          .await
          .map_err(Error::store)?
      {
        checkins_removed += 1;
      }
    }

    let mut attendance_removed = None;
    let record = self
      .store
      .get_attendance(&employee_id, request.attendance_date)
      .await
      .map_err(Error::store)?;
    if let Some(record) =
      record.filter(|r| r.in_time == Some(in_ts) && r.out_time == Some(out_ts))
    {
      let record = if record.doc_status == DocStatus::Submitted {
        self
          .store
          .set_doc_status(record.attendance_id, record.version, DocStatus::Cancelled)
          .await
          .map_err(Error::store)?
      } else {
        record
      };
      self
        .store
        .delete_attendance(record.attendance_id)
        .await
        .map_err(Error::store)?;
      attendance_removed = Some(record.attendance_id);
    }

    request.workflow_state = next;
    self
      .store
      .save_regularization(request)
      .await
      .map_err(Error::store)?;

    info!(
      request_id = %request.request_id,
      %employee_id,
      checkins_removed,
      "regularization cancelled"
    );
    self.notifier.notify(&Notification::RegularizationCancelled {
      request_id:      request.request_id,
      employee_id,
      attendance_date: request.attendance_date,
    });
    Ok(CancelSummary {
      checkins_removed,
      attendance_removed,
    })
  }

  /// Gather the context for [`assess_eligibility`] from the store and
  /// directory.
  pub async fn regularization_eligibility(
    &self,
    employee_id: &str,
    date: NaiveDate,
    now: NaiveDateTime,
  ) -> Result<Eligibility> {
    let record = self
      .store
      .get_attendance(employee_id, date)
      .await
      .map_err(Error::store)?;

    let shift_name = match record.as_ref().and_then(|r| r.shift.clone()) {
      Some(name) => Some(name),
      None => self
        .directory
        .get_employee(employee_id)
        .await
        .map_err(Error::directory)?
        .and_then(|e| e.default_shift),
    };
    let shift = match shift_name {
      Some(name) => self.directory.get_shift(&name).await.map_err(Error::directory)?,
      None => None,
    };

    let has_approved_leave = self
      .directory
      .approved_leave_covering(employee_id, date)
      .await
      .map_err(Error::directory)?
      .is_some();
    let approved_this_month = self.approved_in_month(employee_id, date).await?;

    Ok(assess_eligibility(
      date,
      record.as_ref(),
      &self.settings,
      EligibilityContext {
        shift: shift.as_ref(),
        has_approved_leave,
        approved_this_month,
        now,
      },
    ))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn month_bounds_cover_whole_month() {
    let d = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    assert_eq!(month_bounds(d(2025, 1, 15)), (d(2025, 1, 1), d(2025, 1, 31)));
    assert_eq!(month_bounds(d(2024, 2, 29)), (d(2024, 2, 1), d(2024, 2, 29)));
    assert_eq!(month_bounds(d(2025, 12, 3)), (d(2025, 12, 1), d(2025, 12, 31)));
  }
}
