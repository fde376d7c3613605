//! Regularization requests and their approval workflow.
//!
//! The workflow is a closed transition table. Any `(state, action)` pair not
//! listed is rejected; nothing is applied on a rejected transition.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  attendance::AttendanceStatus,
  clock::parse_timestamp,
};

// ─── Time input ──────────────────────────────────────────────────────────────

/// A proposed in/out time in any of the shapes a request may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TimeInput {
  /// A bare time of day, combined with the request date.
  TimeOfDay(NaiveTime),
  /// Seconds since midnight of the request date.
  SinceMidnight(i64),
  /// A full timestamp; used as is.
  Timestamp(NaiveDateTime),
}

impl TimeInput {
  /// Parse `HH:MM[:SS]`, `YYYY-MM-DD HH:MM:SS`, or a number of seconds.
  pub fn parse(s: &str) -> Result<Self> {
    let s = s.trim();
    if let Ok(ts) = parse_timestamp(s) {
      return Ok(Self::Timestamp(ts));
    }
    if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S")
      .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
    {
      return Ok(Self::TimeOfDay(t));
    }
    match s.parse::<i64>() {
      Ok(secs) if secs >= 0 => Ok(Self::SinceMidnight(secs)),
      _ => Err(Error::InvalidTime(s.to_owned())),
    }
  }

  /// The full timestamp this input denotes on `date`.
  pub fn resolve(&self, date: NaiveDate) -> Result<NaiveDateTime> {
    match *self {
      Self::TimeOfDay(t) => Ok(date.and_time(t)),
      Self::SinceMidnight(secs) => TimeDelta::try_seconds(secs)
        .and_then(|d| date.and_time(NaiveTime::MIN).checked_add_signed(d))
        .ok_or_else(|| Error::InvalidTime(secs.to_string())),
      Self::Timestamp(ts) => Ok(ts),
    }
  }
}

// ─── Workflow ────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::EnumIter,
)]
pub enum WorkflowState {
  #[default]
  Draft,
  #[strum(serialize = "Pending Manager Approval")]
  PendingManagerApproval,
  #[strum(serialize = "Manager Approved")]
  ManagerApproved,
  #[strum(serialize = "Rejected By Manager")]
  RejectedByManager,
  #[strum(serialize = "Pending For HR Approval")]
  PendingHrApproval,
  #[strum(serialize = "Approved By HR")]
  ApprovedByHr,
  #[strum(serialize = "Rejected By HR")]
  RejectedByHr,
  Canceled,
}

impl WorkflowState {
  /// The state whose entry applies the correction to attendance.
  pub fn is_final_approval(self) -> bool { self == Self::ApprovedByHr }

  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      Self::RejectedByManager | Self::RejectedByHr | Self::Canceled
    )
  }
}

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
  strum::EnumIter,
)]
pub enum WorkflowAction {
  #[strum(serialize = "Submit To Manager")]
  SubmitToManager,
  #[strum(serialize = "Manager Approve")]
  ManagerApprove,
  #[strum(serialize = "Manager Reject")]
  ManagerReject,
  #[strum(serialize = "Submit To HR")]
  SubmitToHr,
  #[strum(serialize = "HR Approve")]
  HrApprove,
  #[strum(serialize = "HR Reject")]
  HrReject,
  Cancel,
}

/// `(from, action, to)`.
pub const TRANSITIONS: &[(WorkflowState, WorkflowAction, WorkflowState)] = &[
  (WorkflowState::Draft,                  WorkflowAction::SubmitToManager, WorkflowState::PendingManagerApproval),
  (WorkflowState::PendingManagerApproval, WorkflowAction::ManagerApprove,  WorkflowState::ManagerApproved),
  (WorkflowState::PendingManagerApproval, WorkflowAction::ManagerReject,   WorkflowState::RejectedByManager),
  (WorkflowState::ManagerApproved,        WorkflowAction::SubmitToHr,      WorkflowState::PendingHrApproval),
  (WorkflowState::PendingHrApproval,      WorkflowAction::HrApprove,       WorkflowState::ApprovedByHr),
  (WorkflowState::PendingHrApproval,      WorkflowAction::HrReject,        WorkflowState::RejectedByHr),
  (WorkflowState::ApprovedByHr,           WorkflowAction::Cancel,          WorkflowState::Canceled),
];

pub fn next_state(
  state: WorkflowState,
  action: WorkflowAction,
) -> Result<WorkflowState> {
  TRANSITIONS
    .iter()
    .find(|(from, a, _)| *from == state && *a == action)
    .map(|(_, _, to)| *to)
    .ok_or(Error::InvalidTransition { state, action })
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// A human-submitted correction for one employee-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularizationRequest {
  pub request_id:        Uuid,
  pub employee_id:       String,
  pub attendance_date:   NaiveDate,
  pub in_time:           Option<TimeInput>,
  pub out_time:          Option<TimeInput>,
  pub reason:            Option<String>,
  pub workflow_state:    WorkflowState,
  /// Status written to the attendance record on approval.
  pub attendance_status: AttendanceStatus,
}

impl RegularizationRequest {
  pub fn new(
    employee_id: impl Into<String>,
    attendance_date: NaiveDate,
    in_time: Option<TimeInput>,
    out_time: Option<TimeInput>,
  ) -> Self {
    Self {
      request_id: Uuid::new_v4(),
      employee_id: employee_id.into(),
      attendance_date,
      in_time,
      out_time,
      reason: None,
      workflow_state: WorkflowState::Draft,
      attendance_status: AttendanceStatus::Present,
    }
  }

  /// Both times resolved against the request date; fails unless both are
  /// present, fall on the request date, and in precedes out.
  pub fn resolved_times(&self) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let (Some(in_time), Some(out_time)) = (self.in_time, self.out_time) else {
      return Err(Error::InvalidRequest(
        "both in_time and out_time are required".into(),
      ));
    };
    let in_ts = in_time.resolve(self.attendance_date)?;
    let out_ts = out_time.resolve(self.attendance_date)?;
    for ts in [in_ts, out_ts] {
      if ts.date() != self.attendance_date {
        return Err(Error::InvalidRequest(format!(
          "{ts} is not on the requested date {}",
          self.attendance_date
        )));
      }
    }
    if in_ts >= out_ts {
      return Err(Error::InvalidRequest(format!(
        "in_time {in_ts} must be before out_time {out_ts}"
      )));
    }
    Ok((in_ts, out_ts))
  }

  pub fn next_state(&self, action: WorkflowAction) -> Result<WorkflowState> {
    next_state(self.workflow_state, action)
  }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  fn day() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 1, 5).unwrap() }

  #[test]
  fn time_input_shapes() {
    let at_915 = day().and_hms_opt(9, 15, 0).unwrap();
    for raw in ["09:15", "09:15:00", "33300", "2025-01-05 09:15:00"] {
      let input = TimeInput::parse(raw).unwrap();
      assert_eq!(input.resolve(day()).unwrap(), at_915, "input {raw}");
    }
    assert!(TimeInput::parse("quarter past nine").is_err());
    assert!(TimeInput::parse("-5").is_err());
  }

  #[test]
  fn full_timestamp_keeps_its_own_date() {
    let input = TimeInput::parse("2025-01-06 01:00:00").unwrap();
    assert_eq!(
      input.resolve(day()).unwrap(),
      day().succ_opt().unwrap().and_hms_opt(1, 0, 0).unwrap()
    );
  }

  #[test]
  fn request_times_must_stay_on_the_request_date() {
    let mut req = RegularizationRequest::new(
      "EMP1",
      day(),
      Some(TimeInput::parse("22:00").unwrap()),
      Some(TimeInput::parse("2025-01-06 06:00:00").unwrap()),
    );
    assert!(matches!(req.resolved_times(), Err(Error::InvalidRequest(_))));

    req.out_time = Some(TimeInput::SinceMidnight(86_400 + 3_600));
    assert!(matches!(req.resolved_times(), Err(Error::InvalidRequest(_))));

    req.in_time = Some(TimeInput::parse("2025-01-04 22:00:00").unwrap());
    req.out_time = Some(TimeInput::parse("06:00").unwrap());
    assert!(matches!(req.resolved_times(), Err(Error::InvalidRequest(_))));

    req.in_time = Some(TimeInput::parse("2025-01-05 22:00:00").unwrap());
    req.out_time = Some(TimeInput::parse("23:30").unwrap());
    assert_eq!(
      req.resolved_times().unwrap(),
      (
        day().and_hms_opt(22, 0, 0).unwrap(),
        day().and_hms_opt(23, 30, 0).unwrap()
      )
    );
  }

  #[test]
  fn request_requires_both_times_in_order() {
    let mut req = RegularizationRequest::new(
      "EMP1",
      day(),
      Some(TimeInput::parse("09:15").unwrap()),
      None,
    );
    assert!(matches!(req.resolved_times(), Err(Error::InvalidRequest(_))));

    req.out_time = Some(TimeInput::parse("09:15").unwrap());
    assert!(matches!(req.resolved_times(), Err(Error::InvalidRequest(_))));

    req.out_time = Some(TimeInput::parse("18:10").unwrap());
    let (i, o) = req.resolved_times().unwrap();
    assert!(i < o);
  }

  #[test]
  fn happy_path_reaches_final_approval() {
    use WorkflowAction::*;
    let mut state = WorkflowState::Draft;
    for action in [SubmitToManager, ManagerApprove, SubmitToHr, HrApprove] {
      state = next_state(state, action).unwrap();
    }
    assert!(state.is_final_approval());
    assert_eq!(next_state(state, Cancel).unwrap(), WorkflowState::Canceled);
  }

  #[test]
  fn unknown_transitions_are_rejected() {
    for state in WorkflowState::iter() {
      for action in WorkflowAction::iter() {
        let listed = TRANSITIONS
          .iter()
          .any(|(from, a, _)| *from == state && *a == action);
        assert_eq!(next_state(state, action).is_ok(), listed);
      }
    }
    assert!(matches!(
      next_state(WorkflowState::Draft, WorkflowAction::HrApprove),
      Err(Error::InvalidTransition { .. })
    ));
  }

  #[test]
  fn terminal_states_have_no_outgoing_transitions() {
    for state in WorkflowState::iter().filter(|s| s.is_terminal()) {
      assert!(TRANSITIONS.iter().all(|(from, _, _)| *from != state));
    }
  }

  #[test]
  fn state_names_roundtrip() {
    assert_eq!(
      WorkflowState::PendingHrApproval.to_string(),
      "Pending For HR Approval"
    );
    assert_eq!(
      WorkflowState::from_str("Approved By HR").unwrap(),
      WorkflowState::ApprovedByHr
    );
  }
}
