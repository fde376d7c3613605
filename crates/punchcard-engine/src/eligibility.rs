//! Whether an employee-day may be regularized, and why.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use punchcard_core::{
  attendance::AttendanceRecord,
  clock::hours_between,
  settings::AttendanceSettings,
  shift::ShiftType,
};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum MissedPunch {
  Both,
  In,
  Out,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Eligibility {
  pub eligible:     bool,
  pub missed_punch: Option<MissedPunch>,
  pub remarks:      Vec<String>,
}

/// Inputs not held on the record itself.
#[derive(Debug, Clone, Copy)]
pub struct EligibilityContext<'a> {
  pub shift:               Option<&'a ShiftType>,
  pub has_approved_leave:  bool,
  /// Final-approved requests in the month of the attendance date.
  pub approved_this_month: u32,
  pub now:                 NaiveDateTime,
}

pub fn missed_punch(record: Option<&AttendanceRecord>) -> Option<MissedPunch> {
  let (in_time, out_time) = record.map_or((None, None), |r| (r.in_time, r.out_time));
  match (in_time, out_time) {
    (None, None) => Some(MissedPunch::Both),
    (None, Some(_)) => Some(MissedPunch::In),
    (Some(_), None) => Some(MissedPunch::Out),
    (Some(_), Some(_)) => None,
  }
}

/// Check-in before `start + grace_start` or after `end - grace_end`.
/// Without an in time the check always trips; without a shift it never does.
/// A bound pushed past the representable range does not trip.
fn outside_grace(
  record: Option<&AttendanceRecord>,
  date: NaiveDate,
  shift: Option<&ShiftType>,
  settings: &AttendanceSettings,
) -> bool {
  let Some(shift) = shift else { return false };
  let Some(in_time) = record.and_then(|r| r.in_time) else {
    return true;
  };
  let earliest = TimeDelta::try_minutes(settings.checkin_grace_start_minutes)
    .and_then(|grace| shift.start_on(date).checked_add_signed(grace));
  let latest = TimeDelta::try_minutes(settings.checkout_grace_end_minutes)
    .and_then(|grace| shift.end_on(date).checked_sub_signed(grace));
  earliest.is_some_and(|t| in_time < t) || latest.is_some_and(|t| in_time > t)
}

/// Assess one employee-day. The window is measured from midnight at the
/// start of `date`.
pub fn assess_eligibility(
  date: NaiveDate,
  record: Option<&AttendanceRecord>,
  settings: &AttendanceSettings,
  ctx: EligibilityContext<'_>,
) -> Eligibility {
  let missed = missed_punch(record);
  let mut remarks = Vec::new();
  let mut eligible = false;

  if !settings.enable_regularization {
    remarks.push("Regularization Disabled".to_owned());
  }

  if settings.enable_regularization && !ctx.has_approved_leave {
    let hours_passed = hours_between(date.and_time(NaiveTime::MIN), ctx.now);
    let from = settings.regularization_from_hours;
    let to = settings.regularization_to_hours;

    if (from..=to).contains(&hours_passed) {
      let working_hours = record.map_or(0.0, |r| r.working_hours);
      if missed.is_some() {
        eligible = true;
        remarks.push("Eligible: Missing check-in/out".to_owned());
      } else if working_hours > 0.0 && working_hours < settings.min_working_hours {
        eligible = true;
        remarks.push(format!(
          "Eligible: Working hours below {} hours",
          settings.min_working_hours
        ));
      } else if outside_grace(record, date, ctx.shift, settings) {
        eligible = true;
        remarks.push("Eligible: Check-in outside grace window".to_owned());
      }
    } else if hours_passed < from {
      remarks.push(format!("Wait for {from} hours to regularize"));
    } else {
      remarks.push(format!("{to} hours exceeded - not allowed"));
    }

    if ctx.approved_this_month >= settings.max_requests_per_month {
      remarks.push(format!(
        "Monthly limit reached ({})",
        settings.max_requests_per_month
      ));
      eligible = false;
    }
  }

  Eligibility {
    eligible,
    missed_punch: missed,
    remarks,
  }
}

#[cfg(test)]
mod tests {
  use punchcard_core::attendance::{AttendanceStatus, DocStatus};
  use uuid::Uuid;

  use super::*;

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 1, 10).unwrap() }

  fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, d)
      .unwrap()
      .and_hms_opt(h, m, 0)
      .unwrap()
  }

  fn record(
    in_time: Option<NaiveDateTime>,
    out_time: Option<NaiveDateTime>,
    hours: f64,
  ) -> AttendanceRecord {
    AttendanceRecord {
      attendance_id: Uuid::nil(),
      employee_id: "EMP1".into(),
      attendance_date: date(),
      status: AttendanceStatus::Present,
      in_time,
      out_time,
      working_hours: hours,
      shift: Some("General".into()),
      company: None,
      leave_type: None,
      leave_application: None,
      doc_status: DocStatus::Open,
      version: 1,
    }
  }

  fn enabled() -> AttendanceSettings {
    AttendanceSettings {
      enable_regularization: true,
      regularization_from_hours: 24.0,
      regularization_to_hours: 48.0,
      checkin_grace_start_minutes: 60,
      checkout_grace_end_minutes: 30,
      ..AttendanceSettings::default()
    }
  }

  fn general() -> ShiftType {
    ShiftType {
      name:       "General".into(),
      start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
      end_time:   NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
    }
  }

  fn ctx(shift: Option<&ShiftType>, now: NaiveDateTime) -> EligibilityContext<'_> {
    EligibilityContext {
      shift,
      has_approved_leave: false,
      approved_this_month: 0,
      now,
    }
  }

  #[test]
  fn missed_punch_kinds() {
    assert_eq!(missed_punch(None), Some(MissedPunch::Both));
    let only_in = record(Some(at(10, 9, 0)), None, 0.0);
    assert_eq!(missed_punch(Some(&only_in)), Some(MissedPunch::Out));
    let full = record(Some(at(10, 9, 0)), Some(at(10, 18, 0)), 9.0);
    assert_eq!(missed_punch(Some(&full)), None);
  }

  #[test]
  fn disabled_feature_is_never_eligible() {
    let e = assess_eligibility(
      date(),
      None,
      &AttendanceSettings::default(),
      ctx(None, at(11, 12, 0)),
    );
    assert!(!e.eligible);
    assert_eq!(e.remarks, vec!["Regularization Disabled".to_owned()]);
  }

  #[test]
  fn missing_out_inside_window() {
    let r = record(Some(at(10, 9, 0)), None, 0.0);
    let e = assess_eligibility(date(), Some(&r), &enabled(), ctx(None, at(11, 12, 0)));
    assert!(e.eligible);
    assert_eq!(e.missed_punch, Some(MissedPunch::Out));
  }

  #[test]
  fn too_early_and_too_late() {
    let r = record(Some(at(10, 9, 0)), None, 0.0);
    let early = assess_eligibility(date(), Some(&r), &enabled(), ctx(None, at(10, 20, 0)));
    assert!(!early.eligible);
    assert!(early.remarks[0].starts_with("Wait for 24"));

    let late = assess_eligibility(date(), Some(&r), &enabled(), ctx(None, at(13, 0, 0)));
    assert!(!late.eligible);
    assert!(late.remarks[0].contains("exceeded"));
  }

  #[test]
  fn short_day_is_eligible() {
    let r = record(Some(at(10, 9, 0)), Some(at(10, 11, 0)), 2.0);
    let e = assess_eligibility(date(), Some(&r), &enabled(), ctx(None, at(11, 12, 0)));
    assert!(e.eligible);
    assert!(e.remarks[0].contains("below"));
  }

  #[test]
  fn late_check_in_trips_grace_check() {
    let shift = general();
    // 17:45 is after 18:00 minus 30 minutes.
    let r = record(Some(at(10, 17, 45)), Some(at(11, 3, 0)), 9.25);
    let e = assess_eligibility(
      date(),
      Some(&r),
      &enabled(),
      ctx(Some(&shift), at(11, 12, 0)),
    );
    assert!(e.eligible);
  }

  #[test]
  fn unrepresentable_grace_does_not_trip() {
    let shift = general();
    let settings = AttendanceSettings {
      checkin_grace_start_minutes: i64::MAX,
      checkout_grace_end_minutes: 1_000_000_000_000,
      ..enabled()
    };
    let r = record(Some(at(10, 10, 30)), Some(at(10, 18, 0)), 7.5);
    let e = assess_eligibility(
      date(),
      Some(&r),
      &settings,
      ctx(Some(&shift), at(11, 12, 0)),
    );
    assert!(!e.eligible);
  }

  #[test]
  fn complete_day_within_grace_is_not_eligible() {
    let shift = general();
    let r = record(Some(at(10, 10, 30)), Some(at(10, 18, 0)), 7.5);
    let e = assess_eligibility(
      date(),
      Some(&r),
      &enabled(),
      ctx(Some(&shift), at(11, 12, 0)),
    );
    assert!(!e.eligible);
    assert!(e.remarks.is_empty());
  }

  #[test]
  fn leave_and_monthly_cap_block() {
    let mut c = ctx(None, at(11, 12, 0));
    c.has_approved_leave = true;
    assert!(!assess_eligibility(date(), None, &enabled(), c).eligible);

    let mut c = ctx(None, at(11, 12, 0));
    c.approved_this_month = 3;
    let e = assess_eligibility(date(), None, &enabled(), c);
    assert!(!e.eligible);
    assert!(e.remarks.iter().any(|r| r.starts_with("Monthly limit")));
  }
}
