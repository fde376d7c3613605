//! Shift types and the punctuality figures derived from them.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::{attendance::AttendanceRecord, clock::delta_from_hours};

/// A named schedule with an expected start and end time.
///
/// A shift whose end is not after its start runs overnight and ends on the
/// following calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftType {
  pub name:       String,
  pub start_time: NaiveTime,
  pub end_time:   NaiveTime,
}

impl ShiftType {
  pub fn is_overnight(&self) -> bool { self.end_time <= self.start_time }

  pub fn start_on(&self, date: NaiveDate) -> NaiveDateTime {
    date.and_time(self.start_time)
  }

  pub fn end_on(&self, date: NaiveDate) -> NaiveDateTime {
    let end = date.and_time(self.end_time);
    if self.is_overnight() { end + TimeDelta::days(1) } else { end }
  }

  pub fn duration(&self) -> TimeDelta {
    let d = self.end_time - self.start_time;
    if self.is_overnight() { d + TimeDelta::days(1) } else { d }
  }

  /// Early/late arrival and departure against this shift, plus overtime
  /// beyond the shift length.
  pub fn punctuality(&self, record: &AttendanceRecord) -> Punctuality {
    let start = self.start_on(record.attendance_date);
    let end = self.end_on(record.attendance_date);
    let mut p = Punctuality::default();

    if let Some(in_time) = record.in_time {
      if in_time < start {
        p.early_entry = Some(start - in_time);
      } else if in_time > start {
        p.late_entry = Some(in_time - start);
      }
    }

    if let Some(out_time) = record.out_time {
      if out_time < end {
        p.early_going = Some(end - out_time);
      } else if out_time > end {
        p.late_going = Some(out_time - end);
      }
    }

    if let Some(worked) = delta_from_hours(record.working_hours)
      && worked > self.duration()
    {
      p.overtime = Some(worked - self.duration());
    }

    p
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Punctuality {
  pub early_entry: Option<TimeDelta>,
  pub late_entry:  Option<TimeDelta>,
  pub early_going: Option<TimeDelta>,
  pub late_going:  Option<TimeDelta>,
  pub overtime:    Option<TimeDelta>,
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;
  use crate::attendance::{AttendanceStatus, DocStatus};

  fn t(h: u32, m: u32) -> NaiveTime { NaiveTime::from_hms_opt(h, m, 0).unwrap() }

  fn day() -> NaiveDate { NaiveDate::from_ymd_opt(2025, 1, 10).unwrap() }

  fn record(
    in_time: NaiveTime,
    out_time: NaiveTime,
    hours: f64,
  ) -> AttendanceRecord {
    AttendanceRecord {
      attendance_id:     Uuid::nil(),
      employee_id:       "EMP1".into(),
      attendance_date:   day(),
      status:            AttendanceStatus::Present,
      in_time:           Some(day().and_time(in_time)),
      out_time:          Some(day().and_time(out_time)),
      working_hours:     hours,
      shift:             Some("General".into()),
      company:           None,
      leave_type:        None,
      leave_application: None,
      doc_status:        DocStatus::Open,
      version:           1,
    }
  }

  fn general() -> ShiftType {
    ShiftType {
      name:       "General".into(),
      start_time: t(9, 0),
      end_time:   t(18, 0),
    }
  }

  #[test]
  fn overnight_shift_ends_next_day() {
    let night = ShiftType {
      name:       "Night".into(),
      start_time: t(22, 0),
      end_time:   t(6, 0),
    };
    assert!(night.is_overnight());
    assert_eq!(night.end_on(day()), day().succ_opt().unwrap().and_time(t(6, 0)));
    assert_eq!(night.duration(), TimeDelta::hours(8));
  }

  #[test]
  fn late_arrival_and_overtime() {
    let p = general().punctuality(&record(t(9, 20), t(19, 0), 9.666_666));
    assert_eq!(p.late_entry, Some(TimeDelta::minutes(20)));
    assert_eq!(p.early_entry, None);
    assert_eq!(p.late_going, Some(TimeDelta::hours(1)));
    assert!(p.overtime.unwrap() > TimeDelta::minutes(39));
  }

  #[test]
  fn early_leaver_has_no_overtime() {
    let p = general().punctuality(&record(t(8, 45), t(16, 0), 7.25));
    assert_eq!(p.early_entry, Some(TimeDelta::minutes(15)));
    assert_eq!(p.early_going, Some(TimeDelta::hours(2)));
    assert_eq!(p.overtime, None);
  }
}
