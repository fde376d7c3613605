//! Raw punches as delivered by biometric devices, and their buffered form.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
  Result,
  checkin::Direction,
  clock::{format_timestamp, parse_timestamp},
};

// ─── Subtype ─────────────────────────────────────────────────────────────────

/// The punch kind reported by the device keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchSubtype {
  CheckIn,
  CheckOut,
  BreakOut,
  BreakIn,
  OvertimeStart,
  OvertimeEnd,
  Unknown(u8),
}

impl PunchSubtype {
  pub fn from_code(code: u8) -> Self {
    match code {
      0 => Self::CheckIn,
      1 => Self::CheckOut,
      2 => Self::BreakOut,
      3 => Self::BreakIn,
      4 => Self::OvertimeStart,
      5 => Self::OvertimeEnd,
      other => Self::Unknown(other),
    }
  }

  pub fn code(self) -> u8 {
    match self {
      Self::CheckIn => 0,
      Self::CheckOut => 1,
      Self::BreakOut => 2,
      Self::BreakIn => 3,
      Self::OvertimeStart => 4,
      Self::OvertimeEnd => 5,
      Self::Unknown(code) => code,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::CheckIn => "Check-In",
      Self::CheckOut => "Check-Out",
      Self::BreakOut => "Break-Out",
      Self::BreakIn => "Break-In",
      Self::OvertimeStart => "Overtime Start",
      Self::OvertimeEnd => "Overtime End",
      Self::Unknown(_) => "Unknown",
    }
  }

  /// Provisional direction. Only check-in and overtime-start count as IN;
  /// the reconciliation engine has the final word.
  pub fn direction(self) -> Direction {
    match self {
      Self::CheckIn | Self::OvertimeStart => Direction::In,
      _ => Direction::Out,
    }
  }
}

// ─── RawPunch ────────────────────────────────────────────────────────────────

/// One attendance log entry as read from a device session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPunch {
  /// Device-internal record number.
  pub uid:           u32,
  /// The device-local user id (enrolment number).
  pub user_id:       String,
  pub timestamp:     NaiveDateTime,
  pub status_code:   i32,
  pub punch_subtype: u8,
}

// ─── BufferedPunch ───────────────────────────────────────────────────────────

/// A punch as persisted in the per-device append-only buffer.
///
/// The `(user_id, timestamp)` pair is the deduplication key; the timestamp
/// is kept as a second-precision string so that the key is exact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferedPunch {
  pub uid:              u32,
  pub user_id:          String,
  pub timestamp:        String,
  pub status_code:      i32,
  pub punch_subtype:    u8,
  pub punch_type_label: String,
  pub device_ip:        String,
}

impl BufferedPunch {
  pub fn from_raw(raw: &RawPunch, device_ip: &str) -> Self {
    let subtype = PunchSubtype::from_code(raw.punch_subtype);
    Self {
      uid:              raw.uid,
      user_id:          raw.user_id.clone(),
      timestamp:        format_timestamp(raw.timestamp),
      status_code:      raw.status_code,
      punch_subtype:    raw.punch_subtype,
      punch_type_label: subtype.label().to_owned(),
      device_ip:        device_ip.to_owned(),
    }
  }

  /// The deduplication key.
  pub fn key(&self) -> (&str, &str) { (&self.user_id, &self.timestamp) }

  pub fn parsed_timestamp(&self) -> Result<NaiveDateTime> {
    parse_timestamp(&self.timestamp)
  }

  pub fn subtype(&self) -> PunchSubtype {
    PunchSubtype::from_code(self.punch_subtype)
  }
}
