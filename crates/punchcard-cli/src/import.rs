//! `punchcard import`: seed the directory from a JSON file.

use std::path::Path;

use anyhow::Context as _;
use punchcard_core::{
  employee::Employee,
  leave::{Holiday, LeaveApplication},
  shift::ShiftType,
};
use punchcard_store_sqlite::SqliteStore;
use serde::Deserialize;

/// Shape of the seed file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
  pub shifts:    Vec<ShiftType>,
  pub employees: Vec<Employee>,
  pub holidays:  Vec<Holiday>,
  pub leaves:    Vec<LeaveApplication>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Imported {
  pub shifts:    usize,
  pub employees: usize,
  pub holidays:  usize,
  pub leaves:    usize,
}

pub fn read_seed(path: &Path) -> anyhow::Result<Seed> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading seed file {}", path.display()))?;
  serde_json::from_str(&raw).context("parsing seed file")
}

/// Upsert everything in `seed`. Shifts go first so employees can name them.
pub async fn apply(store: &SqliteStore, seed: &Seed) -> anyhow::Result<Imported> {
  for shift in &seed.shifts {
    store
      .upsert_shift(shift)
      .await
      .with_context(|| format!("importing shift {}", shift.name))?;
  }
  for employee in &seed.employees {
    store
      .upsert_employee(employee)
      .await
      .with_context(|| format!("importing employee {}", employee.employee_id))?;
  }
  for holiday in &seed.holidays {
    store
      .add_holiday(holiday)
      .await
      .with_context(|| format!("importing holiday {}", holiday.holiday_date))?;
  }
  for leave in &seed.leaves {
    store
      .record_leave(leave)
      .await
      .with_context(|| format!("importing leave {}", leave.leave_application))?;
  }

  Ok(Imported {
    shifts:    seed.shifts.len(),
    employees: seed.employees.len(),
    holidays:  seed.holidays.len(),
    leaves:    seed.leaves.len(),
  })
}
