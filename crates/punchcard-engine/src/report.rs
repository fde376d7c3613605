//! Per-unit results of batch operations.
//!
//! A sweep over many employees, records or devices never fails as a whole;
//! each unit of work lands in either `succeeded` or `failed`.

use std::fmt::Display;

use serde::Serialize;

/// One unit of work that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
  /// What was being processed, e.g. an employee id or `EMP1/2025-01-10`.
  pub unit:   String,
  pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport<T> {
  pub succeeded: Vec<T>,
  pub failed:    Vec<UnitFailure>,
}

impl<T> Default for BatchReport<T> {
  fn default() -> Self {
    Self {
      succeeded: Vec::new(),
      failed:    Vec::new(),
    }
  }
}

impl<T> BatchReport<T> {
  pub fn push_ok(&mut self, item: T) { self.succeeded.push(item); }

  pub fn push_err(&mut self, unit: impl Into<String>, reason: impl Display) {
    self.failed.push(UnitFailure {
      unit:   unit.into(),
      reason: reason.to_string(),
    });
  }

  pub fn is_clean(&self) -> bool { self.failed.is_empty() }

  /// Fold another report in, keeping order.
  pub fn merge(&mut self, other: BatchReport<T>) {
    self.succeeded.extend(other.succeeded);
    self.failed.extend(other.failed);
  }
}

/// Outcome of a device polling cycle: one line per device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
  pub success: Vec<String>,
  pub errors:  Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn merge_keeps_both_sides() {
    let mut a: BatchReport<u32> = BatchReport::default();
    a.push_ok(1);
    a.push_err("EMP1", "boom");
    let mut b = BatchReport::default();
    b.push_ok(2);
    a.merge(b);
    assert_eq!(a.succeeded, vec![1, 2]);
    assert_eq!(a.failed.len(), 1);
    assert_eq!(a.failed[0].reason, "boom");
    assert!(!a.is_clean());
  }
}
