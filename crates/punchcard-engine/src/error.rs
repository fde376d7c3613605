//! Error types for `punchcard-engine`.

use std::time::Duration;

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] punchcard_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("directory error: {0}")]
  Directory(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("punch buffer error: {0}")]
  Buffer(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("device error: {0}")]
  Device(#[from] DeviceError),

  #[error("regularization request not found: {0}")]
  RequestNotFound(Uuid),

  #[error("regularization is not enabled")]
  RegularizationDisabled,

  #[error("request is in state {0}, not final approval")]
  NotApproved(punchcard_core::regularization::WorkflowState),

  #[error("{employee_id} already has {limit} approved requests this month")]
  MonthlyLimitReached { employee_id: String, limit: u32 },

  #[error("attendance for {employee_id} on {date} is already submitted")]
  AttendanceSubmitted {
    employee_id: String,
    date:        NaiveDate,
  },
}

impl Error {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub(crate) fn directory(
    e: impl std::error::Error + Send + Sync + 'static,
  ) -> Self {
    Self::Directory(Box::new(e))
  }

  pub(crate) fn buffer(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Buffer(Box::new(e))
  }
}

/// Failures talking to a biometric device. Never propagated past the
/// per-device loop.
#[derive(Debug, Error)]
pub enum DeviceError {
  #[error("device {0} is unreachable: {1}")]
  Unreachable(String, String),

  #[error("device {device} timed out after {after:?}")]
  Timeout { device: String, after: Duration },

  #[error("device protocol error: {0}")]
  Protocol(String),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
