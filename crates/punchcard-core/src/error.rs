//! Error types for `punchcard-core`.

use thiserror::Error;

use crate::regularization::{WorkflowAction, WorkflowState};

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid timestamp: {0:?}")]
  InvalidTimestamp(String),

  #[error("invalid time of day: {0:?}")]
  InvalidTime(String),

  #[error("unknown attendance status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown document status: {0}")]
  UnknownDocStatus(i64),

  #[error("unknown check-in direction: {0:?}")]
  UnknownDirection(String),

  #[error("unknown workflow state: {0:?}")]
  UnknownWorkflowState(String),

  #[error("unknown workflow action: {0:?}")]
  UnknownWorkflowAction(String),

  #[error("action {action} is not allowed from state {state}")]
  InvalidTransition {
    state:  WorkflowState,
    action: WorkflowAction,
  },

  #[error("invalid regularization request: {0}")]
  InvalidRequest(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
