//! Error types for the review loop.
//!
//! - [CollaboratorError]: an external service failed or returned malformed output.
//! - [StateError]: a seed or merge violated a [DesignState](crate::types::DesignState) invariant.
//! - [StepError]: a step executor could not produce its update.
//! - [GraphError]: the workflow graph is wired incorrectly (detected at build time).
//! - [RunError]: the run was aborted; carries the partial state for diagnostics.

use std::time::Duration;

use thiserror::Error;

use crate::types::DesignState;

/// Failure of an external collaborator call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollaboratorError {
  #[error("{collaborator} unavailable: {message}")]
  Unavailable {
    collaborator: String,
    message: String,
  },
  #[error("{collaborator} returned malformed output: {message}")]
  Malformed {
    collaborator: String,
    message: String,
  },
}

impl CollaboratorError {
  pub fn unavailable(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Unavailable {
      collaborator: collaborator.into(),
      message: message.into(),
    }
  }

  pub fn malformed(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Malformed {
      collaborator: collaborator.into(),
      message: message.into(),
    }
  }

  /// Name of the collaborator that failed.
  pub fn collaborator(&self) -> &str {
    match self {
      Self::Unavailable { collaborator, .. } | Self::Malformed { collaborator, .. } => collaborator,
    }
  }
}

/// Violation of a state invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
  #[error("request must not be empty")]
  EmptyRequest,
  #[error("retrieved rules must not be empty")]
  EmptyRules,
  #[error("iteration_count cannot decrease from {current} to {proposed}")]
  IterationRegressed { current: u32, proposed: u32 },
}

/// Failure raised by a step executor.
#[derive(Debug, Error)]
pub enum StepError {
  #[error("{step}: {source}")]
  Collaborator {
    step: String,
    #[source]
    source: CollaboratorError,
  },
  #[error("{step} requires `{field}` but it is not set")]
  MissingInput { step: String, field: &'static str },
  #[error("approval not received within {0:?}")]
  ApprovalTimedOut(Duration),
  #[error("cancelled while {0} was waiting")]
  Cancelled(String),
}

impl StepError {
  pub(crate) fn collaborator(step: &str, source: CollaboratorError) -> Self {
    Self::Collaborator {
      step: step.to_string(),
      source,
    }
  }

  pub(crate) fn missing(step: &str, field: &'static str) -> Self {
    Self::MissingInput {
      step: step.to_string(),
      field,
    }
  }
}

/// Wiring fault detected while building a workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
  #[error("graph has no entry step")]
  MissingEntry,
  #[error("entry step `{0}` is not registered")]
  UnknownEntry(String),
  #[error("step `{0}` is registered twice")]
  DuplicateStep(String),
  #[error("edge {from} -> {to} references an unregistered step")]
  UnknownStep { from: String, to: String },
  #[error("step `{0}` has no outgoing edge")]
  NoOutgoing(String),
  #[error("step `{0}` has more than one outgoing rule")]
  AmbiguousOutgoing(String),
  #[error("route `{label}` of `{step}` targets unregistered step `{target}`")]
  UnknownRouteTarget {
    step: String,
    label: String,
    target: String,
  },
}

/// Reason a run stopped without reaching a terminal step.
///
/// Every variant except [RunError::InvalidSeed] carries the state accumulated so far.
#[derive(Debug, Error)]
pub enum RunError {
  #[error("invalid seed: {0}")]
  InvalidSeed(StateError),
  #[error("step `{step}` failed: {source}")]
  Step {
    step: String,
    #[source]
    source: StepError,
    partial: Box<DesignState>,
  },
  #[error("configuration fault at `{step}`: {message}")]
  Configuration {
    step: String,
    message: String,
    partial: Box<DesignState>,
  },
  #[error("run cancelled before `{next}`")]
  Cancelled {
    next: String,
    partial: Box<DesignState>,
  },
  #[error("`{step}` degraded: {message}")]
  Degraded {
    step: String,
    message: String,
    partial: Box<DesignState>,
  },
  #[error("transition limit of {limit} exceeded")]
  TransitionLimit {
    limit: u32,
    partial: Box<DesignState>,
  },
}

impl RunError {
  /// State accumulated before the run aborted.
  pub fn partial_state(&self) -> Option<&DesignState> {
    match self {
      RunError::InvalidSeed(_) => None,
      RunError::Step { partial, .. }
      | RunError::Configuration { partial, .. }
      | RunError::Cancelled { partial, .. }
      | RunError::Degraded { partial, .. }
      | RunError::TransitionLimit { partial, .. } => Some(partial),
    }
  }
}
