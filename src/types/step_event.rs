//! Progress event emitted by the orchestrator after each transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DesignState, StateUpdate, Target};

/// One completed transition: which step ran, what it wrote, and where the run goes next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
  /// 1-based position of this transition within the run (continues across resumes).
  pub seq: u32,
  pub step: String,
  /// Names of the fields the step contributed.
  pub fields: Vec<String>,
  pub update: StateUpdate,
  /// State after the merge.
  pub state: DesignState,
  pub next: Target,
  pub at: DateTime<Utc>,
}

impl StepEvent {
  pub fn new(
    seq: u32,
    step: impl Into<String>,
    fields: &[&'static str],
    update: StateUpdate,
    state: DesignState,
    next: Target,
  ) -> Self {
    Self {
      seq,
      step: step.into(),
      fields: fields.iter().map(|f| f.to_string()).collect(),
      update,
      state,
      next,
      at: Utc::now(),
    }
  }
}
