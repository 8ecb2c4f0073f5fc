//! DTOs for execution.log.json: log of run transitions for debugging and resume.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DesignState, StateUpdate, StepEvent, Target};

/// Log format version.
pub const EXECUTION_LOG_VERSION: u32 = 1;

/// One recorded transition in the execution log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStepEntry {
  /// 1-based transition index.
  pub step: u32,
  /// Step that was executed.
  pub step_name: String,
  /// Fields the step contributed.
  pub fields: Vec<String>,
  pub update: StateUpdate,
  /// State after the merge.
  pub state_after: DesignState,
  /// Next step selected (END when the run terminated).
  pub next: Target,
  /// completed_steps list after this transition.
  pub completed_steps_after: Vec<String>,
}

impl ExecutionStepEntry {
  /// Builds an entry from a streamed event and the completed steps so far.
  pub fn from_event(event: &StepEvent, completed_steps_after: Vec<String>) -> Self {
    Self {
      step: event.seq,
      step_name: event.step.clone(),
      fields: event.fields.clone(),
      update: event.update.clone(),
      state_after: event.state.clone(),
      next: event.next.clone(),
      completed_steps_after,
    }
  }
}

/// Root structure for execution.log.json.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
  pub version: u32,
  pub run_id: Uuid,
  pub request: String,
  /// ISO 8601 timestamp when the run started.
  pub started_at: String,
  /// ISO 8601 timestamp when the run finished (None while running or after an abort).
  pub finished_at: Option<String>,
  /// "running", "completed", "exhausted", "cancelled" or "error".
  pub final_status: String,
  pub completed_steps: Vec<String>,
  pub steps: Vec<ExecutionStepEntry>,
}

impl ExecutionLog {
  pub fn new(run_id: Uuid, request: impl Into<String>, started_at: impl Into<String>) -> Self {
    Self {
      version: EXECUTION_LOG_VERSION,
      run_id,
      request: request.into(),
      started_at: started_at.into(),
      finished_at: None,
      final_status: "running".to_string(),
      completed_steps: vec![],
      steps: vec![],
    }
  }

  /// Appends the entry for `event` and updates `completed_steps`.
  pub fn record(&mut self, event: &StepEvent) {
    self.completed_steps.push(event.step.clone());
    let entry = ExecutionStepEntry::from_event(event, self.completed_steps.clone());
    self.steps.push(entry);
  }
}
