//! Terminal outcome of a run.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::DesignState;

/// How a run that reached the terminal marker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
  /// The critique passed and a final report was produced.
  Completed,
  /// The iteration ceiling was hit without a passing critique; no report.
  Exhausted,
}

impl RunOutcome {
  pub fn of(state: &DesignState) -> Self {
    if state.is_complete() {
      RunOutcome::Completed
    } else {
      RunOutcome::Exhausted
    }
  }
}

impl fmt::Display for RunOutcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunOutcome::Completed => write!(f, "completed"),
      RunOutcome::Exhausted => write!(f, "exhausted"),
    }
  }
}

/// Final result of a run that reached the terminal marker.
#[derive(Debug, Clone)]
pub struct RunResult {
  pub outcome: RunOutcome,
  pub state: DesignState,
  /// Steps executed, in order (including those before a resume).
  pub completed_steps: Vec<String>,
  /// Transitions executed by this invocation.
  pub transitions: u32,
}
