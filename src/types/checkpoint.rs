//! Checkpoint for resumable execution.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{DesignState, Target};

/// Snapshot taken after a transition: enough to restart the run at `next`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
  pub run_id: Uuid,
  pub state: DesignState,
  pub next: Target,
  pub completed_steps: Vec<String>,
}

impl Checkpoint {
  /// True if the run had already reached the terminal marker.
  pub fn is_finished(&self) -> bool {
    self.next.is_end()
  }
}
