//! Routing decisions taken after the approval gate and after the critique.
//!
//! Routers are pure functions of the post-merge state and return a label; the graph maps
//! labels to targets.

use tracing::{debug, instrument};

use crate::types::{Approval, DesignState, PASS_SENTINEL};

/// Propose/critique cycles allowed before the run ends without a report.
pub const DEFAULT_MAX_ITERATIONS: u32 = 3;

pub const ANALYZE: &str = "analyze";
pub const REVISE: &str = "revise";
pub const FINALIZE: &str = "finalize";
pub const END: &str = "end";

/// Approved designs go on to analysis; rejected or undecided ones go back to proposal.
#[instrument(level = "trace", skip(state))]
pub fn after_approval(state: &DesignState) -> &'static str {
  let label = match state.approval {
    Approval::Approved => ANALYZE,
    Approval::Rejected | Approval::Unset => REVISE,
  };
  debug!(approval = %state.approval, label, "after approval");
  label
}

/// A passing critique finalizes. Otherwise the run revises until `max_iterations`
/// proposals have been made, then ends.
#[instrument(level = "trace", skip(state))]
pub fn after_critique(state: &DesignState, max_iterations: u32) -> &'static str {
  let label = if state.critique_feedback.as_deref() == Some(PASS_SENTINEL) {
    FINALIZE
  } else if state.iteration_count >= max_iterations {
    END
  } else {
    REVISE
  };
  debug!(iteration = state.iteration_count, max_iterations, label, "after critique");
  label
}
