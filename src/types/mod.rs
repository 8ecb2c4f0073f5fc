//! Value types that flow through a review run.

mod approval;
mod artifact;
#[cfg(test)]
mod artifact_test;
mod checkpoint;
mod critique;
mod design_state;
#[cfg(test)]
mod design_state_test;
mod execution_log;
mod run_outcome;
mod state_update;
mod step_event;
mod target;

pub use approval::Approval;
pub use artifact::{ArtifactRef, Captured, CollaboratorFault, Metrics};
pub use checkpoint::Checkpoint;
pub use critique::{CritiqueStatus, CritiqueVerdict, FAIL_TOKEN, PASS_SENTINEL};
pub use design_state::DesignState;
pub use execution_log::{EXECUTION_LOG_VERSION, ExecutionLog, ExecutionStepEntry};
pub use run_outcome::{RunOutcome, RunResult};
pub use state_update::StateUpdate;
pub use step_event::StepEvent;
pub use target::Target;
