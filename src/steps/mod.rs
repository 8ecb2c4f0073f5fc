//! Step executors: each reads the current [DesignState] and returns the fields it changed.
//!
//! Steps never mutate state themselves; the orchestrator merges the returned
//! [StateUpdate] and evaluates routing on the merged result.

mod analyze;
mod approve_gate;
mod critique;
mod finalize;
mod propose;
mod render;

use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::error::StepError;
use crate::types::{DesignState, StateUpdate};

pub use analyze::AnalyzeStep;
pub use approve_gate::ApproveGateStep;
pub use critique::CritiqueStep;
pub use finalize::FinalizeStep;
pub use propose::ProposeStep;
pub use render::RenderStep;

pub const PROPOSE: &str = "propose";
pub const RENDER: &str = "render";
pub const APPROVE_GATE: &str = "approve_gate";
pub const ANALYZE: &str = "analyze";
pub const CRITIQUE: &str = "critique";
pub const FINALIZE: &str = "finalize";

/// Token in generated reports replaced by the final artifact reference.
pub const IMAGE_PLACEHOLDER: &str = "IMAGE_PATH_PLACEHOLDER";

/// Feedback passed to the first proposal, before any critique exists.
pub const NO_FEEDBACK: &str = "N/A";

/// Appended to the feedback after the human rejected the previous design.
pub const REJECTION_NOTE: &str = " The previous visual design was rejected by the user. Please generate a significantly different design.";

/// Per-run context handed to every step.
#[derive(Debug, Clone, Default)]
pub struct StepContext {
  pub cancel: CancelToken,
}

impl StepContext {
  pub fn new(cancel: CancelToken) -> Self {
    Self { cancel }
  }
}

/// A named unit of work in the workflow graph.
#[async_trait]
pub trait Step: Send + Sync {
  fn name(&self) -> &str;

  async fn execute(&self, state: &DesignState, ctx: &StepContext)
  -> Result<StateUpdate, StepError>;
}
