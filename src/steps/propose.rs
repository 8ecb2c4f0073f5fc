//! Generates a (revised) design proposal.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::{NO_FEEDBACK, PROPOSE, REJECTION_NOTE, Step, StepContext};
use crate::collaborators::ProposalGenerator;
use crate::error::{CollaboratorError, StepError};
use crate::types::{Approval, DesignState, StateUpdate};

pub struct ProposeStep {
  proposer: Arc<dyn ProposalGenerator>,
}

impl ProposeStep {
  pub fn new(proposer: Arc<dyn ProposalGenerator>) -> Self {
    Self { proposer }
  }
}

/// Feedback for the next proposal: the last critique (or `N/A`), plus a request to diverge
/// when the human rejected the previous design.
#[instrument(level = "trace", skip(state))]
pub(crate) fn feedback_for(state: &DesignState) -> String {
  let mut feedback = state
    .critique_feedback
    .clone()
    .unwrap_or_else(|| NO_FEEDBACK.to_string());
  if state.approval == Approval::Rejected {
    feedback.push_str(REJECTION_NOTE);
  }
  feedback
}

#[async_trait]
impl Step for ProposeStep {
  fn name(&self) -> &str {
    PROPOSE
  }

  async fn execute(
    &self,
    state: &DesignState,
    _ctx: &StepContext,
  ) -> Result<StateUpdate, StepError> {
    let feedback = feedback_for(state);
    let proposal = self
      .proposer
      .propose(state.request(), state.retrieved_rules(), &feedback)
      .await
      .map_err(|e| StepError::collaborator(PROPOSE, e))?;
    if proposal.proposal_spec.trim().is_empty() {
      return Err(StepError::collaborator(
        PROPOSE,
        CollaboratorError::malformed("proposer", "empty proposal_spec"),
      ));
    }
    let iteration = state.iteration_count + 1;
    info!(iteration, "proposal generated");
    Ok(StateUpdate {
      proposal_spec: Some(proposal.proposal_spec),
      iteration_count: Some(iteration),
      approval: Some(Approval::Unset),
      ..Default::default()
    })
  }
}
