//! Human approval gate: the run's only indefinite suspension point.
//!
//! The wait for an answer races the run's [CancelToken](crate::cancel::CancelToken) and,
//! when configured, a timeout. Answers other than yes/no are logged and asked again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use super::{APPROVE_GATE, Step, StepContext};
use crate::collaborators::HumanInput;
use crate::error::StepError;
use crate::types::{Approval, DesignState, StateUpdate};

pub struct ApproveGateStep {
  human: Arc<dyn HumanInput>,
  timeout: Option<Duration>,
}

impl ApproveGateStep {
  pub fn new(human: Arc<dyn HumanInput>, timeout: Option<Duration>) -> Self {
    Self { human, timeout }
  }

  /// Asks until a valid answer arrives.
  #[instrument(level = "trace", skip(self))]
  async fn decide(&self, question: &str) -> Result<Approval, StepError> {
    loop {
      let answer = self
        .human
        .ask(question)
        .await
        .map_err(|e| StepError::collaborator(APPROVE_GATE, e))?;
      match Approval::from_answer(&answer) {
        Some(approval) => return Ok(approval),
        None => warn!(answer = %answer.trim(), "invalid approval answer; expected yes or no"),
      }
    }
  }
}

pub(crate) fn question_for(state: &DesignState) -> String {
  match state.artifact_ref() {
    Some(artifact) => format!("Do you approve the design at {}? (yes/no)", artifact),
    None => "Do you approve this design? (yes/no)".to_string(),
  }
}

#[async_trait]
impl Step for ApproveGateStep {
  fn name(&self) -> &str {
    APPROVE_GATE
  }

  async fn execute(&self, state: &DesignState, ctx: &StepContext) -> Result<StateUpdate, StepError> {
    let question = question_for(state);
    let wait = async {
      match self.timeout {
        Some(limit) => match tokio::time::timeout(limit, self.decide(&question)).await {
          Ok(decided) => decided,
          Err(_) => Err(StepError::ApprovalTimedOut(limit)),
        },
        None => self.decide(&question).await,
      }
    };
    let approval = tokio::select! {
      decided = wait => decided?,
      _ = ctx.cancel.cancelled() => return Err(StepError::Cancelled(APPROVE_GATE.to_string())),
    };
    info!(%approval, "human decision recorded");
    Ok(StateUpdate {
      approval: Some(approval),
      ..Default::default()
    })
  }
}
