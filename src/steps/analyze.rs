//! Quantifies the rendered artifact. Failures are captured, and a failed render is carried
//! forward as a failed analysis without calling the quantifier.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{ANALYZE, Step, StepContext};
use crate::collaborators::Quantifier;
use crate::error::StepError;
use crate::types::{Captured, CollaboratorFault, DesignState, StateUpdate};

pub struct AnalyzeStep {
  quantifier: Arc<dyn Quantifier>,
}

impl AnalyzeStep {
  pub fn new(quantifier: Arc<dyn Quantifier>) -> Self {
    Self { quantifier }
  }
}

#[async_trait]
impl Step for AnalyzeStep {
  fn name(&self) -> &str {
    ANALYZE
  }

  async fn execute(
    &self,
    state: &DesignState,
    _ctx: &StepContext,
  ) -> Result<StateUpdate, StepError> {
    let artifact = state
      .artifact
      .as_ref()
      .ok_or_else(|| StepError::missing(ANALYZE, "artifact_ref"))?;
    let analysis = match artifact {
      Captured::Value(artifact) => Captured::from(self.quantifier.analyze(artifact).await),
      Captured::Failed(fault) => Captured::Failed(CollaboratorFault {
        collaborator: fault.collaborator.clone(),
        message: format!("no artifact to analyze: {}", fault.message),
      }),
    };
    match &analysis {
      Captured::Value(metrics) => info!(metrics = ?metrics, "analysis complete"),
      Captured::Failed(fault) => warn!(fault = %fault, "analysis unavailable"),
    }
    Ok(StateUpdate {
      analysis: Some(analysis),
      ..Default::default()
    })
  }
}
