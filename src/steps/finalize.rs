//! Produces the final report for a compliant design.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{FINALIZE, IMAGE_PLACEHOLDER, Step, StepContext};
use crate::collaborators::ReportGenerator;
use crate::error::StepError;
use crate::types::{DesignState, StateUpdate};

pub struct FinalizeStep {
  reporter: Arc<dyn ReportGenerator>,
}

impl FinalizeStep {
  pub fn new(reporter: Arc<dyn ReportGenerator>) -> Self {
    Self { reporter }
  }
}

#[async_trait]
impl Step for FinalizeStep {
  fn name(&self) -> &str {
    FINALIZE
  }

  async fn execute(
    &self,
    state: &DesignState,
    _ctx: &StepContext,
  ) -> Result<StateUpdate, StepError> {
    let metrics = state
      .metrics()
      .ok_or_else(|| StepError::missing(FINALIZE, "analysis"))?;
    let artifact = state
      .artifact_ref()
      .ok_or_else(|| StepError::missing(FINALIZE, "artifact_ref"))?;
    let markdown = self
      .reporter
      .report(state.request(), metrics)
      .await
      .map_err(|e| StepError::collaborator(FINALIZE, e))?;
    let report = markdown.replace(IMAGE_PLACEHOLDER, artifact.as_str());
    info!(bytes = report.len(), "final report generated");
    Ok(StateUpdate {
      final_report: Some(report),
      ..Default::default()
    })
  }
}
