//! Renders the current proposal into an artifact. Render failures are captured, not fatal.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{RENDER, Step, StepContext};
use crate::collaborators::ImageSynthesizer;
use crate::error::StepError;
use crate::types::{Captured, DesignState, StateUpdate};

pub struct RenderStep {
  renderer: Arc<dyn ImageSynthesizer>,
}

impl RenderStep {
  pub fn new(renderer: Arc<dyn ImageSynthesizer>) -> Self {
    Self { renderer }
  }
}

#[async_trait]
impl Step for RenderStep {
  fn name(&self) -> &str {
    RENDER
  }

  async fn execute(
    &self,
    state: &DesignState,
    _ctx: &StepContext,
  ) -> Result<StateUpdate, StepError> {
    let spec = state
      .proposal_spec
      .as_deref()
      .ok_or_else(|| StepError::missing(RENDER, "proposal_spec"))?;
    let artifact = Captured::from(self.renderer.render(spec).await);
    match &artifact {
      Captured::Value(a) => info!(artifact = %a, "design rendered"),
      Captured::Failed(f) => warn!(fault = %f, "render failed; continuing with captured error"),
    }
    Ok(StateUpdate {
      artifact: Some(artifact),
      ..Default::default()
    })
  }
}
