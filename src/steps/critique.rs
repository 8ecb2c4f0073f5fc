//! Checks the analysis against the compliance rules.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{CRITIQUE, Step, StepContext};
use crate::collaborators::CritiqueGenerator;
use crate::config::RuleSource;
use crate::error::StepError;
use crate::types::{Captured, CritiqueVerdict, DesignState, FAIL_TOKEN, StateUpdate};

pub struct CritiqueStep {
  critic: Arc<dyn CritiqueGenerator>,
  rules: RuleSource,
}

impl CritiqueStep {
  pub fn new(critic: Arc<dyn CritiqueGenerator>, rules: RuleSource) -> Self {
    Self { critic, rules }
  }

  fn rules_for<'a>(&'a self, state: &'a DesignState) -> &'a str {
    match &self.rules {
      RuleSource::Retrieved => state.retrieved_rules(),
      RuleSource::Fixed(rules) => rules,
    }
  }
}

#[async_trait]
impl Step for CritiqueStep {
  fn name(&self) -> &str {
    CRITIQUE
  }

  async fn execute(
    &self,
    state: &DesignState,
    _ctx: &StepContext,
  ) -> Result<StateUpdate, StepError> {
    let analysis = state
      .analysis
      .as_ref()
      .ok_or_else(|| StepError::missing(CRITIQUE, "analysis"))?;
    let verdict = match analysis {
      Captured::Value(metrics) => self
        .critic
        .critique(metrics, self.rules_for(state))
        .await
        .map_err(|e| StepError::collaborator(CRITIQUE, e))?,
      Captured::Failed(fault) => {
        CritiqueVerdict::fail(format!("{}: analysis unavailable: {}", FAIL_TOKEN, fault))
      }
    };
    info!(status = ?verdict.status, iteration = state.iteration_count, "critique complete");
    Ok(StateUpdate {
      critique_feedback: Some(verdict.into_feedback()),
      ..Default::default()
    })
  }
}
