//! The state record threaded through every step of a run.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Approval, ArtifactRef, Captured, Metrics, StateUpdate};
use crate::error::StateError;

/// Canonical state of one run. Steps read it; only the orchestrator mutates it, and only
/// through [DesignState::merge].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignState {
  request: String,
  retrieved_rules: String,
  pub proposal_spec: Option<String>,
  pub artifact: Option<Captured<ArtifactRef>>,
  pub analysis: Option<Captured<Metrics>>,
  pub critique_feedback: Option<String>,
  #[serde(default)]
  pub approval: Approval,
  pub iteration_count: u32,
  pub final_report: Option<String>,
}

impl DesignState {
  /// Creates the state for a new run. Both seed values must be non-empty.
  pub fn seed(
    request: impl Into<String>,
    retrieved_rules: impl Into<String>,
  ) -> Result<Self, StateError> {
    let state = Self {
      request: request.into(),
      retrieved_rules: retrieved_rules.into(),
      proposal_spec: None,
      artifact: None,
      analysis: None,
      critique_feedback: None,
      approval: Approval::Unset,
      iteration_count: 0,
      final_report: None,
    };
    state.validate_seed()?;
    Ok(state)
  }

  pub fn request(&self) -> &str {
    &self.request
  }

  pub fn retrieved_rules(&self) -> &str {
    &self.retrieved_rules
  }

  /// Checks the seed invariants (used again on resume, where state is deserialized).
  pub fn validate_seed(&self) -> Result<(), StateError> {
    if self.request.trim().is_empty() {
      return Err(StateError::EmptyRequest);
    }
    if self.retrieved_rules.trim().is_empty() {
      return Err(StateError::EmptyRules);
    }
    Ok(())
  }

  /// The rendered artifact, if rendering succeeded.
  pub fn artifact_ref(&self) -> Option<&ArtifactRef> {
    self.artifact.as_ref().and_then(Captured::value)
  }

  /// The analysis metrics, if analysis succeeded.
  pub fn metrics(&self) -> Option<&Metrics> {
    self.analysis.as_ref().and_then(Captured::value)
  }

  pub fn is_complete(&self) -> bool {
    self.final_report.is_some()
  }

  /// Applies `update` by per-field overwrite and returns the names of the fields written.
  ///
  /// Rejected without any change if it would lower `iteration_count`.
  #[instrument(level = "trace", skip(self, update))]
  pub fn merge(&mut self, update: StateUpdate) -> Result<Vec<&'static str>, StateError> {
    if let Some(proposed) = update.iteration_count {
      if proposed < self.iteration_count {
        return Err(StateError::IterationRegressed {
          current: self.iteration_count,
          proposed,
        });
      }
    }
    let fields = update.fields();
    let StateUpdate {
      proposal_spec,
      artifact,
      analysis,
      critique_feedback,
      approval,
      iteration_count,
      final_report,
    } = update;
    if proposal_spec.is_some() {
      self.proposal_spec = proposal_spec;
    }
    if artifact.is_some() {
      self.artifact = artifact;
    }
    if analysis.is_some() {
      self.analysis = analysis;
    }
    if critique_feedback.is_some() {
      self.critique_feedback = critique_feedback;
    }
    if let Some(a) = approval {
      self.approval = a;
    }
    if let Some(n) = iteration_count {
      self.iteration_count = n;
    }
    if final_report.is_some() {
      self.final_report = final_report;
    }
    Ok(fields)
  }
}
