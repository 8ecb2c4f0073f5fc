//! Partial update returned by a step executor.

use serde::{Deserialize, Serialize};

use super::{Approval, ArtifactRef, Captured, CollaboratorFault, Metrics};

/// Fields a step changed. `None` means "not touched by this step".
///
/// There are no `request` or `retrieved_rules` fields: seed values cannot be rewritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub proposal_spec: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub artifact: Option<Captured<ArtifactRef>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub analysis: Option<Captured<Metrics>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub critique_feedback: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub approval: Option<Approval>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub iteration_count: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub final_report: Option<String>,
}

impl StateUpdate {
  /// Names of the fields this update writes, in declaration order.
  pub fn fields(&self) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if self.proposal_spec.is_some() {
      fields.push("proposal_spec");
    }
    if self.artifact.is_some() {
      fields.push("artifact_ref");
    }
    if self.analysis.is_some() {
      fields.push("analysis");
    }
    if self.critique_feedback.is_some() {
      fields.push("critique_feedback");
    }
    if self.approval.is_some() {
      fields.push("approval");
    }
    if self.iteration_count.is_some() {
      fields.push("iteration_count");
    }
    if self.final_report.is_some() {
      fields.push("final_report");
    }
    fields
  }

  /// The fault of a degraded render or analysis recorded by this update.
  pub fn fault(&self) -> Option<&CollaboratorFault> {
    self
      .artifact
      .as_ref()
      .and_then(Captured::fault)
      .or_else(|| self.analysis.as_ref().and_then(Captured::fault))
  }

  /// True if this update records a degraded render or analysis.
  pub fn is_degraded(&self) -> bool {
    self.fault().is_some()
  }
}
