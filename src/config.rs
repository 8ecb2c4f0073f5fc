//! Run configuration: JSON file, overridden by CLI flags and `REVIEW_LOOP_*` env vars in the
//! binary.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::routers::DEFAULT_MAX_ITERATIONS;

/// Where the critique step takes its compliance rules from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "rules")]
pub enum RuleSource {
  /// The rules retrieved for the request when the run was seeded.
  #[default]
  Retrieved,
  /// A fixed rule set, independent of retrieval.
  Fixed(String),
}

/// External commands for [crate::collaborators::CommandCollaborator].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
  pub retrieve: Option<String>,
  pub propose: Option<String>,
  pub render: Option<String>,
  pub analyze: Option<String>,
  pub critique: Option<String>,
  pub report: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
  /// Propose/critique cycles allowed before the run ends without a report.
  pub max_iterations: u32,
  pub critique_rules: RuleSource,
  /// Upper bound on a single approval wait. `None` waits until answered or cancelled.
  pub approval_timeout_secs: Option<u64>,
  /// Replace the human with [crate::collaborators::AutoApprove].
  pub auto_approve: bool,
  /// Cancel the run as soon as a render or analysis is captured as failed.
  pub abort_on_degraded: bool,
  pub commands: CommandConfig,
}

impl Default for ReviewConfig {
  fn default() -> Self {
    Self {
      max_iterations: DEFAULT_MAX_ITERATIONS,
      critique_rules: RuleSource::Retrieved,
      approval_timeout_secs: None,
      auto_approve: false,
      abort_on_degraded: false,
      commands: CommandConfig::default(),
    }
  }
}

impl ReviewConfig {
  pub fn approval_timeout(&self) -> Option<Duration> {
    self.approval_timeout_secs.map(Duration::from_secs)
  }

  pub fn validate(&self) -> Result<(), String> {
    if self.max_iterations == 0 {
      return Err("max_iterations must be at least 1".to_string());
    }
    if let RuleSource::Fixed(rules) = &self.critique_rules {
      if rules.trim().is_empty() {
        return Err("fixed critique rules must not be empty".to_string());
      }
    }
    if self.approval_timeout_secs == Some(0) {
      return Err("approval_timeout_secs must be positive".to_string());
    }
    Ok(())
  }
}

/// Loads a [ReviewConfig] from `path`. Missing keys take their defaults.
#[instrument(level = "trace", skip(path))]
pub fn load_config(path: &Path) -> Result<ReviewConfig, std::io::Error> {
  let bytes = std::fs::read(path)?;
  serde_json::from_slice(&bytes)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
