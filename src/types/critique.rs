//! Structured critique verdict and the free-text classification that produces it.

use serde::{Deserialize, Serialize};

/// Feedback stored in state when the critique passes.
pub const PASS_SENTINEL: &str = "PASS";

/// Token whose presence (case-insensitive) marks a free-text critique as failing.
pub const FAIL_TOKEN: &str = "FAIL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritiqueStatus {
  Pass,
  Fail,
}

/// Result of the critique collaborator: pass/fail plus the reason given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CritiqueVerdict {
  pub status: CritiqueStatus,
  pub reason: String,
}

impl CritiqueVerdict {
  pub fn pass() -> Self {
    Self {
      status: CritiqueStatus::Pass,
      reason: PASS_SENTINEL.to_string(),
    }
  }

  /// A failing verdict. An empty reason is replaced by the bare fail token; a reason that
  /// reads as the pass sentinel is prefixed with it so it can never route as a pass.
  pub fn fail(reason: impl Into<String>) -> Self {
    let reason = reason.into();
    let reason = if reason.trim().is_empty() {
      FAIL_TOKEN.to_string()
    } else if reason.trim() == PASS_SENTINEL {
      format!("{}: {}", FAIL_TOKEN, reason)
    } else {
      reason
    };
    Self {
      status: CritiqueStatus::Fail,
      reason,
    }
  }

  /// Classifies free text: any text whose uppercase form contains `FAIL` fails with the
  /// full text as its reason; everything else passes.
  pub fn classify(text: &str) -> Self {
    if text.to_uppercase().contains(FAIL_TOKEN) {
      Self::fail(text)
    } else {
      Self::pass()
    }
  }

  pub fn is_pass(&self) -> bool {
    self.status == CritiqueStatus::Pass
  }

  /// Value stored as `critique_feedback`: the sentinel on pass, the reason on fail.
  pub fn into_feedback(self) -> String {
    match self.status {
      CritiqueStatus::Pass => PASS_SENTINEL.to_string(),
      CritiqueStatus::Fail => self.reason,
    }
  }
}
