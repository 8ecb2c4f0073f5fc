//! Human approval decision recorded by the approval gate.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Approval state of the current design. Every new proposal resets it to [Approval::Unset].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Approval {
  Approved,
  Rejected,
  #[default]
  Unset,
}

impl Approval {
  /// Parses a human answer: `yes` or `no`, case-insensitive, surrounding whitespace ignored.
  pub fn from_answer(answer: &str) -> Option<Self> {
    match answer.trim().to_lowercase().as_str() {
      "yes" => Some(Approval::Approved),
      "no" => Some(Approval::Rejected),
      _ => None,
    }
  }
}

impl fmt::Display for Approval {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Approval::Approved => write!(f, "approved"),
      Approval::Rejected => write!(f, "rejected"),
      Approval::Unset => write!(f, "unset"),
    }
  }
}
