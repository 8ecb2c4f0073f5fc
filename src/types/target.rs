//! Destination of an edge: a named step or the terminal marker.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
  Step(String),
  End,
}

impl Target {
  pub fn step(name: impl Into<String>) -> Self {
    Target::Step(name.into())
  }

  pub fn step_name(&self) -> Option<&str> {
    match self {
      Target::Step(name) => Some(name),
      Target::End => None,
    }
  }

  pub fn is_end(&self) -> bool {
    matches!(self, Target::End)
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Target::Step(name) => write!(f, "{}", name),
      Target::End => write!(f, "END"),
    }
  }
}
