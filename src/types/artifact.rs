//! Opaque artifact handle and results captured from degraded collaborators.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

/// Metric name to value, as produced by the quantification collaborator.
pub type Metrics = BTreeMap<String, f64>;

/// Opaque reference to a rendered artifact (a file path, URL, or storage key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactRef(String);

impl ArtifactRef {
  /// Creates a reference, returning `None` if the value is empty.
  pub fn new(value: impl Into<String>) -> Option<Self> {
    let v = value.into();
    if v.trim().is_empty() { None } else { Some(Self(v)) }
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ArtifactRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Structured record of a collaborator failure kept in state instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorFault {
  pub collaborator: String,
  pub message: String,
}

impl From<CollaboratorError> for CollaboratorFault {
  fn from(err: CollaboratorError) -> Self {
    Self {
      collaborator: err.collaborator().to_string(),
      message: err.to_string(),
    }
  }
}

impl fmt::Display for CollaboratorFault {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.message)
  }
}

/// Either a usable value or the fault that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Captured<T> {
  Value(T),
  Failed(CollaboratorFault),
}

impl<T> Captured<T> {
  pub fn value(&self) -> Option<&T> {
    match self {
      Captured::Value(v) => Some(v),
      Captured::Failed(_) => None,
    }
  }

  pub fn fault(&self) -> Option<&CollaboratorFault> {
    match self {
      Captured::Value(_) => None,
      Captured::Failed(f) => Some(f),
    }
  }

  pub fn is_failed(&self) -> bool {
    matches!(self, Captured::Failed(_))
  }
}

impl<T> From<Result<T, CollaboratorError>> for Captured<T> {
  fn from(result: Result<T, CollaboratorError>) -> Self {
    match result {
      Ok(v) => Captured::Value(v),
      Err(e) => Captured::Failed(e.into()),
    }
  }
}
