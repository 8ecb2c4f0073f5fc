//! Interfaces of the external services a run depends on, plus the adapters shipped with
//! the crate.
//!
//! The core never implements content generation, rendering, or analysis; it only calls
//! these traits. All traits are object safe so a run can hold `Arc<dyn ...>` handles.

mod cached_retriever;
mod command;
mod console;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::types::{ArtifactRef, CritiqueVerdict, Metrics};

pub use cached_retriever::CachedRetriever;
pub use command::{CommandCollaborator, command_collaborators};
pub use console::{AutoApprove, ConsoleApproval};

/// Supplies domain rules relevant to a request.
#[async_trait]
pub trait Retriever: Send + Sync {
  /// Returns concatenated rule passages for `query`.
  async fn lookup(&self, query: &str) -> Result<String, CollaboratorError>;
}

/// Structured output of the proposal collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
  pub proposal_spec: String,
}

#[async_trait]
pub trait ProposalGenerator: Send + Sync {
  async fn propose(
    &self,
    request: &str,
    rules: &str,
    feedback: &str,
  ) -> Result<Proposal, CollaboratorError>;
}

#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
  async fn render(&self, proposal_spec: &str) -> Result<ArtifactRef, CollaboratorError>;
}

/// A human (or stand-in) answering the approval question. Answers are free text; the
/// approval gate validates them and asks again on anything but yes/no.
#[async_trait]
pub trait HumanInput: Send + Sync {
  async fn ask(&self, question: &str) -> Result<String, CollaboratorError>;
}

#[async_trait]
pub trait Quantifier: Send + Sync {
  async fn analyze(&self, artifact: &ArtifactRef) -> Result<Metrics, CollaboratorError>;
}

#[async_trait]
pub trait CritiqueGenerator: Send + Sync {
  async fn critique(
    &self,
    analysis: &Metrics,
    rules: &str,
  ) -> Result<CritiqueVerdict, CollaboratorError>;
}

/// Produces markdown containing [crate::steps::IMAGE_PLACEHOLDER].
#[async_trait]
pub trait ReportGenerator: Send + Sync {
  async fn report(&self, request: &str, analysis: &Metrics) -> Result<String, CollaboratorError>;
}

/// Every collaborator one run needs.
#[derive(Clone)]
pub struct Collaborators {
  pub retriever: Arc<dyn Retriever>,
  pub proposer: Arc<dyn ProposalGenerator>,
  pub renderer: Arc<dyn ImageSynthesizer>,
  pub human: Arc<dyn HumanInput>,
  pub quantifier: Arc<dyn Quantifier>,
  pub critic: Arc<dyn CritiqueGenerator>,
  pub reporter: Arc<dyn ReportGenerator>,
}
