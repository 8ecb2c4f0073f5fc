//! Collaborators backed by external commands.
//!
//! The command is run with a JSON request on stdin (`{"operation": ..., ...}`) and must
//! print one JSON object on stdout. Non-zero exit, spawn failure, or unparseable output is
//! a [CollaboratorError]; stderr is passed through to the terminal.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use super::{
  CachedRetriever, Collaborators, CritiqueGenerator, HumanInput, ImageSynthesizer, Proposal,
  ProposalGenerator, Quantifier, ReportGenerator, Retriever,
};
use crate::config::CommandConfig;
use crate::error::CollaboratorError;
use crate::types::{ArtifactRef, CritiqueStatus, CritiqueVerdict, Metrics};

/// One external command speaking the JSON request/response protocol.
#[derive(Debug, Clone)]
pub struct CommandCollaborator {
  name: String,
  cmd: String,
}

impl CommandCollaborator {
  pub fn new(name: impl Into<String>, cmd: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      cmd: cmd.into(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Runs the command with `request` as stdin and parses stdout as `T`.
  #[instrument(level = "trace", skip(self, request), fields(collaborator = %self.name))]
  pub(crate) async fn invoke<T: DeserializeOwned>(
    &self,
    request: serde_json::Value,
  ) -> Result<T, CollaboratorError> {
    let parts: Vec<&str> = self.cmd.split_whitespace().collect();
    let (bin, args) = parts
      .split_first()
      .ok_or_else(|| CollaboratorError::unavailable(&self.name, "command is empty"))?;

    let mut payload = serde_json::to_vec(&request)
      .map_err(|e| CollaboratorError::malformed(&self.name, format!("request: {}", e)))?;
    payload.push(b'\n');

    let mut child = Command::new(bin)
      .args(args)
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::inherit())
      .kill_on_drop(true)
      .spawn()
      .map_err(|e| CollaboratorError::unavailable(&self.name, format!("spawn: {}", e)))?;

    // stdin is fed concurrently with draining stdout so neither pipe can fill up and stall.
    let stdin = child.stdin.take();
    let write = async move {
      if let Some(mut stdin) = stdin {
        stdin.write_all(&payload).await?;
      }
      Ok::<(), std::io::Error>(())
    };
    let (written, output) = tokio::join!(write, child.wait_with_output());

    let output =
      output.map_err(|e| CollaboratorError::unavailable(&self.name, format!("wait: {}", e)))?;
    if !output.status.success() {
      let msg = output
        .status
        .code()
        .map(|c| format!("exit {}", c))
        .unwrap_or_else(|| "terminated by signal".to_string());
      return Err(CollaboratorError::unavailable(&self.name, msg));
    }
    match written {
      // A command that answers without reading all of its input is fine.
      Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => {
        return Err(CollaboratorError::unavailable(&self.name, format!("stdin: {}", e)));
      }
      _ => {}
    }
    debug!(bytes = output.stdout.len(), "collaborator responded");
    serde_json::from_slice(&output.stdout)
      .map_err(|e| CollaboratorError::malformed(&self.name, e.to_string()))
  }
}

#[derive(Deserialize)]
struct RulesResponse {
  rules: String,
}

#[derive(Deserialize)]
struct RenderResponse {
  artifact_ref: Option<String>,
  error: Option<String>,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
  metrics: Option<Metrics>,
  error: Option<String>,
}

/// Either a structured verdict or free text to classify.
#[derive(Deserialize)]
struct CritiqueResponse {
  status: Option<CritiqueStatus>,
  reason: Option<String>,
  text: Option<String>,
}

#[derive(Deserialize)]
struct ReportResponse {
  markdown: String,
}

#[derive(Deserialize)]
struct AnswerResponse {
  answer: String,
}

#[async_trait]
impl Retriever for CommandCollaborator {
  async fn lookup(&self, query: &str) -> Result<String, CollaboratorError> {
    let r: RulesResponse = self
      .invoke(json!({ "operation": "lookup", "query": query }))
      .await?;
    Ok(r.rules)
  }
}

#[async_trait]
impl ProposalGenerator for CommandCollaborator {
  async fn propose(
    &self,
    request: &str,
    rules: &str,
    feedback: &str,
  ) -> Result<Proposal, CollaboratorError> {
    self
      .invoke(json!({
        "operation": "propose",
        "request": request,
        "rules": rules,
        "feedback": feedback,
      }))
      .await
  }
}

#[async_trait]
impl ImageSynthesizer for CommandCollaborator {
  async fn render(&self, proposal_spec: &str) -> Result<ArtifactRef, CollaboratorError> {
    let r: RenderResponse = self
      .invoke(json!({ "operation": "render", "proposal_spec": proposal_spec }))
      .await?;
    match (r.artifact_ref.and_then(ArtifactRef::new), r.error) {
      (_, Some(err)) => Err(CollaboratorError::unavailable(&self.name, err)),
      (Some(artifact), None) => Ok(artifact),
      (None, None) => Err(CollaboratorError::malformed(
        &self.name,
        "response has neither artifact_ref nor error",
      )),
    }
  }
}

#[async_trait]
impl HumanInput for CommandCollaborator {
  async fn ask(&self, question: &str) -> Result<String, CollaboratorError> {
    let r: AnswerResponse = self
      .invoke(json!({ "operation": "ask", "question": question }))
      .await?;
    Ok(r.answer)
  }
}

#[async_trait]
impl Quantifier for CommandCollaborator {
  async fn analyze(&self, artifact: &ArtifactRef) -> Result<Metrics, CollaboratorError> {
    let r: AnalyzeResponse = self
      .invoke(json!({ "operation": "analyze", "artifact_ref": artifact }))
      .await?;
    match (r.metrics, r.error) {
      (_, Some(err)) => Err(CollaboratorError::unavailable(&self.name, err)),
      (Some(metrics), None) => Ok(metrics),
      (None, None) => Err(CollaboratorError::malformed(
        &self.name,
        "response has neither metrics nor error",
      )),
    }
  }
}

#[async_trait]
impl CritiqueGenerator for CommandCollaborator {
  async fn critique(
    &self,
    analysis: &Metrics,
    rules: &str,
  ) -> Result<CritiqueVerdict, CollaboratorError> {
    let r: CritiqueResponse = self
      .invoke(json!({ "operation": "critique", "analysis": analysis, "rules": rules }))
      .await?;
    match (r.status, r.reason, r.text) {
      (Some(CritiqueStatus::Pass), _, _) => Ok(CritiqueVerdict::pass()),
      (Some(CritiqueStatus::Fail), reason, text) => {
        Ok(CritiqueVerdict::fail(reason.or(text).unwrap_or_default()))
      }
      (None, _, Some(text)) => Ok(CritiqueVerdict::classify(&text)),
      (None, _, None) => Err(CollaboratorError::malformed(
        &self.name,
        "response has neither status nor text",
      )),
    }
  }
}

#[async_trait]
impl ReportGenerator for CommandCollaborator {
  async fn report(&self, request: &str, analysis: &Metrics) -> Result<String, CollaboratorError> {
    let r: ReportResponse = self
      .invoke(json!({ "operation": "report", "request": request, "analysis": analysis }))
      .await?;
    Ok(r.markdown)
  }
}

fn required(name: &str, cmd: &Option<String>, missing: &mut Vec<String>) -> Arc<CommandCollaborator> {
  match cmd {
    Some(c) if !c.trim().is_empty() => Arc::new(CommandCollaborator::new(name, c.clone())),
    _ => {
      missing.push(name.to_string());
      Arc::new(CommandCollaborator::new(name, ""))
    }
  }
}

/// Builds the collaborator set from configured commands. Rule lookups are cached.
///
/// Every command is required; the error lists the missing ones.
pub fn command_collaborators(
  commands: &CommandConfig,
  human: Arc<dyn HumanInput>,
) -> Result<Collaborators, String> {
  let mut missing = Vec::new();
  let retriever = required("retrieve", &commands.retrieve, &mut missing);
  let proposer = required("propose", &commands.propose, &mut missing);
  let renderer = required("render", &commands.render, &mut missing);
  let quantifier = required("analyze", &commands.analyze, &mut missing);
  let critic = required("critique", &commands.critique, &mut missing);
  let reporter = required("report", &commands.report, &mut missing);
  if !missing.is_empty() {
    return Err(format!(
      "missing collaborator command(s): {}",
      missing.join(", ")
    ));
  }
  Ok(Collaborators {
    retriever: Arc::new(CachedRetriever::new(retriever)),
    proposer,
    renderer,
    human,
    quantifier,
    critic,
    reporter,
  })
}
