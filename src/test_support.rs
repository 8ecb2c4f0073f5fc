//! In-memory collaborators for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::collaborators::{
  AutoApprove, Collaborators, CritiqueGenerator, HumanInput, ImageSynthesizer, Proposal,
  ProposalGenerator, Quantifier, ReportGenerator, Retriever,
};
use crate::error::CollaboratorError;
use crate::steps::IMAGE_PLACEHOLDER;
use crate::types::{ArtifactRef, CritiqueVerdict, DesignState, Metrics};

pub(crate) fn seeded() -> DesignState {
  DesignState::seed("A small building in a large green park.", "green cover >= 20%").unwrap()
}

pub(crate) fn metrics(green: f64) -> Metrics {
  let mut m = Metrics::new();
  m.insert("green_cover_percentage".to_string(), green);
  m
}

pub(crate) struct StaticRetriever(pub String);

#[async_trait]
impl Retriever for StaticRetriever {
  async fn lookup(&self, _query: &str) -> Result<String, CollaboratorError> {
    Ok(self.0.clone())
  }
}

/// Records the feedback of every call; numbers proposals `plan 1`, `plan 2`, ...
#[derive(Default)]
pub(crate) struct RecordingProposer {
  pub feedbacks: Mutex<Vec<String>>,
  pub fail: bool,
}

#[async_trait]
impl ProposalGenerator for RecordingProposer {
  async fn propose(
    &self,
    _request: &str,
    _rules: &str,
    feedback: &str,
  ) -> Result<Proposal, CollaboratorError> {
    if self.fail {
      return Err(CollaboratorError::unavailable("proposer", "model offline"));
    }
    let mut feedbacks = self.feedbacks.lock().unwrap();
    feedbacks.push(feedback.to_string());
    Ok(Proposal {
      proposal_spec: format!("plan {}", feedbacks.len()),
    })
  }
}

pub(crate) struct StubRenderer {
  pub fail: bool,
}

#[async_trait]
impl ImageSynthesizer for StubRenderer {
  async fn render(&self, proposal_spec: &str) -> Result<ArtifactRef, CollaboratorError> {
    if self.fail {
      return Err(CollaboratorError::unavailable("renderer", "content policy"));
    }
    ArtifactRef::new(format!("outputs/{}.png", proposal_spec.replace(' ', "_")))
      .ok_or_else(|| CollaboratorError::malformed("renderer", "empty artifact"))
  }
}

/// Answers from a script, then `yes` forever.
#[derive(Default)]
pub(crate) struct ScriptedHuman {
  pub answers: Mutex<VecDeque<String>>,
  pub asked: AtomicUsize,
}

impl ScriptedHuman {
  pub fn new(answers: &[&str]) -> Self {
    Self {
      answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
      asked: AtomicUsize::new(0),
    }
  }

  pub fn asked(&self) -> usize {
    self.asked.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl HumanInput for ScriptedHuman {
  async fn ask(&self, _question: &str) -> Result<String, CollaboratorError> {
    self.asked.fetch_add(1, Ordering::SeqCst);
    Ok(
      self
        .answers
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| "yes".to_string()),
    )
  }
}

/// Never answers.
pub(crate) struct SilentHuman;

#[async_trait]
impl HumanInput for SilentHuman {
  async fn ask(&self, _question: &str) -> Result<String, CollaboratorError> {
    std::future::pending().await
  }
}

pub(crate) struct StubQuantifier {
  pub result: Result<Metrics, CollaboratorError>,
  pub calls: AtomicUsize,
}

impl StubQuantifier {
  pub fn ok(green: f64) -> Self {
    Self {
      result: Ok(metrics(green)),
      calls: AtomicUsize::new(0),
    }
  }
}

#[async_trait]
impl Quantifier for StubQuantifier {
  async fn analyze(&self, _artifact: &ArtifactRef) -> Result<Metrics, CollaboratorError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self.result.clone()
  }
}

/// Returns scripted free-text critiques (classified), then `PASS` forever. Records the rules.
#[derive(Default)]
pub(crate) struct ScriptedCritic {
  pub texts: Mutex<VecDeque<String>>,
  pub rules_seen: Mutex<Vec<String>>,
  pub fail: bool,
}

impl ScriptedCritic {
  pub fn new(texts: &[&str]) -> Self {
    Self {
      texts: Mutex::new(texts.iter().map(|t| t.to_string()).collect()),
      ..Default::default()
    }
  }
}

#[async_trait]
impl CritiqueGenerator for ScriptedCritic {
  async fn critique(
    &self,
    _analysis: &Metrics,
    rules: &str,
  ) -> Result<CritiqueVerdict, CollaboratorError> {
    if self.fail {
      return Err(CollaboratorError::unavailable("critic", "rate limited"));
    }
    self.rules_seen.lock().unwrap().push(rules.to_string());
    let text = self
      .texts
      .lock()
      .unwrap()
      .pop_front()
      .unwrap_or_else(|| "PASS".to_string());
    Ok(CritiqueVerdict::classify(&text))
  }
}

/// Returns the same structured verdict on every call.
pub(crate) struct FixedVerdictCritic(pub CritiqueVerdict);

#[async_trait]
impl CritiqueGenerator for FixedVerdictCritic {
  async fn critique(
    &self,
    _analysis: &Metrics,
    _rules: &str,
  ) -> Result<CritiqueVerdict, CollaboratorError> {
    Ok(self.0.clone())
  }
}

pub(crate) struct TemplateReporter;

#[async_trait]
impl ReportGenerator for TemplateReporter {
  async fn report(&self, request: &str, analysis: &Metrics) -> Result<String, CollaboratorError> {
    Ok(format!(
      "# {}\n\n![Final Design]({})\n\n{} metrics",
      request,
      IMAGE_PLACEHOLDER,
      analysis.len()
    ))
  }
}

/// Auto-approving collaborators with the given critique script.
pub(crate) fn collaborators(critiques: &[&str]) -> Collaborators {
  Collaborators {
    retriever: Arc::new(StaticRetriever("green cover >= 20%".to_string())),
    proposer: Arc::new(RecordingProposer::default()),
    renderer: Arc::new(StubRenderer { fail: false }),
    human: Arc::new(AutoApprove),
    quantifier: Arc::new(StubQuantifier::ok(25.0)),
    critic: Arc::new(ScriptedCritic::new(critiques)),
    reporter: Arc::new(TemplateReporter),
  }
}
