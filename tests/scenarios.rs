//! End-to-end review runs through the public API with in-memory collaborators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use design_review_loop::collaborators::{
  AutoApprove, CachedRetriever, Collaborators, CritiqueGenerator, HumanInput, ImageSynthesizer,
  Proposal, ProposalGenerator, Quantifier, ReportGenerator, Retriever,
};
use design_review_loop::config::ReviewConfig;
use design_review_loop::orchestrator::DEFAULT_TRANSITION_LIMIT;
use design_review_loop::types::{Approval, ArtifactRef, CritiqueVerdict, Metrics, Target};
use design_review_loop::{
  CollaboratorError, DesignState, Orchestrator, RunControl, RunOutcome, StepEvent,
  design_review_graph,
};
use proptest::prelude::*;
use tokio::sync::mpsc;

const RULES: &str = "green cover ≥ 20%";

struct Rules;

#[async_trait]
impl Retriever for Rules {
  async fn lookup(&self, _query: &str) -> Result<String, CollaboratorError> {
    Ok(RULES.to_string())
  }
}

#[derive(Default)]
struct Planner {
  feedbacks: Mutex<Vec<String>>,
}

#[async_trait]
impl ProposalGenerator for Planner {
  async fn propose(
    &self,
    request: &str,
    _rules: &str,
    feedback: &str,
  ) -> Result<Proposal, CollaboratorError> {
    let mut feedbacks = self.feedbacks.lock().unwrap();
    feedbacks.push(feedback.to_string());
    Ok(Proposal {
      proposal_spec: format!("{} v{}", request, feedbacks.len()),
    })
  }
}

struct Painter;

#[async_trait]
impl ImageSynthesizer for Painter {
  async fn render(&self, proposal_spec: &str) -> Result<ArtifactRef, CollaboratorError> {
    ArtifactRef::new(format!("designs/{}.png", proposal_spec.len()))
      .ok_or_else(|| CollaboratorError::malformed("painter", "empty"))
  }
}

struct Answers(Mutex<VecDeque<&'static str>>);

#[async_trait]
impl HumanInput for Answers {
  async fn ask(&self, _question: &str) -> Result<String, CollaboratorError> {
    Ok(self.0.lock().unwrap().pop_front().unwrap_or("yes").to_string())
  }
}

struct GreenCover(f64);

#[async_trait]
impl Quantifier for GreenCover {
  async fn analyze(&self, _artifact: &ArtifactRef) -> Result<Metrics, CollaboratorError> {
    Ok(Metrics::from([("green_cover".to_string(), self.0)]))
  }
}

/// Free-text critic: replays its script, then repeats the last line.
struct Critic(Mutex<VecDeque<String>>);

impl Critic {
  fn new(texts: &[&str]) -> Self {
    Self(Mutex::new(texts.iter().map(|t| t.to_string()).collect()))
  }
}

#[async_trait]
impl CritiqueGenerator for Critic {
  async fn critique(
    &self,
    _analysis: &Metrics,
    _rules: &str,
  ) -> Result<CritiqueVerdict, CollaboratorError> {
    let mut texts = self.0.lock().unwrap();
    let text = if texts.len() > 1 {
      texts.pop_front().unwrap_or_default()
    } else {
      texts.front().cloned().unwrap_or_else(|| "PASS".to_string())
    };
    Ok(CritiqueVerdict::classify(&text))
  }
}

struct Reporter;

#[async_trait]
impl ReportGenerator for Reporter {
  async fn report(&self, request: &str, analysis: &Metrics) -> Result<String, CollaboratorError> {
    Ok(format!(
      "# {}\n![Final Design](IMAGE_PATH_PLACEHOLDER)\n{:?}",
      request, analysis
    ))
  }
}

fn collaborators(critiques: &[&str], answers: &[&'static str]) -> Collaborators {
  Collaborators {
    retriever: Arc::new(CachedRetriever::new(Arc::new(Rules))),
    proposer: Arc::new(Planner::default()),
    renderer: Arc::new(Painter),
    human: Arc::new(Answers(Mutex::new(answers.iter().copied().collect()))),
    quantifier: Arc::new(GreenCover(25.0)),
    critic: Arc::new(Critic::new(critiques)),
    reporter: Arc::new(Reporter),
  }
}

fn orchestrator(collabs: &Collaborators, max_iterations: u32) -> Orchestrator {
  let config = ReviewConfig {
    max_iterations,
    ..Default::default()
  };
  Orchestrator::new(design_review_graph(collabs, &config).unwrap())
}

fn seed() -> DesignState {
  DesignState::seed("X", RULES).unwrap()
}

#[tokio::test]
async fn scenario_a_pass_on_first_critique_finalizes() {
  let collabs = collaborators(&["PASS"], &[]);
  let result = orchestrator(&collabs, 3)
    .run(seed(), RunControl::default())
    .await
    .unwrap();
  assert_eq!(result.outcome, RunOutcome::Completed);
  assert_eq!(result.state.iteration_count, 1);
  assert_eq!(result.state.critique_feedback.as_deref(), Some("PASS"));
  assert_eq!(result.completed_steps.last().map(String::as_str), Some("finalize"));
  let report = result.state.final_report.unwrap();
  assert!(report.contains("![Final Design](designs/"));
  assert!(!report.contains("IMAGE_PATH_PLACEHOLDER"));
}

#[tokio::test]
async fn scenario_b_two_failures_then_pass() {
  let fail = "FAIL: green cover is 10%, below 20% minimum";
  let planner = Arc::new(Planner::default());
  let collabs = Collaborators {
    proposer: planner.clone(),
    ..collaborators(&[fail, fail, "PASS"], &[])
  };
  let result = orchestrator(&collabs, 3)
    .run(seed(), RunControl::default())
    .await
    .unwrap();
  assert_eq!(result.outcome, RunOutcome::Completed);
  assert_eq!(result.state.iteration_count, 3);
  assert!(result.state.final_report.is_some());
  let feedbacks = planner.feedbacks.lock().unwrap().clone();
  assert_eq!(feedbacks, vec!["N/A", fail, fail]);
}

#[tokio::test]
async fn scenario_c_persistent_failure_exhausts() {
  let collabs = collaborators(&["FAIL"], &[]);
  let result = orchestrator(&collabs, 3)
    .run(seed(), RunControl::default())
    .await
    .unwrap();
  assert_eq!(result.outcome, RunOutcome::Exhausted);
  assert_eq!(result.state.iteration_count, 3);
  assert!(result.state.final_report.is_none());
  assert_eq!(result.completed_steps.last().map(String::as_str), Some("critique"));
}

#[tokio::test]
async fn scenario_d_rejection_returns_to_propose() {
  let planner = Arc::new(Planner::default());
  let collabs = Collaborators {
    proposer: planner.clone(),
    ..collaborators(&["PASS"], &["no"])
  };
  let (tx, mut rx) = mpsc::channel(64);
  let control = RunControl {
    events: Some(tx),
    ..Default::default()
  };
  let result = orchestrator(&collabs, 3).run(seed(), control).await.unwrap();
  let mut events: Vec<StepEvent> = vec![];
  while let Some(e) = rx.recv().await {
    events.push(e);
  }

  let gate = &events[2];
  assert_eq!(gate.step, "approve_gate");
  assert_eq!(gate.state.approval, Approval::Rejected);
  assert_eq!(gate.next, Target::step("propose"));

  let repropose = &events[3];
  assert_eq!(repropose.step, "propose");
  assert_eq!(repropose.state.approval, Approval::Unset);
  assert_eq!(repropose.state.iteration_count, gate.state.iteration_count + 1);

  let feedbacks = planner.feedbacks.lock().unwrap().clone();
  assert_ne!(feedbacks[0], feedbacks[1]);
  assert_eq!(result.outcome, RunOutcome::Completed);
  assert_eq!(result.state.iteration_count, 2);
}

#[tokio::test]
async fn iteration_count_grows_by_one_per_propose() {
  let collabs = collaborators(&["FAIL"], &["no", "yes"]);
  let (tx, mut rx) = mpsc::channel(128);
  let control = RunControl {
    events: Some(tx),
    ..Default::default()
  };
  orchestrator(&collabs, 3).run(seed(), control).await.unwrap();
  let mut last = 0;
  while let Some(e) = rx.recv().await {
    if e.step == "propose" {
      assert_eq!(e.state.iteration_count, last + 1);
    } else {
      assert_eq!(e.state.iteration_count, last);
    }
    last = e.state.iteration_count;
  }
  assert_eq!(last, 3);
}

#[tokio::test]
async fn auto_approve_runs_unattended() {
  let collabs = Collaborators {
    human: Arc::new(AutoApprove),
    ..collaborators(&["PASS"], &[])
  };
  let result = orchestrator(&collabs, 3)
    .run(seed(), RunControl::default())
    .await
    .unwrap();
  assert_eq!(result.state.approval, Approval::Approved);
}

#[tokio::test]
async fn concurrent_runs_keep_their_own_state() {
  let orch = orchestrator(&collaborators(&["PASS"], &[]), 3);
  let mut handles = vec![];
  for i in 0..8 {
    let orch = orch.clone();
    handles.push(tokio::spawn(async move {
      let state = DesignState::seed(format!("request {}", i), RULES).unwrap();
      orch.run(state, RunControl::default()).await
    }));
  }
  for (i, handle) in handles.into_iter().enumerate() {
    let result = handle.await.unwrap().unwrap();
    assert_eq!(result.state.request(), format!("request {}", i));
    assert!(result.state.final_report.unwrap().starts_with(&format!("# request {}", i)));
  }
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(48))]

  #[test]
  fn every_run_terminates_within_the_ceiling(
    critiques in proptest::collection::vec("(PASS|FAIL|fail: .{0,12}|ok .{0,12})", 1..6),
    max_iterations in 1u32..5,
  ) {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    let texts: Vec<&str> = critiques.iter().map(String::as_str).collect();
    let collabs = Collaborators {
      human: Arc::new(AutoApprove),
      ..collaborators(&texts, &[])
    };
    let result = rt
      .block_on(orchestrator(&collabs, max_iterations).run(seed(), RunControl::default()))
      .unwrap();
    prop_assert!(result.transitions <= max_iterations * 5 + 1);
    prop_assert!(result.transitions < DEFAULT_TRANSITION_LIMIT);
    prop_assert!(result.state.iteration_count <= max_iterations);
    prop_assert_eq!(result.outcome == RunOutcome::Completed, result.state.final_report.is_some());
  }
}
