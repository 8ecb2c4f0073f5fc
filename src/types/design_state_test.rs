//! Tests for `DesignState`.

use super::{Approval, ArtifactRef, Captured, DesignState, Metrics, StateUpdate};
use crate::error::StateError;

fn seeded() -> DesignState {
  DesignState::seed("A small building in a large green park.", "green cover >= 20%").unwrap()
}

#[test]
fn seed_sets_defaults() {
  let s = seeded();
  assert_eq!(s.request(), "A small building in a large green park.");
  assert_eq!(s.retrieved_rules(), "green cover >= 20%");
  assert_eq!(s.iteration_count, 0);
  assert_eq!(s.approval, Approval::Unset);
  assert!(s.proposal_spec.is_none());
  assert!(!s.is_complete());
}

#[test]
fn seed_rejects_empty_values() {
  assert_eq!(
    DesignState::seed("", "rules").unwrap_err(),
    StateError::EmptyRequest
  );
  assert_eq!(
    DesignState::seed("request", "  ").unwrap_err(),
    StateError::EmptyRules
  );
}

#[test]
fn merge_overwrites_only_written_fields() {
  let mut s = seeded();
  s.critique_feedback = Some("FAIL: too dense".to_string());
  let fields = s
    .merge(StateUpdate {
      proposal_spec: Some("plan v2".to_string()),
      iteration_count: Some(1),
      approval: Some(Approval::Unset),
      ..Default::default()
    })
    .unwrap();
  assert_eq!(fields, vec!["proposal_spec", "approval", "iteration_count"]);
  assert_eq!(s.proposal_spec.as_deref(), Some("plan v2"));
  assert_eq!(s.critique_feedback.as_deref(), Some("FAIL: too dense"));
  assert_eq!(s.iteration_count, 1);
}

#[test]
fn merge_last_writer_wins() {
  let mut s = seeded();
  s.merge(StateUpdate {
    approval: Some(Approval::Approved),
    ..Default::default()
  })
  .unwrap();
  s.merge(StateUpdate {
    approval: Some(Approval::Unset),
    ..Default::default()
  })
  .unwrap();
  assert_eq!(s.approval, Approval::Unset);
}

#[test]
fn merge_rejects_iteration_regression_without_side_effects() {
  let mut s = seeded();
  s.iteration_count = 2;
  let err = s
    .merge(StateUpdate {
      proposal_spec: Some("should not land".to_string()),
      iteration_count: Some(1),
      ..Default::default()
    })
    .unwrap_err();
  assert_eq!(
    err,
    StateError::IterationRegressed {
      current: 2,
      proposed: 1
    }
  );
  assert!(s.proposal_spec.is_none());
  assert_eq!(s.iteration_count, 2);
}

#[test]
fn accessors_ignore_failed_captures() {
  let mut s = seeded();
  s.artifact = Some(Captured::Value(ArtifactRef::new("d.png").unwrap()));
  let mut m = Metrics::new();
  m.insert("green_cover_percentage".to_string(), 25.0);
  s.analysis = Some(Captured::Value(m));
  assert_eq!(s.artifact_ref().unwrap().as_str(), "d.png");
  assert_eq!(s.metrics().unwrap()["green_cover_percentage"], 25.0);

  s.analysis = Some(Captured::Failed(super::CollaboratorFault {
    collaborator: "quantifier".to_string(),
    message: "no detections".to_string(),
  }));
  assert!(s.metrics().is_none());
}

#[test]
fn serde_roundtrip_keeps_seed() {
  let mut s = seeded();
  s.iteration_count = 3;
  s.final_report = Some("# Report".to_string());
  let json = serde_json::to_string(&s).unwrap();
  let back: DesignState = serde_json::from_str(&json).unwrap();
  assert_eq!(back, s);
  assert!(back.validate_seed().is_ok());
}

#[test]
fn deserialized_state_with_blank_request_fails_validation() {
  let json = serde_json::json!({
    "request": "",
    "retrieved_rules": "r",
    "proposal_spec": null,
    "artifact": null,
    "analysis": null,
    "critique_feedback": null,
    "iteration_count": 0,
    "final_report": null
  });
  let s: DesignState = serde_json::from_value(json).unwrap();
  assert_eq!(s.validate_seed().unwrap_err(), StateError::EmptyRequest);
}
