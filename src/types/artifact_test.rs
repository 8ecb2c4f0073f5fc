//! Tests for `ArtifactRef` and `Captured`.

use super::{ArtifactRef, Captured, CollaboratorFault, Metrics};
use crate::error::CollaboratorError;

#[test]
fn artifact_ref_rejects_blank() {
  assert!(ArtifactRef::new("").is_none());
  assert!(ArtifactRef::new("   ").is_none());
  assert_eq!(
    ArtifactRef::new("outputs/design_1.png").unwrap().as_str(),
    "outputs/design_1.png"
  );
}

#[test]
fn artifact_ref_serializes_as_plain_string() {
  let a = ArtifactRef::new("a.png").unwrap();
  assert_eq!(serde_json::to_string(&a).unwrap(), "\"a.png\"");
}

#[test]
fn captured_from_ok_keeps_value() {
  let c: Captured<u32> = Ok(7).into();
  assert_eq!(c.value(), Some(&7));
  assert!(!c.is_failed());
  assert!(c.fault().is_none());
}

#[test]
fn captured_from_err_records_fault() {
  let c: Captured<Metrics> = Err(CollaboratorError::unavailable("quantifier", "model missing")).into();
  assert!(c.is_failed());
  let fault = c.fault().unwrap();
  assert_eq!(fault.collaborator, "quantifier");
  assert!(fault.message.contains("model missing"));
}

#[test]
fn captured_serde_is_tagged() {
  let c: Captured<ArtifactRef> = Captured::Failed(CollaboratorFault {
    collaborator: "renderer".to_string(),
    message: "quota".to_string(),
  });
  let v = serde_json::to_value(&c).unwrap();
  assert_eq!(v["failed"]["collaborator"], "renderer");
  let back: Captured<ArtifactRef> = serde_json::from_value(v).unwrap();
  assert_eq!(back, c);
}
