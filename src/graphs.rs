//! The design-review workflow, wired from its six steps.
//!
//! ```text
//! propose -> render -> approve_gate -(analyze)-> analyze -> critique -(finalize)-> finalize -> END
//!    ^                     |(revise)                          |(revise)   |(end)
//!    +---------------------+----------------------------------+           +-> END
//! ```

use std::sync::Arc;

use crate::collaborators::Collaborators;
use crate::config::ReviewConfig;
use crate::error::GraphError;
use crate::graph::WorkflowGraph;
use crate::routers;
use crate::steps::{
  ANALYZE, APPROVE_GATE, AnalyzeStep, ApproveGateStep, CRITIQUE, CritiqueStep, FINALIZE,
  FinalizeStep, PROPOSE, ProposeStep, RENDER, RenderStep,
};
use crate::types::{DesignState, Target};

/// Builds the review graph for one configuration. The graph holds no per-run state and can
/// drive any number of concurrent runs.
pub fn design_review_graph(
  collaborators: &Collaborators,
  config: &ReviewConfig,
) -> Result<WorkflowGraph, GraphError> {
  let max_iterations = config.max_iterations;
  WorkflowGraph::builder()
    .add_step(ProposeStep::new(collaborators.proposer.clone()))
    .add_step(RenderStep::new(collaborators.renderer.clone()))
    .add_step(ApproveGateStep::new(
      collaborators.human.clone(),
      config.approval_timeout(),
    ))
    .add_step(AnalyzeStep::new(collaborators.quantifier.clone()))
    .add_step(CritiqueStep::new(
      collaborators.critic.clone(),
      config.critique_rules.clone(),
    ))
    .add_step(FinalizeStep::new(collaborators.reporter.clone()))
    .set_entry(PROPOSE)
    .add_edge(PROPOSE, Target::step(RENDER))
    .add_edge(RENDER, Target::step(APPROVE_GATE))
    .add_conditional_edges(
      APPROVE_GATE,
      Arc::new(routers::after_approval),
      [
        (routers::ANALYZE, Target::step(ANALYZE)),
        (routers::REVISE, Target::step(PROPOSE)),
      ],
    )
    .add_edge(ANALYZE, Target::step(CRITIQUE))
    .add_conditional_edges(
      CRITIQUE,
      Arc::new(move |state: &DesignState| routers::after_critique(state, max_iterations)),
      [
        (routers::FINALIZE, Target::step(FINALIZE)),
        (routers::REVISE, Target::step(PROPOSE)),
        (routers::END, Target::End),
      ],
    )
    .add_edge(FINALIZE, Target::End)
    .build()
}
