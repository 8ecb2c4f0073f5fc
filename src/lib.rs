//! # design-review-loop
//!
//! Workflow engine for iterative design review: a proposal is generated, rendered, approved
//! by a human, quantified, checked against compliance rules, and either revised or
//! finalized into a report.
//!
//! ## Architecture
//!
//! - [types::DesignState]: the single state record of a run, changed only by merging the
//!   [types::StateUpdate] each step returns.
//! - [steps]: the six step executors, calling external services through the
//!   [collaborators] traits.
//! - [graph::WorkflowGraph]: steps plus unconditional and routed edges; [graphs] wires the
//!   review topology and [routers] holds the routing decisions.
//! - [orchestrator::Orchestrator]: runs a graph transition by transition, emitting a
//!   [types::StepEvent] after each one.
//! - [runner]: seeds runs, persists checkpoints and the execution log, resumes.

pub mod cancel;
pub mod checkpoint_io;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod execution_log_io;
pub mod graph;
pub mod graphs;
pub mod orchestrator;
pub mod routers;
pub mod runner;
pub mod steps;
#[cfg(test)]
mod test_support;
pub mod types;

pub use cancel::CancelToken;
pub use checkpoint_io::{CHECKPOINT_FILENAME, load_checkpoint, save_checkpoint};
pub use error::{CollaboratorError, GraphError, RunError, StateError, StepError};
pub use execution_log_io::{EXECUTION_LOG_FILENAME, load_execution_log, resume_checkpoint_from_log};
pub use graphs::design_review_graph;
pub use orchestrator::{Orchestrator, RunControl};
pub use runner::{DriverError, RunOptions, RunReport, RunStart, run_design_review};
pub use types::{Checkpoint, DesignState, RunOutcome, RunResult, StateUpdate, StepEvent};
