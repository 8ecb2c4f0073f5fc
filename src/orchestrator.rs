//! Orchestrator: drives one run through a [WorkflowGraph] until it reaches the terminal marker.
//!
//! Per transition: check cancellation, execute the current step, merge its update, select the
//! next target from the post-merge state, emit a [StepEvent], then stop on [Target::End].

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::cancel::CancelToken;
use crate::error::{RunError, StepError};
use crate::graph::WorkflowGraph;
use crate::steps::StepContext;
use crate::types::{DesignState, RunOutcome, RunResult, StepEvent, Target};

/// Upper bound on transitions per invocation, whatever the routers decide.
pub const DEFAULT_TRANSITION_LIMIT: u32 = 1000;

/// Per-run controls supplied by the caller.
#[derive(Debug, Clone)]
pub struct RunControl {
  pub cancel: CancelToken,
  /// Receives one event per transition, in order.
  pub events: Option<mpsc::Sender<StepEvent>>,
  /// Step to start at instead of the graph entry (resume).
  pub resume_at: Option<String>,
  /// Steps completed before a resume; event sequence numbers continue from here.
  pub completed_steps: Vec<String>,
  pub transition_limit: u32,
  /// Stop as soon as a step records a captured render or analysis failure.
  pub abort_on_degraded: bool,
}

impl Default for RunControl {
  fn default() -> Self {
    Self {
      cancel: CancelToken::new(),
      events: None,
      resume_at: None,
      completed_steps: vec![],
      transition_limit: DEFAULT_TRANSITION_LIMIT,
      abort_on_degraded: false,
    }
  }
}

/// Runs any number of independent runs over one shared graph.
#[derive(Debug, Clone)]
pub struct Orchestrator {
  graph: Arc<WorkflowGraph>,
}

impl Orchestrator {
  pub fn new(graph: WorkflowGraph) -> Self {
    Self {
      graph: Arc::new(graph),
    }
  }

  pub fn graph(&self) -> &WorkflowGraph {
    &self.graph
  }

  /// Executes the run to completion, exhaustion, or abort.
  #[instrument(level = "trace", skip(self, state, control))]
  pub async fn run(
    &self,
    mut state: DesignState,
    control: RunControl,
  ) -> Result<RunResult, RunError> {
    state.validate_seed().map_err(RunError::InvalidSeed)?;
    let RunControl {
      cancel,
      events,
      resume_at,
      mut completed_steps,
      transition_limit,
      abort_on_degraded,
    } = control;
    let ctx = StepContext::new(cancel.clone());
    let mut current = resume_at.unwrap_or_else(|| self.graph.entry().to_string());
    let mut transitions: u32 = 0;

    loop {
      if cancel.is_cancelled() {
        info!(next = %current, "run cancelled");
        return Err(RunError::Cancelled {
          next: current,
          partial: Box::new(state),
        });
      }
      if transitions >= transition_limit {
        return Err(RunError::TransitionLimit {
          limit: transition_limit,
          partial: Box::new(state),
        });
      }
      transitions += 1;

      let Some(step) = self.graph.step(&current).cloned() else {
        return Err(configuration(&current, "step is not in the graph", state));
      };
      info!(step = %current, transition = transitions, iteration = state.iteration_count, "executing step");
      let update = match step.execute(&state, &ctx).await {
        Ok(update) => update,
        Err(e) => return Err(step_failure(current, e, state)),
      };
      let degraded = update.fault().map(ToString::to_string);
      let fields = match state.merge(update.clone()) {
        Ok(fields) => fields,
        Err(e) => return Err(configuration(&current, &e.to_string(), state)),
      };
      completed_steps.push(current.clone());
      let next = match self.graph.next_target(&current, &state) {
        Ok(next) => next,
        Err(message) => return Err(configuration(&current, &message, state)),
      };
      debug!(step = %current, fields = ?fields, next = %next, "transition");

      if let Some(tx) = &events {
        let event = StepEvent::new(
          completed_steps.len() as u32,
          current.clone(),
          &fields,
          update,
          state.clone(),
          next.clone(),
        );
        if tx.send(event).await.is_err() {
          debug!("event receiver dropped");
        }
      }

      if let Some(message) = degraded {
        warn!(step = %current, fault = %message, "step recorded a degraded result");
        if abort_on_degraded {
          return Err(RunError::Degraded {
            step: current,
            message,
            partial: Box::new(state),
          });
        }
      }

      match next {
        Target::Step(name) => current = name,
        Target::End => {
          let outcome = RunOutcome::of(&state);
          info!(%outcome, iterations = state.iteration_count, transitions, "run finished");
          return Ok(RunResult {
            outcome,
            state,
            completed_steps,
            transitions,
          });
        }
      }
    }
  }
}

fn configuration(step: &str, message: &str, state: DesignState) -> RunError {
  RunError::Configuration {
    step: step.to_string(),
    message: message.to_string(),
    partial: Box::new(state),
  }
}

fn step_failure(step: String, err: StepError, state: DesignState) -> RunError {
  match err {
    StepError::Cancelled(_) => RunError::Cancelled {
      next: step,
      partial: Box::new(state),
    },
    StepError::MissingInput { .. } => configuration(&step, &err.to_string(), state),
    source => RunError::Step {
      step,
      source,
      partial: Box::new(state),
    },
  }
}
