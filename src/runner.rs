//! Run driver: seeds a run, drives the orchestrator, and persists its progress.
//!
//! - [run_design_review]: retrieve rules (or load a checkpoint), run the review graph, stream
//!   events to the caller and, when a run directory is given, keep `checkpoint.json`,
//!   `execution.log.json` and per-event snapshots current, then write the final report.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::checkpoint_io::{self, CHECKPOINT_FILENAME, write_json};
use crate::collaborators::Collaborators;
use crate::config::ReviewConfig;
use crate::error::{CollaboratorError, GraphError, RunError};
use crate::execution_log_io::{
  EXECUTION_LOG_FILENAME, load_execution_log, write_execution_log, write_execution_log_partial,
};
use crate::graphs::design_review_graph;
use crate::orchestrator::{DEFAULT_TRANSITION_LIMIT, Orchestrator, RunControl};
use crate::types::{
  Checkpoint, DesignState, ExecutionLog, RunOutcome, RunResult, StepEvent, Target,
};

/// Directory holding per-event snapshots under a run directory.
pub const SNAPSHOTS_DIR: &str = "snapshots";

/// How a run begins.
#[derive(Debug, Clone)]
pub enum RunStart {
  /// A new run for this request; rules are retrieved first.
  Request(String),
  /// Continue from a saved checkpoint.
  Resume(Checkpoint),
}

/// Options for [run_design_review].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  /// If set, checkpoint, execution log, snapshots and report are written here.
  pub run_dir: Option<PathBuf>,
  pub cancel: CancelToken,
  /// Receives a copy of every step event.
  pub events: Option<mpsc::Sender<StepEvent>>,
}

/// Outcome of [run_design_review].
#[derive(Debug, Clone)]
pub struct RunReport {
  pub run_id: Uuid,
  pub result: RunResult,
  /// Markdown report written under the run directory, if any.
  pub report_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum DriverError {
  #[error("invalid configuration: {0}")]
  Config(String),
  #[error(transparent)]
  Graph(#[from] GraphError),
  #[error("rule retrieval failed: {0}")]
  Retrieval(#[source] CollaboratorError),
  #[error(transparent)]
  Run(#[from] RunError),
  #[error("run directory: {0}")]
  Io(#[from] std::io::Error),
}

/// Runs one design review to completion, exhaustion, or abort.
#[instrument(level = "trace", skip(start, collaborators, config, options))]
pub async fn run_design_review(
  start: RunStart,
  collaborators: &Collaborators,
  config: &ReviewConfig,
  options: RunOptions,
) -> Result<RunReport, DriverError> {
  config.validate().map_err(DriverError::Config)?;
  let orchestrator = Orchestrator::new(design_review_graph(collaborators, config)?);

  let (run_id, state, resume_at, completed_steps) = match start {
    RunStart::Request(request) => {
      let rules = collaborators
        .retriever
        .lookup(&request)
        .await
        .map_err(DriverError::Retrieval)?;
      let state =
        DesignState::seed(request, rules).map_err(|e| DriverError::Run(RunError::InvalidSeed(e)))?;
      (Uuid::new_v4(), state, None, vec![])
    }
    RunStart::Resume(cp) => match cp.next {
      Target::End => {
        info!(run_id = %cp.run_id, "checkpoint is already finished");
        return Ok(RunReport {
          run_id: cp.run_id,
          result: RunResult {
            outcome: RunOutcome::of(&cp.state),
            state: cp.state,
            completed_steps: cp.completed_steps,
            transitions: 0,
          },
          report_path: None,
        });
      }
      Target::Step(next) => {
        info!(run_id = %cp.run_id, next = %next, "resuming run");
        (cp.run_id, cp.state, Some(next), cp.completed_steps)
      }
    },
  };

  let mut recorder = options
    .run_dir
    .as_deref()
    .map(|dir| Recorder::open(dir, run_id, state.request()));
  let (tx, rx) = mpsc::channel(32);
  let control = RunControl {
    cancel: options.cancel.clone(),
    events: Some(tx),
    resume_at,
    completed_steps,
    transition_limit: DEFAULT_TRANSITION_LIMIT,
    abort_on_degraded: config.abort_on_degraded,
  };

  let forward = options.events.clone();
  let run = orchestrator.run(state, control);
  let consume = async {
    let mut io_error = None;
    let mut events = ReceiverStream::new(rx);
    while let Some(event) = events.next().await {
      if let Some(rec) = recorder.as_mut() {
        if let Err(e) = rec.record(&event) {
          warn!(error = %e, "failed to persist step event");
          io_error.get_or_insert(e);
        }
      }
      if let Some(tx) = &forward {
        let _ = tx.send(event).await;
      }
    }
    io_error
  };
  let (outcome, io_error) = tokio::join!(run, consume);

  if let Some(rec) = recorder.as_mut() {
    rec.finish(&outcome)?;
  }
  if let Some(e) = io_error {
    return Err(DriverError::Io(e));
  }
  let result = outcome?;

  let report_path = match (&options.run_dir, &result.state.final_report) {
    (Some(dir), Some(report)) => Some(write_report(dir, report)?),
    _ => None,
  };
  Ok(RunReport {
    run_id,
    result,
    report_path,
  })
}

/// Writes `report_<timestamp>.md` under `run_dir`.
#[instrument(level = "trace", skip(report))]
pub fn write_report(run_dir: &Path, report: &str) -> Result<PathBuf, std::io::Error> {
  std::fs::create_dir_all(run_dir)?;
  let path = run_dir.join(format!("report_{}.md", Utc::now().format("%Y%m%d_%H%M%S")));
  std::fs::write(&path, report)?;
  info!(path = %path.display(), "final report saved");
  Ok(path)
}

pub(crate) fn snapshot_name(at: &DateTime<Utc>, seq: u32, step: &str) -> String {
  format!("{}_{:03}_{}.json", at.format("%Y%m%dT%H%M%S%.3f"), seq, step)
}

/// Keeps the files of one run directory in step with the event stream.
struct Recorder {
  dir: PathBuf,
  run_id: Uuid,
  log: ExecutionLog,
}

impl Recorder {
  /// Continues an existing log for the same run, otherwise starts a new one.
  fn open(dir: &Path, run_id: Uuid, request: &str) -> Self {
    let log = match load_execution_log(&dir.join(EXECUTION_LOG_FILENAME)) {
      Ok(log) if log.run_id == run_id => log,
      _ => ExecutionLog::new(run_id, request, Utc::now().to_rfc3339()),
    };
    Self {
      dir: dir.to_path_buf(),
      run_id,
      log,
    }
  }

  fn record(&mut self, event: &StepEvent) -> Result<(), std::io::Error> {
    self.log.record(event);
    self.log.final_status = "running".to_string();
    write_execution_log_partial(&self.dir.join(EXECUTION_LOG_FILENAME), &self.log)?;
    let cp = Checkpoint {
      run_id: self.run_id,
      state: event.state.clone(),
      next: event.next.clone(),
      completed_steps: self.log.completed_steps.clone(),
    };
    checkpoint_io::save_checkpoint(&self.dir.join(CHECKPOINT_FILENAME), &cp)?;
    let snapshot = self
      .dir
      .join(SNAPSHOTS_DIR)
      .join(snapshot_name(&event.at, event.seq, &event.step));
    write_json(&snapshot, event)
  }

  /// Records how the run ended. Aborted runs stay unfinished so they can be resumed.
  fn finish(&mut self, outcome: &Result<RunResult, RunError>) -> Result<(), std::io::Error> {
    let path = self.dir.join(EXECUTION_LOG_FILENAME);
    match outcome {
      Ok(result) => {
        self.log.final_status = result.outcome.to_string();
        self.log.finished_at = Some(Utc::now().to_rfc3339());
        write_execution_log(&path, &self.log)
      }
      Err(RunError::Cancelled { .. }) => {
        self.log.final_status = "cancelled".to_string();
        write_execution_log_partial(&path, &self.log)
      }
      Err(_) => {
        self.log.final_status = "error".to_string();
        write_execution_log_partial(&path, &self.log)
      }
    }
  }
}
