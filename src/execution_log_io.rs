//! Load and write execution.log.json, and derive a resume checkpoint from it.

use std::path::Path;

use crate::checkpoint_io::{read_json, write_json};
use crate::types::{Checkpoint, ExecutionLog, Target};

/// Execution log filename under a run directory.
pub const EXECUTION_LOG_FILENAME: &str = "execution.log.json";

/// Loads an execution log from `path`. Returns error if file is missing or invalid JSON.
pub fn load_execution_log(path: &Path) -> Result<ExecutionLog, std::io::Error> {
  read_json(path)
}

/// Rewrites the log after a transition. Always written with `finished_at: None` so the file
/// describes an in-progress run.
pub fn write_execution_log_partial(path: &Path, log: &ExecutionLog) -> Result<(), std::io::Error> {
  let partial = ExecutionLog {
    finished_at: None,
    ..log.clone()
  };
  write_json(path, &partial)
}

/// Writes the log as-is (finished runs).
pub fn write_execution_log(path: &Path, log: &ExecutionLog) -> Result<(), std::io::Error> {
  write_json(path, log)
}

/// Checkpoint equivalent to the last recorded transition, or `None` for an empty log.
///
/// A finished log yields a checkpoint whose `next` is [Target::End].
pub fn resume_checkpoint_from_log(log: &ExecutionLog) -> Option<Checkpoint> {
  let last = log.steps.last()?;
  let next = if log.finished_at.is_some() {
    Target::End
  } else {
    last.next.clone()
  };
  Some(Checkpoint {
    run_id: log.run_id,
    state: last.state_after.clone(),
    next,
    completed_steps: last.completed_steps_after.clone(),
  })
}
