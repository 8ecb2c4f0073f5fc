//! Checkpoint persistence under a run directory (JSON).

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::types::Checkpoint;

/// Checkpoint filename under a run directory.
pub const CHECKPOINT_FILENAME: &str = "checkpoint.json";

/// Writes `value` as pretty JSON, creating parent directories.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), std::io::Error> {
  let json = serde_json::to_string_pretty(value)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(path, json)
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, std::io::Error> {
  let bytes = std::fs::read(path)?;
  serde_json::from_slice(&bytes)
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

/// Saves a checkpoint to `path`, replacing any previous one.
#[instrument(level = "trace", skip(path, cp))]
pub fn save_checkpoint(path: &Path, cp: &Checkpoint) -> Result<(), std::io::Error> {
  write_json(path, cp)
}

/// Loads a checkpoint. Missing files and invalid JSON are errors; the seed fields of the
/// stored state are validated as well.
#[instrument(level = "trace", skip(path))]
pub fn load_checkpoint(path: &Path) -> Result<Checkpoint, std::io::Error> {
  let cp: Checkpoint = read_json(path)?;
  cp.state
    .validate_seed()
    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
  Ok(cp)
}
