//! Human-input collaborators for the terminal and for unattended runs.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::info;

use super::HumanInput;
use crate::error::CollaboratorError;

/// Asks on stdout and reads one line from stdin per question.
pub struct ConsoleApproval {
  lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleApproval {
  pub fn new() -> Self {
    Self {
      lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
    }
  }
}

impl Default for ConsoleApproval {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl HumanInput for ConsoleApproval {
  async fn ask(&self, question: &str) -> Result<String, CollaboratorError> {
    let console_err = |e: std::io::Error| CollaboratorError::unavailable("console", e.to_string());
    let mut stdout = tokio::io::stdout();
    stdout
      .write_all(format!("{} ", question).as_bytes())
      .await
      .map_err(console_err)?;
    stdout.flush().await.map_err(console_err)?;
    let mut lines = self.lines.lock().await;
    match lines.next_line().await {
      Ok(Some(line)) => Ok(line),
      Ok(None) => Err(CollaboratorError::unavailable("console", "stdin closed")),
      Err(e) => Err(CollaboratorError::unavailable("console", e.to_string())),
    }
  }
}

/// Approves every design without asking anyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl HumanInput for AutoApprove {
  async fn ask(&self, question: &str) -> Result<String, CollaboratorError> {
    info!(question, "auto-approving");
    Ok("yes".to_string())
  }
}
