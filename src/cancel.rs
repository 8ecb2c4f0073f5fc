//! Cooperative cancellation shared between a run and its caller.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable cancellation flag. The orchestrator checks it before every transition and the
/// approval gate wakes on it while suspended.
#[derive(Debug, Clone)]
pub struct CancelToken {
  tx: Arc<watch::Sender<bool>>,
  rx: watch::Receiver<bool>,
}

impl CancelToken {
  pub fn new() -> Self {
    let (tx, rx) = watch::channel(false);
    Self {
      tx: Arc::new(tx),
      rx,
    }
  }

  pub fn cancel(&self) {
    self.tx.send_replace(true);
  }

  pub fn is_cancelled(&self) -> bool {
    *self.rx.borrow()
  }

  /// Resolves once [CancelToken::cancel] has been called on any clone.
  pub async fn cancelled(&self) {
    let mut rx = self.rx.clone();
    while !*rx.borrow_and_update() {
      if rx.changed().await.is_err() {
        // sender is owned by every clone, so this only happens during teardown
        std::future::pending::<()>().await;
      }
    }
  }
}

impl Default for CancelToken {
  fn default() -> Self {
    Self::new()
  }
}
