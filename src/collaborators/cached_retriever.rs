//! Retriever wrapper that memoizes lookups per query.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use super::Retriever;
use crate::error::CollaboratorError;

/// Caches rule lookups so concurrent runs share them.
///
/// At most one lookup per query is in flight: concurrent callers for the same key wait on
/// the same cell. A failed lookup leaves the cell empty so the next caller retries.
pub struct CachedRetriever {
  inner: Arc<dyn Retriever>,
  entries: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl CachedRetriever {
  pub fn new(inner: Arc<dyn Retriever>) -> Self {
    Self {
      inner,
      entries: Mutex::new(HashMap::new()),
    }
  }

  /// Number of queries with a populated entry.
  pub fn cached_len(&self) -> usize {
    self
      .entries
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .values()
      .filter(|cell| cell.initialized())
      .count()
  }

  fn cell(&self, query: &str) -> Arc<OnceCell<String>> {
    let mut entries = self
      .entries
      .lock()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    entries.entry(query.to_string()).or_default().clone()
  }
}

#[async_trait]
impl Retriever for CachedRetriever {
  #[instrument(level = "trace", skip(self))]
  async fn lookup(&self, query: &str) -> Result<String, CollaboratorError> {
    let cell = self.cell(query);
    let rules = cell
      .get_or_try_init(|| async {
        debug!(query, "populating rule cache");
        self.inner.lookup(query).await
      })
      .await?;
    Ok(rules.clone())
  }
}
