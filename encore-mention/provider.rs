//! The provider contract: resolve a query string to candidates.

use std::{
  fmt,
  future::Future,
  sync::Arc,
};

use async_trait::async_trait;
use thiserror::Error;

use crate::item::SuggestionItem;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
  #[error("{0}")]
  Failed(String),
  #[error("suggestion request timed out")]
  TimedOut,
}

impl ProviderError {
  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed(message.into())
  }
}

/// Source of candidates for one trigger kind. Implementations may hit the
/// network; the engine only ever sees the returned future.
#[async_trait]
pub trait SuggestionProvider: Send + Sync + 'static {
  async fn suggest(&self, query: &str) -> Result<Vec<SuggestionItem>, ProviderError>;
}

pub type DynProvider = Arc<dyn SuggestionProvider>;

/// Adapter for plain async closures.
pub struct FnProvider<F> {
  f: F,
}

impl<F> fmt::Debug for FnProvider<F> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("FnProvider").finish_non_exhaustive()
  }
}

/// Wrap `f` as a provider. The closure receives an owned copy of the query.
pub fn provider_fn<F, Fut>(f: F) -> DynProvider
where
  F: Fn(String) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Vec<SuggestionItem>, ProviderError>> + Send + 'static,
{
  Arc::new(FnProvider { f })
}

#[async_trait]
impl<F, Fut> SuggestionProvider for FnProvider<F>
where
  F: Fn(String) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<Vec<SuggestionItem>, ProviderError>> + Send + 'static,
{
  async fn suggest(&self, query: &str) -> Result<Vec<SuggestionItem>, ProviderError> {
    (self.f)(query.to_owned()).await
  }
}

/// In-memory catalog matched by case-insensitive substring on the label.
/// An empty query returns the first `limit` entries.
#[derive(Debug, Clone)]
pub struct StaticProvider {
  items: Vec<SuggestionItem>,
  limit: usize,
}

impl Default for StaticProvider {
  fn default() -> Self {
    Self::new(Vec::new())
  }
}

impl StaticProvider {
  pub const DEFAULT_LIMIT: usize = 20;

  pub fn new(items: Vec<SuggestionItem>) -> Self {
    Self {
      items,
      limit: Self::DEFAULT_LIMIT,
    }
  }

  pub fn with_limit(mut self, limit: usize) -> Self {
    self.limit = limit;
    self
  }

  pub fn search(&self, query: &str) -> Vec<SuggestionItem> {
    let needle = query.to_lowercase();
    let mut matches: Vec<_> = self
      .items
      .iter()
      .filter_map(|item| {
        let label = item.label.to_lowercase();
        label.find(&needle).map(|offset| (offset, item))
      })
      .collect();
    // prefix matches first, catalog order otherwise
    matches.sort_by_key(|(offset, _)| usize::from(*offset != 0));
    matches
      .into_iter()
      .take(self.limit)
      .map(|(_, item)| item.clone())
      .collect()
  }
}

#[async_trait]
impl SuggestionProvider for StaticProvider {
  async fn suggest(&self, query: &str) -> Result<Vec<SuggestionItem>, ProviderError> {
    Ok(self.search(query))
  }
}
