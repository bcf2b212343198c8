use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::{Catalog, SearchResultItem};
use crate::constants::constants;
use crate::debounce::Debouncer;
use crate::lifecycle::{FetchLifecycle, FetchState};

/// Observable phase of the search pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
  Idle,
  Debouncing,
  Fetching,
  Success,
  Failed,
}

/// Owns the query text and the debounced, cancellable search request behind it.
pub struct SearchController {
  query: String,
  debounce: Debouncer,
  fetch: FetchLifecycle<Vec<SearchResultItem>>,
}

impl SearchController {
  pub fn new() -> Self {
    Self {
      query: String::new(),
      debounce: Debouncer::new(constants().debounce()),
      fetch: FetchLifecycle::new("search"),
    }
  }

  /// Start with a query that fires after the usual quiet window.
  pub fn with_query(query: impl Into<String>) -> Self {
    let mut controller = Self::new();
    controller.set_query(query);
    controller
  }

  pub fn query(&self) -> &str {
    &self.query
  }

  /// Update the query immediately; the request waits for the debounce window.
  /// Any in-flight request for the previous query is cancelled right away.
  pub fn set_query(&mut self, query: impl Into<String>) {
    self.query = query.into();
    self.fetch.cancel();
    self.debounce.schedule();
  }

  /// Fire the pending debounce now (Enter).
  pub fn submit(&mut self) {
    self.debounce.flush();
  }

  /// Drive the debounce timer and commit finished requests.
  /// Returns `true` when the visible state changed.
  pub fn tick<C: Catalog>(&mut self, catalog: &Arc<C>) -> bool {
    let mut changed = false;
    if self.debounce.take_due() {
      self.fire(catalog);
      changed = true;
    }
    self.fetch.poll() || changed
  }

  fn fire<C: Catalog>(&mut self, catalog: &Arc<C>) {
    let query = self.query.trim().to_string();
    if query.is_empty() {
      debug!("search: blank query, nothing to fetch");
      self.fetch.clear();
      return;
    }
    info!(query = %query, "search triggered");
    let catalog = Arc::clone(catalog);
    self.fetch.start(async move { catalog.search(&query).await });
  }

  pub fn phase(&self) -> SearchPhase {
    if self.fetch.is_loading() {
      return SearchPhase::Fetching;
    }
    if self.debounce.is_pending() {
      return SearchPhase::Debouncing;
    }
    match self.fetch.state() {
      FetchState::Idle => SearchPhase::Idle,
      FetchState::Ready(_) => SearchPhase::Success,
      FetchState::Failed(_) => SearchPhase::Failed,
    }
  }

  /// True only while a request is in flight; the debounce window itself shows no loader.
  pub fn is_loading(&self) -> bool {
    self.fetch.is_loading()
  }

  pub fn error(&self) -> Option<&str> {
    self.fetch.error()
  }

  pub fn results(&self) -> &[SearchResultItem] {
    self.fetch.value().map(Vec::as_slice).unwrap_or(&[])
  }
}

impl Default for SearchController {
  fn default() -> Self {
    Self::new()
  }
}
