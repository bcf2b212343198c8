//! Cancellable request slot shared by the search, detail and poster fetches.
//!
//! Each `start` aborts the previous request through its [`AbortHandle`] and drops its
//! receiver, so only the current request can ever commit. The generation counter tags
//! requests in the log.

use futures::future::{AbortHandle, Abortable, Aborted};
use std::future::Future;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::catalog::CatalogError;

type Outcome<T> = Result<Result<T, CatalogError>, Aborted>;

/// Last committed outcome of a lifecycle.
#[derive(Debug, Default)]
pub enum FetchState<T> {
  #[default]
  Idle,
  Ready(T),
  Failed(String),
}

struct InFlight<T> {
  generation: u64,
  abort: AbortHandle,
  rx: oneshot::Receiver<Outcome<T>>,
}

pub struct FetchLifecycle<T> {
  label: &'static str,
  state: FetchState<T>,
  generation: u64,
  in_flight: Option<InFlight<T>>,
}

impl<T: Send + 'static> FetchLifecycle<T> {
  pub fn new(label: &'static str) -> Self {
    Self { label, state: FetchState::Idle, generation: 0, in_flight: None }
  }

  pub fn state(&self) -> &FetchState<T> {
    &self.state
  }

  pub fn value(&self) -> Option<&T> {
    match &self.state {
      FetchState::Ready(v) => Some(v),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match &self.state {
      FetchState::Failed(msg) => Some(msg),
      _ => None,
    }
  }

  pub fn is_loading(&self) -> bool {
    self.in_flight.is_some()
  }

  /// Cancel whatever is in flight and spawn `fut` as the new current request.
  /// A previous error is cleared; a previous value stays until the new outcome lands.
  pub fn start<F>(&mut self, fut: F)
  where
    F: Future<Output = Result<T, CatalogError>> + Send + 'static,
  {
    self.cancel();
    self.generation += 1;
    if matches!(self.state, FetchState::Failed(_)) {
      self.state = FetchState::Idle;
    }

    let (abort, registration) = AbortHandle::new_pair();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(Abortable::new(fut, registration).await);
    });
    debug!(lifecycle = self.label, generation = self.generation, "fetch started");
    self.in_flight = Some(InFlight { generation: self.generation, abort, rx });
  }

  /// Raise the cancellation signal of the in-flight request, if any. Committed state is kept.
  pub fn cancel(&mut self) {
    if let Some(in_flight) = self.in_flight.take() {
      debug!(lifecycle = self.label, generation = in_flight.generation, "fetch cancelled");
      in_flight.abort.abort();
    }
  }

  /// Cancel and forget the committed outcome.
  pub fn clear(&mut self) {
    self.cancel();
    self.state = FetchState::Idle;
  }

  /// Commit a finished request. Returns `true` when the committed state changed.
  pub fn poll(&mut self) -> bool {
    let Some(mut in_flight) = self.in_flight.take() else { return false };
    match in_flight.rx.try_recv() {
      Ok(outcome) => {
        match outcome {
          Ok(Ok(value)) => {
            debug!(lifecycle = self.label, generation = in_flight.generation, "fetch succeeded");
            self.state = FetchState::Ready(value);
          }
          Ok(Err(e)) => {
            warn!(lifecycle = self.label, err = %e, "fetch failed");
            self.state = FetchState::Failed(e.user_message());
          }
          Err(Aborted) => {
            debug!(lifecycle = self.label, "fetch aborted");
            return false;
          }
        }
        true
      }
      Err(oneshot::error::TryRecvError::Empty) => {
        self.in_flight = Some(in_flight);
        false
      }
      Err(oneshot::error::TryRecvError::Closed) => {
        warn!(lifecycle = self.label, "fetch task dropped its result");
        self.state = FetchState::Failed("Something went wrong while fetching movies".to_string());
        true
      }
    }
  }
}

impl<T> Drop for FetchLifecycle<T> {
  fn drop(&mut self) {
    if let Some(in_flight) = self.in_flight.take() {
      in_flight.abort.abort();
    }
  }
}
