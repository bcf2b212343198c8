use std::time::Duration;
use tokio::time::Instant;

/// Deadline-based debounce timer, polled from the event loop.
#[derive(Debug)]
pub struct Debouncer {
  delay: Duration,
  deadline: Option<Instant>,
}

impl Debouncer {
  pub fn new(delay: Duration) -> Self {
    Self { delay, deadline: None }
  }

  /// Restart the quiet window from now.
  pub fn schedule(&mut self) {
    self.deadline = Some(Instant::now() + self.delay);
  }

  /// Make the pending trigger fire on the next `take_due`.
  pub fn flush(&mut self) {
    if self.deadline.is_some() {
      self.deadline = Some(Instant::now());
    }
  }

  pub fn is_pending(&self) -> bool {
    self.deadline.is_some()
  }

  /// Returns `true` exactly once per quiet window, when the deadline has passed.
  pub fn take_due(&mut self) -> bool {
    match self.deadline {
      Some(deadline) if Instant::now() >= deadline => {
        self.deadline = None;
        true
      }
      _ => false,
    }
  }
}
