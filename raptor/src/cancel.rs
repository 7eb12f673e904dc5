//! Cooperative cancellation: workers check this token between reads
//! and between files, never mid-I/O-call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply cloneable cancellation flag shared by every build or
/// search worker thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
  /// Creates a fresh, not-yet-cancelled token.
  pub fn new() -> Self {
    Self(Arc::new(AtomicBool::new(false)))
  }

  /// Requests cancellation. Idempotent.
  pub fn cancel(&self) {
    self.0.store(true, Ordering::Relaxed);
  }

  /// Returns whether cancellation has been requested.
  #[inline]
  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Relaxed)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn starts_uncancelled() {
    let token = CancellationToken::new();
    assert!(!token.is_cancelled());
  }

  #[test]
  fn cancel_is_visible_through_clones() {
    let token = CancellationToken::new();
    let clone = token.clone();
    clone.cancel();
    assert!(token.is_cancelled());
  }
}
