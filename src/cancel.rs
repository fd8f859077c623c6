//! Cooperative cancellation shared by the fetch, populate and scan tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A clonable cancellation flag.
///
/// All clones observe a `cancel()` issued on any of them. Synchronous
/// producers check `is_cancelled` between records; async producers await
/// `cancelled()` so a cancel interrupts them even while they are parked on
/// I/O. A consumer can also simply drop its receiver, which stops the
/// producing task at its next send.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
  cancelled: Arc<AtomicBool>,
  notify: Arc<Notify>,
}

impl CancellationToken {
  pub fn new() -> Self {
    Self::default()
  }

  /// Request cancellation and wake every task parked in `cancelled()`.
  pub fn cancel(&self) {
    self.cancelled.store(true, Ordering::SeqCst);
    self.notify.notify_waiters();
  }

  /// Check whether cancellation has been requested.
  pub fn is_cancelled(&self) -> bool {
    self.cancelled.load(Ordering::SeqCst)
  }

  /// Wait until cancellation is requested. Returns immediately if it
  /// already has been.
  pub async fn cancelled(&self) {
    // Register before checking the flag so a cancel() landing in between
    // cannot be missed.
    let mut notified = std::pin::pin!(self.notify.notified());
    notified.as_mut().enable();

    if self.is_cancelled() {
      return;
    }

    notified.await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[test]
  fn clones_share_state() {
    let token = CancellationToken::new();
    let clone = token.clone();

    assert!(!clone.is_cancelled());
    token.cancel();
    assert!(clone.is_cancelled());
  }

  #[tokio::test]
  async fn cancelled_returns_immediately_when_already_cancelled() {
    let token = CancellationToken::new();
    token.cancel();
    token.cancelled().await;
  }

  #[tokio::test]
  async fn cancelled_wakes_a_parked_waiter() {
    let token = CancellationToken::new();
    let waiter = token.clone();

    let handle = tokio::spawn(async move { waiter.cancelled().await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    token.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
      .await
      .expect("waiter was not woken by cancel()")
      .unwrap();
  }
}
