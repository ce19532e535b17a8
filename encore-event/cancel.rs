//! Generation based task cancellation.
//!
//! A [`TaskController`] hands out [`TaskHandle`]s tagged with its current
//! generation. Bumping the generation (via [`TaskController::cancel`] or
//! [`TaskController::restart`]) cancels every outstanding handle at once.

use std::{
  future::Future,
  sync::{
    Arc,
    atomic::{
      AtomicU64,
      Ordering,
    },
  },
};

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Shared {
  generation: AtomicU64,
  notify:     Notify,
}

/// Owner side of a cancellable task. Dropping the controller cancels the
/// current generation.
#[derive(Debug, Default)]
pub struct TaskController {
  shared: Arc<Shared>,
}

impl TaskController {
  pub fn new() -> Self {
    Self::default()
  }

  /// Cancel every handle issued so far.
  pub fn cancel(&mut self) {
    self.shared.generation.fetch_add(1, Ordering::AcqRel);
    self.shared.notify.notify_waiters();
  }

  /// Cancel outstanding handles and issue a fresh one.
  pub fn restart(&mut self) -> TaskHandle {
    self.cancel();
    TaskHandle {
      shared:     self.shared.clone(),
      generation: self.shared.generation.load(Ordering::Acquire),
    }
  }
}

impl Drop for TaskController {
  fn drop(&mut self) {
    self.cancel();
  }
}

#[derive(Debug, Clone)]
pub struct TaskHandle {
  shared:     Arc<Shared>,
  generation: u64,
}

impl TaskHandle {
  pub fn is_canceled(&self) -> bool {
    self.shared.generation.load(Ordering::Acquire) != self.generation
  }

  /// Resolves once this handle has been canceled.
  pub async fn canceled(&self) {
    loop {
      let notified = self.shared.notify.notified();
      tokio::pin!(notified);
      // register before checking so a cancel between the check and the await
      // is not missed
      notified.as_mut().enable();
      if self.is_canceled() {
        return;
      }
      notified.await;
    }
  }
}

/// Run `future` until it completes or `handle` is canceled, whichever comes
/// first. Returns `None` when canceled.
pub async fn cancelable_future<T>(
  future: impl Future<Output = T>,
  handle: TaskHandle,
) -> Option<T> {
  tokio::select! {
    biased;
    _ = handle.canceled() => None,
    output = future => Some(output),
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::*;

  #[tokio::test(start_paused = true)]
  async fn restart_cancels_previous_handle() {
    let mut controller = TaskController::new();
    let first = controller.restart();
    let second = controller.restart();

    assert!(first.is_canceled());
    assert!(!second.is_canceled());

    let slow = async {
      tokio::time::sleep(Duration::from_secs(5)).await;
      1
    };
    assert_eq!(cancelable_future(slow, first).await, None);
  }

  #[tokio::test(start_paused = true)]
  async fn live_handle_runs_to_completion() {
    let mut controller = TaskController::new();
    let handle = controller.restart();
    let fast = async {
      tokio::time::sleep(Duration::from_millis(10)).await;
      7
    };
    assert_eq!(cancelable_future(fast, handle).await, Some(7));
  }

  #[tokio::test(start_paused = true)]
  async fn cancel_wakes_pending_future() {
    let mut controller = TaskController::new();
    let handle = controller.restart();
    let task = tokio::spawn(cancelable_future(
      tokio::time::sleep(Duration::from_secs(60)),
      handle,
    ));
    tokio::time::sleep(Duration::from_millis(1)).await;
    drop(controller);
    assert_eq!(task.await.ok(), Some(None));
  }
}
