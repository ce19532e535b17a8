//! Debounced async hooks.

use tokio::{
  sync::mpsc::{
    self,
    UnboundedReceiver,
    UnboundedSender,
  },
  time::Instant,
};

/// A hook that receives events from the UI thread and reacts to them on a
/// background tokio task, optionally after a debounce delay.
///
/// `handle_event` runs for every event and returns the deadline at which
/// `finish_debounce` should fire (or `None` to disarm the timer). Returning a
/// later deadline restarts the debounce window.
///
/// Events travel over an unbounded channel: the UI thread never waits on the
/// hook, however fast it produces events. The task stops once every sender
/// returned by [`AsyncHook::spawn`] is dropped; a pending deadline is
/// discarded at that point, so dropping the sender tears a hook down without a
/// trailing `finish_debounce`.
pub trait AsyncHook: Send + 'static + Sized {
  type Event: Send + 'static;

  fn handle_event(&mut self, event: Self::Event, deadline: Option<Instant>) -> Option<Instant>;

  /// Called when the debounce deadline is reached.
  fn finish_debounce(&mut self);

  fn spawn(self) -> UnboundedSender<Self::Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    // Outside of a runtime (plain unit tests) the receiver is dropped right
    // away and every send reports a closed channel.
    if tokio::runtime::Handle::try_current().is_ok() {
      tokio::spawn(run(self, rx));
    } else {
      log::debug!("no tokio runtime available, async hook not started");
    }
    tx
  }
}

async fn run<Hook: AsyncHook>(mut hook: Hook, mut rx: UnboundedReceiver<Hook::Event>) {
  let mut deadline = None;
  loop {
    let event = match deadline {
      Some(at) => {
        match tokio::time::timeout_at(at, rx.recv()).await {
          Ok(event) => event,
          Err(_elapsed) => {
            hook.finish_debounce();
            deadline = None;
            continue;
          },
        }
      },
      None => rx.recv().await,
    };
    let Some(event) = event else {
      break;
    };
    deadline = hook.handle_event(event, deadline);
  }
}

/// Queue an event for a hook from synchronous code. Never blocks. Returns
/// whether the hook is still running to receive it.
pub fn send_event<T>(tx: &UnboundedSender<T>, event: T) -> bool {
  let sent = tx.send(event).is_ok();
  if !sent {
    log::debug!("hook is not running, event dropped");
  }
  sent
}
