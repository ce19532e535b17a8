//! Small async runtime helpers shared by the encore crates.
//!
//! - [`AsyncHook`]: a debounced event handler running as a background tokio
//!   task, fed through [`send_event`].
//! - [`TaskController`] / [`TaskHandle`]: generation based cancellation for
//!   in-flight futures.

mod cancel;
mod debounce;

pub use cancel::{
  TaskController,
  TaskHandle,
  cancelable_future,
};
pub use debounce::{
  AsyncHook,
  send_event,
};
