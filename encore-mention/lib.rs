//! Inline mention suggestions for a rich text editor.
//!
//! Typing a trigger character (`@` for people, `#` for performers by default)
//! opens a suggestion session: the query after the trigger is sent to a
//! [`SuggestionProvider`] after a debounce window, results show up in a
//! floating list placed next to the trigger, and picking an entry replaces
//! `trigger + query` with an atomic mention node.
//!
//! The entry point is [`PopupController`]. The host implements
//! [`MentionHost`] for its editing surface and [`PopupRenderer`] for the list
//! widget, then forwards edits ([`PopupController::handle_edit`]), keys
//! ([`PopupController::on_key_down`]) and provider responses
//! ([`PopupController::apply_response`]).

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod document;
pub mod host;
pub mod item;
pub mod list;
pub mod placement;
pub mod provider;
pub mod select;
pub mod trigger;

pub use config::{
  ConfigError,
  MentionConfig,
  TriggerConfig,
};
pub use controller::{
  PopupController,
  PopupState,
};
pub use dispatch::{
  QueryResponse,
  SessionId,
};
pub use document::{
  DocumentError,
  EditEvent,
  MentionDocument,
  MentionNode,
};
pub use host::{
  GridHost,
  MentionHost,
  PopupRenderer,
  PopupView,
};
pub use item::{
  MentionKind,
  MentionReference,
  SuggestionItem,
};
pub use list::{
  SuggestionListModel,
  SuggestionStatus,
};
pub use provider::{
  DynProvider,
  ProviderError,
  StaticProvider,
  SuggestionProvider,
  provider_fn,
};
pub use select::Key;
pub use trigger::SuggestionQuery;
