//! Keyboard navigation over a [`SuggestionListModel`].

use crate::{
  item::SuggestionItem,
  list::SuggestionListModel,
};

/// Keys the host forwards while a popup is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
  ArrowUp,
  ArrowDown,
  Enter,
  Escape,
  Tab,
  Char(char),
  Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
  /// Selection moved, the popup stays open.
  Moved,
  /// Commit the selected item, if any, and close.
  Commit(Option<SuggestionItem>),
  /// Close without touching the document.
  Cancel,
  /// Not ours; the host should apply its default behavior.
  Ignored,
}

impl KeyAction {
  /// Whether the host's default handling of the key must be suppressed.
  pub fn handled(&self) -> bool {
    !matches!(self, KeyAction::Ignored)
  }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SelectionController;

impl SelectionController {
  pub fn handle_key(&self, model: &mut SuggestionListModel, key: Key) -> KeyAction {
    match key {
      Key::ArrowUp => {
        model.select_prev();
        KeyAction::Moved
      },
      Key::ArrowDown => {
        model.select_next();
        KeyAction::Moved
      },
      Key::Enter => KeyAction::Commit(model.selected_item().cloned()),
      Key::Escape => KeyAction::Cancel,
      Key::Tab | Key::Char(_) | Key::Other => KeyAction::Ignored,
    }
  }
}
