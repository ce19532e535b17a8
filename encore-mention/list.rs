use std::ops::Range;

use crate::{
  config::DEFAULT_MAX_VISIBLE_ITEMS,
  item::SuggestionItem,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SuggestionStatus {
  #[default]
  Idle,
  Querying,
  Ready,
  Empty,
  Error,
}

/// Candidate list for one session: items, status and the selected row.
///
/// `selected` is always `< items.len()` when there are items and is reset to
/// zero whenever the items are replaced. `scroll` keeps the selected row inside
/// a window of `max_visible` rows.
#[derive(Debug, Clone)]
pub struct SuggestionListModel {
  status:        SuggestionStatus,
  items:         Vec<SuggestionItem>,
  selected:      usize,
  scroll:        usize,
  max_visible:   usize,
  error_message: Option<String>,
}

impl Default for SuggestionListModel {
  fn default() -> Self {
    Self::new(DEFAULT_MAX_VISIBLE_ITEMS)
  }
}

impl SuggestionListModel {
  pub fn new(max_visible: usize) -> Self {
    Self {
      status:        SuggestionStatus::Idle,
      items:         Vec::new(),
      selected:      0,
      scroll:        0,
      max_visible:   max_visible.max(1),
      error_message: None,
    }
  }

  pub fn status(&self) -> SuggestionStatus {
    self.status
  }

  pub fn items(&self) -> &[SuggestionItem] {
    &self.items
  }

  pub fn selected_index(&self) -> usize {
    self.selected
  }

  pub fn error_message(&self) -> Option<&str> {
    self.error_message.as_deref()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  /// A query is in flight. Items from the previous result stay visible until
  /// the new one lands.
  pub fn set_loading(&mut self) {
    self.status = SuggestionStatus::Querying;
    self.error_message = None;
  }

  pub fn set_items(&mut self, items: Vec<SuggestionItem>) {
    self.status = if items.is_empty() {
      SuggestionStatus::Empty
    } else {
      SuggestionStatus::Ready
    };
    self.items = items;
    self.selected = 0;
    self.scroll = 0;
    self.error_message = None;
  }

  pub fn set_error(&mut self, message: impl Into<String>) {
    self.status = SuggestionStatus::Error;
    self.items.clear();
    self.selected = 0;
    self.scroll = 0;
    self.error_message = Some(message.into());
  }

  pub fn select_next(&mut self) {
    if self.items.is_empty() {
      return;
    }
    self.selected = (self.selected + 1) % self.items.len();
    self.clamp_scroll();
  }

  pub fn select_prev(&mut self) {
    if self.items.is_empty() {
      return;
    }
    self.selected = if self.selected == 0 {
      self.items.len() - 1
    } else {
      self.selected - 1
    };
    self.clamp_scroll();
  }

  pub fn selected_item(&self) -> Option<&SuggestionItem> {
    self.items.get(self.selected)
  }

  /// Rows a renderer should draw.
  pub fn visible_range(&self) -> Range<usize> {
    let end = (self.scroll + self.max_visible).min(self.items.len());
    self.scroll..end
  }

  fn clamp_scroll(&mut self) {
    if self.selected < self.scroll {
      self.scroll = self.selected;
    } else if self.selected >= self.scroll + self.max_visible {
      self.scroll = self.selected + 1 - self.max_visible;
    }
  }
}
