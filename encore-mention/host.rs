//! What the engine needs from the surrounding editor.

use std::ops::Range;

use ropey::RopeSlice;

use crate::{
  document::{
    DocumentError,
    EditEvent,
    MentionDocument,
    MentionNode,
    MentionTarget,
  },
  item::MentionKind,
  list::SuggestionListModel,
  placement::{
    PopupPlacement,
    Rect,
    Size,
    Viewport,
  },
  trigger::SuggestionQuery,
};

/// The host editing surface.
///
/// The engine only reads the text around the cursor, asks where a char is on
/// screen and swaps a range for a mention node; it makes no other assumptions
/// about the document model.
pub trait MentionHost: MentionTarget {
  fn text(&self) -> RopeSlice<'_>;

  fn cursor(&self) -> usize;

  /// Viewport relative box of the char at `pos`, `None` if it is not laid
  /// out.
  fn anchor_rect(&self, pos: usize) -> Option<Rect>;

  fn viewport(&self) -> Viewport;
}

/// Everything a renderer needs to draw the popup.
#[derive(Debug, Clone, Copy)]
pub struct PopupView<'a> {
  pub kind:      MentionKind,
  pub query:     &'a SuggestionQuery,
  pub model:     &'a SuggestionListModel,
  pub placement: PopupPlacement,
}

/// Render target lifecycle for the floating list.
///
/// `unmount` consumes the target, so a target can never outlive its session.
pub trait PopupRenderer {
  type Target;

  /// Size of the popup for the current model.
  fn measure(&mut self, model: &SuggestionListModel) -> Size;

  fn mount(&mut self, view: &PopupView<'_>) -> Self::Target;

  fn update(&mut self, target: &mut Self::Target, view: &PopupView<'_>);

  fn unmount(&mut self, target: Self::Target);
}

/// A [`MentionDocument`] laid out on a fixed cell grid, one line per row.
///
/// Useful for terminal style hosts and for driving the engine in tests.
#[derive(Debug, Clone)]
pub struct GridHost {
  document:    MentionDocument,
  cell_width:  f32,
  cell_height: f32,
  viewport:    Viewport,
}

impl GridHost {
  pub fn new(
    document: MentionDocument,
    cell_width: f32,
    cell_height: f32,
    viewport: Viewport,
  ) -> Self {
    Self {
      document,
      cell_width,
      cell_height,
      viewport,
    }
  }

  pub fn document(&self) -> &MentionDocument {
    &self.document
  }

  pub fn set_viewport(&mut self, viewport: Viewport) {
    self.viewport = viewport;
  }

  pub fn insert(&mut self, text: &str) -> EditEvent {
    self.document.insert(text)
  }

  pub fn delete_backward(&mut self) -> Option<EditEvent> {
    self.document.delete_backward()
  }

  pub fn delete_forward(&mut self) -> Option<EditEvent> {
    self.document.delete_forward()
  }

  pub fn move_cursor(&mut self, to: usize) -> EditEvent {
    self.document.move_cursor(to)
  }
}

impl MentionTarget for GridHost {
  fn replace_with_mention(
    &mut self,
    range: Range<usize>,
    node: MentionNode,
  ) -> Result<usize, DocumentError> {
    self.document.replace_with_mention(range, node)
  }
}

impl MentionHost for GridHost {
  fn text(&self) -> RopeSlice<'_> {
    self.document.text()
  }

  fn cursor(&self) -> usize {
    self.document.cursor()
  }

  fn anchor_rect(&self, pos: usize) -> Option<Rect> {
    let text = self.document.text();
    if pos > text.len_chars() {
      return None;
    }
    let line = text.char_to_line(pos);
    let column = pos - text.line_to_char(line);
    Some(Rect::new(
      column as f32 * self.cell_width - self.viewport.scroll_x,
      line as f32 * self.cell_height - self.viewport.scroll_y,
      self.cell_width,
      self.cell_height,
    ))
  }

  fn viewport(&self) -> Viewport {
    self.viewport
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anchor_follows_line_and_column() {
    let host = GridHost::new(
      MentionDocument::from_text("first\nsecond @x"),
      8.0,
      16.0,
      Viewport::new(400.0, 300.0).with_scroll(0.0, 16.0),
    );
    assert_eq!(host.anchor_rect(13), Some(Rect::new(56.0, 0.0, 8.0, 16.0)));
    assert_eq!(host.anchor_rect(2), Some(Rect::new(16.0, -16.0, 8.0, 16.0)));
    assert_eq!(host.anchor_rect(99), None);
  }
}
