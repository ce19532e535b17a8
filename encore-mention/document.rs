//! In-memory mention document and the mention inserter.
//!
//! Text lives in a [`Rope`]. Every mention occupies exactly one
//! [`NODE_CHAR`] position, so the cursor can sit before or after a mention but
//! never inside it, and deleting that position removes the whole mention.
//! Node payloads are stored in document order: the n-th [`NODE_CHAR`] in the
//! text belongs to the n-th entry of `nodes`.
//!
//! Two projections are derived from the document: plain text, where mentions
//! become their plain form (`@label`, `#label`), and markup, where mentions
//! become `<span data-type="mention" ...>` elements.

use std::ops::Range;

use ropey::{
  Rope,
  RopeSlice,
};
use thiserror::Error;

use crate::{
  config::TriggerConfig,
  item::{
    MentionFormat,
    MentionReference,
    SuggestionItem,
  },
  trigger::SuggestionQuery,
};

/// Placeholder char for an atomic mention node (OBJECT REPLACEMENT CHARACTER).
pub const NODE_CHAR: char = '\u{FFFC}';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
  #[error("range {start}..{end} is out of bounds for a document of {len} chars")]
  OutOfBounds { start: usize, end: usize, len: usize },
  #[error("host rejected the mention: {0}")]
  Host(String),
}

/// An edit as observed by the trigger detector. Positions are char indices
/// into the document after the edit was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditEvent {
  Inserted { at: usize, text: String },
  Deleted { start: usize, end: usize },
  CursorMoved { to: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionNode {
  pub reference: MentionReference,
  pub format:    MentionFormat,
}

impl MentionNode {
  pub fn plain_text(&self) -> String {
    self.format.plain_text(&self.reference.label)
  }

  pub fn markup(&self) -> String {
    let reference = &self.reference;
    format!(
      r#"<span data-type="mention" data-kind="{}" data-id="{}" data-label="{}">{}</span>"#,
      reference.kind,
      escape(&reference.id),
      escape(&reference.label),
      escape(&self.format.markup_text(&reference.label)),
    )
  }
}

#[derive(Debug, Clone, Default)]
pub struct MentionDocument {
  text:   Rope,
  nodes:  Vec<MentionNode>,
  cursor: usize,
}

impl MentionDocument {
  pub fn new() -> Self {
    Self::default()
  }

  /// Document holding `text` with the cursor at its end. Stray node chars are
  /// dropped since they would have no payload.
  pub fn from_text(text: &str) -> Self {
    let text: String = text.chars().filter(|&c| c != NODE_CHAR).collect();
    let text = Rope::from(text);
    let cursor = text.len_chars();
    Self {
      text,
      nodes: Vec::new(),
      cursor,
    }
  }

  pub fn text(&self) -> RopeSlice<'_> {
    self.text.slice(..)
  }

  pub fn len_chars(&self) -> usize {
    self.text.len_chars()
  }

  pub fn cursor(&self) -> usize {
    self.cursor
  }

  pub fn mentions(&self) -> &[MentionNode] {
    &self.nodes
  }

  /// The mention occupying `pos`, if any.
  pub fn mention_at(&self, pos: usize) -> Option<&MentionNode> {
    if self.text.get_char(pos)? != NODE_CHAR {
      return None;
    }
    self.nodes.get(self.node_index(pos))
  }

  /// Insert `text` at the cursor and move the cursor past it.
  pub fn insert(&mut self, text: &str) -> EditEvent {
    let text: String = text.chars().filter(|&c| c != NODE_CHAR).collect();
    let at = self.cursor;
    self.text.insert(at, &text);
    self.cursor += text.chars().count();
    EditEvent::Inserted { at, text }
  }

  /// Backspace. Returns `None` at the start of the document.
  pub fn delete_backward(&mut self) -> Option<EditEvent> {
    let start = self.cursor.checked_sub(1)?;
    self.remove(start..self.cursor);
    self.cursor = start;
    Some(EditEvent::Deleted {
      start,
      end: start + 1,
    })
  }

  /// Delete the char after the cursor. Returns `None` at the end.
  pub fn delete_forward(&mut self) -> Option<EditEvent> {
    if self.cursor >= self.len_chars() {
      return None;
    }
    let start = self.cursor;
    self.remove(start..start + 1);
    Some(EditEvent::Deleted {
      start,
      end: start + 1,
    })
  }

  pub fn move_cursor(&mut self, to: usize) -> EditEvent {
    self.cursor = to.min(self.len_chars());
    EditEvent::CursorMoved { to: self.cursor }
  }

  /// Replace `range` with a single atomic node and place the cursor right
  /// after it. Returns the new cursor.
  pub fn replace_with_mention(
    &mut self,
    range: Range<usize>,
    node: MentionNode,
  ) -> Result<usize, DocumentError> {
    let len = self.len_chars();
    if range.start > range.end || range.end > len {
      return Err(DocumentError::OutOfBounds {
        start: range.start,
        end: range.end,
        len,
      });
    }
    self.remove(range.clone());
    let index = self.node_index(range.start);
    self.text.insert_char(range.start, NODE_CHAR);
    self.nodes.insert(index, node);
    self.cursor = range.start + 1;
    Ok(self.cursor)
  }

  pub fn to_plain_text(&self) -> String {
    let mut out = String::with_capacity(self.text.len_bytes());
    let mut nodes = self.nodes.iter();
    for c in self.text.chars() {
      if c == NODE_CHAR {
        if let Some(node) = nodes.next() {
          out.push_str(&node.plain_text());
        }
      } else {
        out.push(c);
      }
    }
    out
  }

  /// Markup projection: one `<p>` per line, text escaped, mentions as
  /// `span` elements carrying `data-kind`, `data-id` and `data-label`.
  pub fn to_markup(&self) -> String {
    let mut out = String::with_capacity(self.text.len_bytes() * 2);
    let mut nodes = self.nodes.iter();
    out.push_str("<p>");
    for c in self.text.chars() {
      match c {
        NODE_CHAR => {
          if let Some(node) = nodes.next() {
            out.push_str(&node.markup());
          }
        },
        '\n' => out.push_str("</p><p>"),
        '\r' => {},
        c => push_escaped(&mut out, c),
      }
    }
    out.push_str("</p>");
    out
  }

  fn remove(&mut self, range: Range<usize>) {
    if range.is_empty() {
      return;
    }
    let first = self.node_index(range.start);
    let removed = self
      .text
      .slice(range.clone())
      .chars()
      .filter(|&c| c == NODE_CHAR)
      .count();
    self.nodes.drain(first..first + removed);
    self.text.remove(range);
  }

  /// Number of nodes before `pos`, i.e. the index the node at `pos` has (or
  /// would have) in `nodes`.
  fn node_index(&self, pos: usize) -> usize {
    self
      .text
      .slice(..pos)
      .chars()
      .filter(|&c| c == NODE_CHAR)
      .count()
  }
}

fn push_escaped(out: &mut String, c: char) {
  match c {
    '&' => out.push_str("&amp;"),
    '<' => out.push_str("&lt;"),
    '>' => out.push_str("&gt;"),
    '"' => out.push_str("&quot;"),
    '\'' => out.push_str("&#39;"),
    c => out.push(c),
  }
}

fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
    push_escaped(&mut out, c);
  }
  out
}

/// Anything that can swap a text range for an atomic mention node.
pub trait MentionTarget {
  fn replace_with_mention(
    &mut self,
    range: Range<usize>,
    node: MentionNode,
  ) -> Result<usize, DocumentError>;
}

impl MentionTarget for MentionDocument {
  fn replace_with_mention(
    &mut self,
    range: Range<usize>,
    node: MentionNode,
  ) -> Result<usize, DocumentError> {
    MentionDocument::replace_with_mention(self, range, node)
  }
}

/// Commits a picked suggestion into the document.
#[derive(Debug, Default, Clone, Copy)]
pub struct MentionInserter;

impl MentionInserter {
  /// Replace the session's `trigger + query` span with a mention of `item`.
  pub fn commit(
    &self,
    target: &mut impl MentionTarget,
    query: &SuggestionQuery,
    trigger: &TriggerConfig,
    item: &SuggestionItem,
  ) -> Result<MentionReference, DocumentError> {
    let reference = MentionReference::from_item(trigger.kind, item);
    let node = MentionNode {
      reference: reference.clone(),
      format:    trigger.format,
    };
    let cursor = target.replace_with_mention(query.range(), node)?;
    tracing::debug!(
      kind = %reference.kind,
      id = %reference.id,
      cursor,
      "inserted mention"
    );
    Ok(reference)
  }
}
