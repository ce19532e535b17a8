//! Trigger detection: decides when a suggestion session starts, continues or
//! ends based on edits to the document.

use std::ops::Range;

use ropey::RopeSlice;
use smallvec::SmallVec;

use crate::document::{
  EditEvent,
  NODE_CHAR,
};

/// The text typed after a trigger character, and where it sits.
///
/// `range_start` is the position of the trigger character and `range_end` the
/// exclusive end of the query word, so `range_start..range_end` is exactly the
/// span a committed mention replaces. `sequence` is stamped by the dispatcher
/// each time the query is sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionQuery {
  pub trigger:     char,
  pub text:        String,
  pub range_start: usize,
  pub range_end:   usize,
  pub sequence:    u64,
}

impl SuggestionQuery {
  pub fn range(&self) -> Range<usize> {
    self.range_start..self.range_end
  }

  /// The cursor counts as inside while it is anywhere from just before the
  /// trigger to just after the last query char.
  pub fn contains_cursor(&self, cursor: usize) -> bool {
    (self.range_start..=self.range_end).contains(&cursor)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerTransition {
  Start(SuggestionQuery),
  Update(SuggestionQuery),
  /// A new trigger was typed while a session was open. The old session must
  /// be torn down before the new one starts.
  Restart(SuggestionQuery),
  Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveTrigger {
  trigger: char,
  start:   usize,
}

#[derive(Debug, Clone)]
pub struct TriggerDetector {
  triggers: SmallVec<[char; 2]>,
  active:   Option<ActiveTrigger>,
}

impl TriggerDetector {
  pub fn new(triggers: impl IntoIterator<Item = char>) -> Self {
    Self {
      triggers: triggers.into_iter().collect(),
      active:   None,
    }
  }

  pub fn is_active(&self) -> bool {
    self.active.is_some()
  }

  /// Forget the open session without emitting a transition. Used when the
  /// session is closed from the outside (escape, commit).
  pub fn reset(&mut self) {
    self.active = None;
  }

  /// Feed one edit. `text` and `cursor` describe the document after the edit.
  pub fn observe(
    &mut self,
    text: RopeSlice<'_>,
    cursor: usize,
    event: &EditEvent,
  ) -> Option<TriggerTransition> {
    if let Some(started) = self.detect_start(text, event) {
      let restarted = self.active.replace(started).is_some();
      let query = query_at(text, started);
      return Some(if restarted {
        TriggerTransition::Restart(query)
      } else {
        TriggerTransition::Start(query)
      });
    }

    let active = self.active?;
    match self.follow(text, cursor, event, active) {
      Some(query) => {
        self.active = Some(ActiveTrigger {
          start: query.range_start,
          ..active
        });
        Some(TriggerTransition::Update(query))
      },
      None => {
        self.active = None;
        Some(TriggerTransition::Exit)
      },
    }
  }

  /// A configured trigger typed on its own, at the document start or after
  /// whitespace.
  fn detect_start(&self, text: RopeSlice<'_>, event: &EditEvent) -> Option<ActiveTrigger> {
    let EditEvent::Inserted { at, text: inserted } = event else {
      return None;
    };
    let mut chars = inserted.chars();
    let (Some(trigger), None) = (chars.next(), chars.next()) else {
      return None;
    };
    if !self.triggers.contains(&trigger) || text.get_char(*at) != Some(trigger) {
      return None;
    }
    at_word_start(text, *at).then_some(ActiveTrigger {
      trigger,
      start: *at,
    })
  }

  /// Track the open session through `event`. `None` means the session ends.
  fn follow(
    &self,
    text: RopeSlice<'_>,
    cursor: usize,
    event: &EditEvent,
    active: ActiveTrigger,
  ) -> Option<SuggestionQuery> {
    let mut start = active.start;
    match event {
      EditEvent::Inserted { at, text: inserted } => {
        if inserted.chars().any(char::is_whitespace) {
          return None;
        }
        if *at <= start {
          start += inserted.chars().count();
        }
      },
      EditEvent::Deleted { start: from, end: to } => {
        if *to <= start {
          start -= to - from;
        } else if *from <= start {
          // the trigger itself was removed
          return None;
        }
      },
      EditEvent::CursorMoved { .. } => {},
    }

    // the trigger must still sit on its own, not glued to a preceding word
    if text.get_char(start) != Some(active.trigger) || !at_word_start(text, start) {
      return None;
    }
    let query = query_at(text, ActiveTrigger { start, ..active });
    query.contains_cursor(cursor).then_some(query)
  }
}

/// Whether `pos` is at the document start or right after whitespace. A
/// mention node counts as a word.
fn at_word_start(text: RopeSlice<'_>, pos: usize) -> bool {
  match pos.checked_sub(1) {
    None => true,
    Some(before) => text.get_char(before).is_some_and(char::is_whitespace),
  }
}

fn query_at(text: RopeSlice<'_>, active: ActiveTrigger) -> SuggestionQuery {
  let body: String = text
    .chars_at(active.start + 1)
    .take_while(|&c| !c.is_whitespace() && c != NODE_CHAR)
    .collect();
  let range_end = active.start + 1 + body.chars().count();
  SuggestionQuery {
    trigger: active.trigger,
    text: body,
    range_start: active.start,
    range_end,
    sequence: 0,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::document::MentionDocument;

  struct Harness {
    doc:      MentionDocument,
    detector: TriggerDetector,
  }

  impl Harness {
    fn new(text: &str) -> Self {
      Self {
        doc:      MentionDocument::from_text(text),
        detector: TriggerDetector::new(['@', '#']),
      }
    }

    fn feed(&mut self, event: EditEvent) -> Option<TriggerTransition> {
      self
        .detector
        .observe(self.doc.text(), self.doc.cursor(), &event)
    }

    fn type_str(&mut self, text: &str) -> Option<TriggerTransition> {
      let mut last = None;
      for c in text.chars() {
        let event = self.doc.insert(&c.to_string());
        last = self.feed(event);
      }
      last
    }

    fn backspace(&mut self) -> Option<TriggerTransition> {
      let event = self.doc.delete_backward()?;
      self.feed(event)
    }

    fn move_to(&mut self, pos: usize) -> Option<TriggerTransition> {
      let event = self.doc.move_cursor(pos);
      self.feed(event)
    }
  }

  fn query(trigger: char, text: &str, start: usize) -> SuggestionQuery {
    SuggestionQuery {
      trigger,
      text: text.to_owned(),
      range_start: start,
      range_end: start + 1 + text.chars().count(),
      sequence: 0,
    }
  }

  #[test]
  fn trigger_at_document_start_opens_session() {
    let mut h = Harness::new("");
    assert_eq!(
      h.type_str("@"),
      Some(TriggerTransition::Start(query('@', "", 0)))
    );
    assert_eq!(
      h.type_str("jo"),
      Some(TriggerTransition::Update(query('@', "jo", 0)))
    );
  }

  #[test]
  fn trigger_after_word_char_is_ignored() {
    let mut h = Harness::new("mail");
    assert_eq!(h.type_str("@"), None);
    assert!(!h.detector.is_active());
  }

  #[test]
  fn trigger_after_space_opens_session() {
    let mut h = Harness::new("love ");
    assert_eq!(
      h.type_str("#rad"),
      Some(TriggerTransition::Update(query('#', "rad", 5)))
    );
  }

  #[test]
  fn unknown_trigger_is_ignored() {
    let mut h = Harness::new("");
    assert_eq!(h.type_str("$"), None);
  }

  #[test]
  fn whitespace_ends_session() {
    let mut h = Harness::new("");
    h.type_str("@jo");
    assert_eq!(h.type_str(" "), Some(TriggerTransition::Exit));
    assert_eq!(h.type_str("x"), None);
  }

  #[test]
  fn backspace_over_trigger_ends_session() {
    let mut h = Harness::new("hi ");
    h.type_str("@j");
    assert_eq!(
      h.backspace(),
      Some(TriggerTransition::Update(query('@', "", 3)))
    );
    assert_eq!(h.backspace(), Some(TriggerTransition::Exit));
  }

  #[test]
  fn cursor_leaving_range_ends_session() {
    let mut h = Harness::new("hi ");
    h.type_str("@jo");
    assert_eq!(
      h.move_to(4),
      Some(TriggerTransition::Update(query('@', "jo", 3)))
    );
    assert_eq!(h.move_to(2), Some(TriggerTransition::Exit));
  }

  #[test]
  fn edits_before_trigger_shift_the_range() {
    let mut h = Harness::new("ab  ");
    h.type_str("@jo");
    h.move_to(4);
    // removing one of the two spaces keeps the trigger on a word boundary
    assert_eq!(
      h.backspace(),
      Some(TriggerTransition::Update(query('@', "jo", 3)))
    );
    // removing the other glues it to "ab"
    assert_eq!(h.backspace(), Some(TriggerTransition::Exit));
  }

  #[test]
  fn typing_right_before_trigger_ends_session() {
    let mut h = Harness::new("ab ");
    h.type_str("@jo");
    h.move_to(3);
    assert_eq!(h.type_str("x"), Some(TriggerTransition::Exit));
    assert!(!h.detector.is_active());
    assert_eq!(h.doc.to_plain_text(), "ab x@jo");
  }

  #[test]
  fn new_trigger_at_range_start_restarts() {
    let mut h = Harness::new("");
    h.type_str("@jo");
    h.move_to(0);
    assert_eq!(
      h.type_str("#"),
      Some(TriggerTransition::Restart(query('#', "@jo", 0)))
    );
  }

  #[test]
  fn query_stops_at_whitespace() {
    let mut h = Harness::new(" tail");
    h.move_to(0);
    assert_eq!(
      h.type_str("@k"),
      Some(TriggerTransition::Update(query('@', "k", 0)))
    );
  }
}
