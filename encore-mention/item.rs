use std::fmt;

use serde::{
  Deserialize,
  Serialize,
};

/// A candidate returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SuggestionItem {
  pub id:              String,
  pub label:           String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub secondary_label: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub avatar_url:      Option<String>,
}

impl SuggestionItem {
  pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
    Self {
      id:              id.into(),
      label:           label.into(),
      secondary_label: None,
      avatar_url:      None,
    }
  }

  pub fn with_secondary_label(mut self, secondary: impl Into<String>) -> Self {
    self.secondary_label = Some(secondary.into());
    self
  }

  pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
    self.avatar_url = Some(url.into());
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MentionKind {
  Person,
  Performer,
}

impl MentionKind {
  pub const ALL: [MentionKind; 2] = [MentionKind::Person, MentionKind::Performer];

  pub const fn as_str(self) -> &'static str {
    match self {
      MentionKind::Person => "person",
      MentionKind::Performer => "performer",
    }
  }
}

impl fmt::Display for MentionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The structured reference stored in a document in place of `trigger+query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionReference {
  pub kind:  MentionKind,
  pub id:    String,
  pub label: String,
}

impl MentionReference {
  pub fn from_item(kind: MentionKind, item: &SuggestionItem) -> Self {
    Self {
      kind,
      id: item.id.clone(),
      label: item.label.clone(),
    }
  }
}

/// Per-kind text rules for the two serialized projections of a mention.
///
/// Persons render `@label` in both markup and plain text while performers
/// render a bare `label` in markup and `#label` in plain text. The difference
/// is intentional and kept as data so hosts can override it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct MentionFormat {
  pub markup_prefix: Option<char>,
  pub plain_prefix:  Option<char>,
}

impl MentionFormat {
  pub const fn for_kind(kind: MentionKind) -> Self {
    match kind {
      MentionKind::Person => {
        Self {
          markup_prefix: Some('@'),
          plain_prefix:  Some('@'),
        }
      },
      MentionKind::Performer => {
        Self {
          markup_prefix: None,
          plain_prefix:  Some('#'),
        }
      },
    }
  }

  pub fn markup_text(&self, label: &str) -> String {
    prefixed(self.markup_prefix, label)
  }

  pub fn plain_text(&self, label: &str) -> String {
    prefixed(self.plain_prefix, label)
  }
}

fn prefixed(prefix: Option<char>, label: &str) -> String {
  let mut out = String::with_capacity(label.len() + 1);
  if let Some(prefix) = prefix {
    out.push(prefix);
  }
  out.push_str(label);
  out
}
