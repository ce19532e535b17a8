use std::{
  fs,
  path::Path,
  sync::Arc,
};

use anyhow::{
  Context,
  Result,
};
use encore_mention::{
  DynProvider,
  StaticProvider,
  SuggestionItem,
};
use serde::Deserialize;

/// People and performers the demo suggests from.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Catalog {
  #[serde(default)]
  pub people:     Vec<SuggestionItem>,
  #[serde(default)]
  pub performers: Vec<SuggestionItem>,
}

impl Catalog {
  pub fn load(path: &Path) -> Result<Self> {
    let source = fs::read_to_string(path)
      .with_context(|| format!("failed to read catalog {}", path.display()))?;
    toml::from_str(&source).with_context(|| format!("invalid catalog {}", path.display()))
  }

  pub fn builtin() -> Self {
    Self {
      people:     vec![
        SuggestionItem::new("u1", "john").with_secondary_label("John Doe"),
        SuggestionItem::new("u2", "joanna").with_secondary_label("Joanna Smith"),
        SuggestionItem::new("u3", "jim"),
      ],
      performers: vec![
        SuggestionItem::new("p1", "Radiohead"),
        SuggestionItem::new("p2", "Lowborn"),
        SuggestionItem::new("p3", "Paradise Lost"),
      ],
    }
  }

  pub fn into_providers(self) -> (DynProvider, DynProvider) {
    (
      Arc::new(StaticProvider::new(self.people)),
      Arc::new(StaticProvider::new(self.performers)),
    )
  }
}
