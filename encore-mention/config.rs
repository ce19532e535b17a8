//! Host-facing configuration.
//!
//! [`MentionConfig`] is the serializable surface (loadable from TOML, every
//! field defaulted). [`TriggerConfig`] is the runtime parameterization of the
//! engine for one mention kind: trigger character, provider and formatting.

use std::{
  fmt,
  fs,
  io,
  path::Path,
  time::Duration,
};

use serde::{
  Deserialize,
  Serialize,
};
use thiserror::Error;

use crate::{
  item::{
    MentionFormat,
    MentionKind,
  },
  placement::PlacementConfig,
  provider::DynProvider,
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_GAP: f32 = 8.0;
pub const DEFAULT_PADDING: f32 = 8.0;
pub const DEFAULT_MAX_VISIBLE_ITEMS: usize = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config: {0}")]
  Io(#[from] io::Error),
  #[error("failed to parse config: {0}")]
  Parse(#[from] toml::de::Error),
  #[error("trigger character {0:?} is configured for more than one mention kind")]
  DuplicateTrigger(char),
  #[error("trigger character for {0} mentions must not be whitespace")]
  WhitespaceTrigger(MentionKind),
  #[error("{kind} {field} must be empty or a single character, got {value:?}")]
  InvalidPrefix {
    kind:  MentionKind,
    field: &'static str,
    value: String,
  },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct MentionConfig {
  #[serde(with = "duration_ms")]
  pub debounce:          Duration,
  pub gap:               f32,
  pub padding:           f32,
  pub max_visible_items: usize,
  /// Cancel a provider call as soon as a newer query supersedes it. When
  /// disabled, superseded calls run to completion and their results are
  /// dropped on arrival.
  pub cancel_in_flight:  bool,
  /// Upper bound on a single provider call. `None` keeps the popup loading
  /// for as long as the provider takes.
  #[serde(with = "opt_duration_ms", skip_serializing_if = "Option::is_none")]
  pub provider_timeout:  Option<Duration>,
  pub triggers:          TriggersConfig,
}

impl Default for MentionConfig {
  fn default() -> Self {
    Self {
      debounce:          DEFAULT_DEBOUNCE,
      gap:               DEFAULT_GAP,
      padding:           DEFAULT_PADDING,
      max_visible_items: DEFAULT_MAX_VISIBLE_ITEMS,
      cancel_in_flight:  true,
      provider_timeout:  None,
      triggers:          TriggersConfig::default(),
    }
  }
}

impl MentionConfig {
  pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
    let config: MentionConfig = toml::from_str(source)?;
    config.validate()?;
    Ok(config)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let source = fs::read_to_string(path)?;
    Self::from_toml(&source)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    let person = self.triggers.resolve(MentionKind::Person)?;
    let performer = self.triggers.resolve(MentionKind::Performer)?;
    if person.0 == performer.0 {
      return Err(ConfigError::DuplicateTrigger(person.0));
    }
    Ok(())
  }

  pub fn placement(&self) -> PlacementConfig {
    PlacementConfig {
      gap:     self.gap,
      padding: self.padding,
    }
  }

  /// Build the runtime trigger configuration for `kind`, applying any
  /// overrides from `[triggers]`.
  pub fn trigger_config(
    &self,
    kind: MentionKind,
    provider: DynProvider,
  ) -> Result<TriggerConfig, ConfigError> {
    let (trigger, format) = self.triggers.resolve(kind)?;
    Ok(TriggerConfig {
      kind,
      trigger,
      format,
      provider,
    })
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct TriggersConfig {
  pub person:    TriggerOverride,
  pub performer: TriggerOverride,
}

impl TriggersConfig {
  fn resolve(&self, kind: MentionKind) -> Result<(char, MentionFormat), ConfigError> {
    let overrides = match kind {
      MentionKind::Person => &self.person,
      MentionKind::Performer => &self.performer,
    };
    let trigger = overrides.char.unwrap_or(default_trigger(kind));
    if trigger.is_whitespace() {
      return Err(ConfigError::WhitespaceTrigger(kind));
    }
    let mut format = MentionFormat::for_kind(kind);
    if let Some(prefix) = &overrides.markup_prefix {
      format.markup_prefix = parse_prefix(kind, "markup-prefix", prefix)?;
    }
    if let Some(prefix) = &overrides.plain_prefix {
      format.plain_prefix = parse_prefix(kind, "plain-prefix", prefix)?;
    }
    Ok((trigger, format))
  }
}

/// Per-kind overrides. Unset fields fall back to the kind's defaults; an empty
/// prefix string removes the prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct TriggerOverride {
  pub char:          Option<char>,
  pub markup_prefix: Option<String>,
  pub plain_prefix:  Option<String>,
}

pub const fn default_trigger(kind: MentionKind) -> char {
  match kind {
    MentionKind::Person => '@',
    MentionKind::Performer => '#',
  }
}

fn parse_prefix(
  kind: MentionKind,
  field: &'static str,
  value: &str,
) -> Result<Option<char>, ConfigError> {
  let mut chars = value.chars();
  match (chars.next(), chars.next()) {
    (None, _) => Ok(None),
    (Some(c), None) => Ok(Some(c)),
    _ => {
      Err(ConfigError::InvalidPrefix {
        kind,
        field,
        value: value.to_owned(),
      })
    },
  }
}

/// Engine parameterization for one mention kind.
#[derive(Clone)]
pub struct TriggerConfig {
  pub kind:     MentionKind,
  pub trigger:  char,
  pub format:   MentionFormat,
  pub provider: DynProvider,
}

impl TriggerConfig {
  pub fn new(kind: MentionKind, provider: DynProvider) -> Self {
    Self {
      kind,
      trigger: default_trigger(kind),
      format: MentionFormat::for_kind(kind),
      provider,
    }
  }

  pub fn person(provider: DynProvider) -> Self {
    Self::new(MentionKind::Person, provider)
  }

  pub fn performer(provider: DynProvider) -> Self {
    Self::new(MentionKind::Performer, provider)
  }

  pub fn with_trigger(mut self, trigger: char) -> Self {
    self.trigger = trigger;
    self
  }

  pub fn with_format(mut self, format: MentionFormat) -> Self {
    self.format = format;
    self
  }
}

impl fmt::Debug for TriggerConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TriggerConfig")
      .field("kind", &self.kind)
      .field("trigger", &self.trigger)
      .field("format", &self.format)
      .finish_non_exhaustive()
  }
}

mod duration_ms {
  use std::time::Duration;

  use serde::{
    Deserialize,
    Deserializer,
    Serializer,
  };

  pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    u64::deserialize(deserializer).map(Duration::from_millis)
  }
}

mod opt_duration_ms {
  use std::time::Duration;

  use serde::{
    Deserialize,
    Deserializer,
    Serializer,
  };

  pub fn serialize<S: Serializer>(
    value: &Option<Duration>,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    match value {
      Some(value) => serializer.serialize_some(&(value.as_millis() as u64)),
      None => serializer.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<Option<Duration>, D::Error> {
    Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
  }
}
