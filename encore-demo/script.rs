//! Keystroke scripts: plain characters are typed, `{name}` tokens are
//! special keys.

use anyhow::{
  Result,
  bail,
};
use encore_mention::Key;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
  Type(char),
  Key(Key),
  Backspace,
  Delete,
  Left,
  Right,
  /// Wait for the next provider response and apply it.
  Wait,
}

pub fn parse(script: &str) -> Result<Vec<Step>> {
  let mut steps = Vec::new();
  let mut chars = script.chars();
  while let Some(c) = chars.next() {
    if c != '{' {
      steps.push(Step::Type(c));
      continue;
    }
    let name: String = chars.by_ref().take_while(|&c| c != '}').collect();
    let step = match name.as_str() {
      "" => Step::Type('{'),
      "up" => Step::Key(Key::ArrowUp),
      "down" => Step::Key(Key::ArrowDown),
      "enter" => Step::Key(Key::Enter),
      "esc" => Step::Key(Key::Escape),
      "tab" => Step::Key(Key::Tab),
      "bs" => Step::Backspace,
      "del" => Step::Delete,
      "left" => Step::Left,
      "right" => Step::Right,
      "wait" => Step::Wait,
      other => bail!("unknown key {{{other}}}"),
    };
    steps.push(step);
  }
  Ok(steps)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_text_and_keys() {
    let steps = parse("@jo{wait}{down}{enter}").unwrap();
    assert_eq!(steps, vec![
      Step::Type('@'),
      Step::Type('j'),
      Step::Type('o'),
      Step::Wait,
      Step::Key(Key::ArrowDown),
      Step::Key(Key::Enter),
    ]);
  }

  #[test]
  fn empty_braces_type_a_brace() {
    assert_eq!(parse("{}").unwrap(), vec![Step::Type('{')]);
  }

  #[test]
  fn unknown_key_is_an_error() {
    assert!(parse("{pgup}").is_err());
  }
}
