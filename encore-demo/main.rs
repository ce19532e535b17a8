//! Replays a keystroke script against the mention engine and prints the popup
//! frames and the resulting document.

mod catalog;
mod render;
mod script;

use std::{
  path::PathBuf,
  time::Duration,
};

use anyhow::{
  Context,
  Result,
};
use clap::Parser;
use encore_mention::{
  GridHost,
  MentionConfig,
  MentionDocument,
  MentionHost,
  MentionKind,
  PopupController,
  placement::Viewport,
  select::Key,
};

use crate::{
  catalog::Catalog,
  render::TextRenderer,
  script::Step,
};

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "encore-demo")]
#[command(about = "Replay a keystroke script against the mention engine")]
struct Cli {
  /// Engine config (TOML)
  #[arg(long)]
  config: Option<PathBuf>,

  /// People and performers catalog (TOML), a small builtin one otherwise
  #[arg(long)]
  catalog: Option<PathBuf>,

  /// Viewport width in pixels
  #[arg(long, default_value_t = 800.0)]
  width: f32,

  /// Viewport height in pixels
  #[arg(long, default_value_t = 600.0)]
  height: f32,

  /// Keys to replay, e.g. "hi @jo{wait}{down}{enter}"
  script: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  env_logger::init();
  let cli = Cli::parse();

  let config = match &cli.config {
    Some(path) => {
      MentionConfig::load(path).with_context(|| format!("loading {}", path.display()))?
    },
    None => MentionConfig::default(),
  };
  let catalog = match &cli.catalog {
    Some(path) => Catalog::load(path)?,
    None => Catalog::builtin(),
  };
  let steps = script::parse(&cli.script)?;

  let (people, performers) = catalog.into_providers();
  let triggers = vec![
    config.trigger_config(MentionKind::Person, people)?,
    config.trigger_config(MentionKind::Performer, performers)?,
  ];
  let mut controller = PopupController::new(&config, triggers, TextRenderer::default());
  let mut host = GridHost::new(
    MentionDocument::new(),
    8.0,
    16.0,
    Viewport::new(cli.width, cli.height),
  );

  for step in steps {
    let event = match step {
      Step::Type(c) => Some(host.insert(&c.to_string())),
      Step::Key(key) => {
        if controller.on_key_down(&mut host, key) {
          None
        } else {
          match key {
            Key::Enter => Some(host.insert("\n")),
            Key::Tab => Some(host.insert("\t")),
            _ => None,
          }
        }
      },
      Step::Backspace => host.delete_backward(),
      Step::Delete => host.delete_forward(),
      Step::Left => Some(host.move_cursor(host.cursor().saturating_sub(1))),
      Step::Right => Some(host.move_cursor(host.cursor() + 1)),
      Step::Wait => {
        if controller.session().is_none() {
          log::warn!("{{wait}} with no open popup, skipping");
          continue;
        }
        match tokio::time::timeout(RESPONSE_TIMEOUT, controller.next_response()).await {
          Ok(Some(response)) => {
            if !controller.apply_response(&host, response) {
              log::debug!("response was stale");
            }
          },
          Ok(None) => break,
          Err(_) => log::warn!("no provider response within {RESPONSE_TIMEOUT:?}"),
        }
        None
      },
    };
    if let Some(event) = event {
      controller.handle_edit(&host, &event);
    }
  }
  controller.on_exit();

  let document = host.document();
  println!();
  println!("plain:  {}", document.to_plain_text());
  println!("markup: {}", document.to_markup());
  log::info!("{} popup frames drawn", controller.renderer().frames());
  Ok(())
}
