use encore_mention::{
  PopupRenderer,
  PopupView,
  SuggestionListModel,
  SuggestionStatus,
  placement::Size,
};

const CELL_WIDTH: f32 = 8.0;
const ROW_HEIGHT: f32 = 16.0;

/// Prints every popup frame to stdout.
#[derive(Debug, Default)]
pub struct TextRenderer {
  frames: usize,
}

impl TextRenderer {
  pub fn frames(&self) -> usize {
    self.frames
  }

  fn draw(&mut self, view: &PopupView<'_>) {
    self.frames += 1;
    let model = view.model;
    let status = match model.status() {
      SuggestionStatus::Idle => "idle",
      SuggestionStatus::Querying => "loading",
      SuggestionStatus::Ready => "ready",
      SuggestionStatus::Empty => "no results",
      SuggestionStatus::Error => "error",
    };
    println!(
      "[{} {}{}] {status} at ({}, {})",
      view.kind, view.query.trigger, view.query.text, view.placement.left, view.placement.top
    );
    if let Some(message) = model.error_message() {
      println!("    ! {message}");
    }
    for index in model.visible_range() {
      let item = &model.items()[index];
      let marker = if index == model.selected_index() { '>' } else { ' ' };
      match &item.secondary_label {
        Some(secondary) => println!("  {marker} {}  {secondary}", item.label),
        None => println!("  {marker} {}", item.label),
      }
    }
  }
}

impl PopupRenderer for TextRenderer {
  type Target = ();

  fn measure(&mut self, model: &SuggestionListModel) -> Size {
    let widest = model
      .items()
      .iter()
      .map(|item| {
        let secondary = item.secondary_label.as_ref().map_or(0, |s| s.chars().count() + 2);
        item.label.chars().count() + secondary
      })
      .max()
      .unwrap_or(10);
    let rows = model.visible_range().len().max(1);
    Size::new((widest + 4) as f32 * CELL_WIDTH, rows as f32 * ROW_HEIGHT)
  }

  fn mount(&mut self, view: &PopupView<'_>) {
    self.draw(view);
  }

  fn update(&mut self, _target: &mut (), view: &PopupView<'_>) {
    self.draw(view);
  }

  fn unmount(&mut self, _target: ()) {
    println!("[closed]");
  }
}
