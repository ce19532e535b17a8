//! Viewport aware popup placement.
//!
//! All inputs except the viewport's scroll offsets are viewport relative; the
//! returned [`PopupPlacement`] is document absolute.

/// Axis aligned rectangle in viewport coordinates (pixels).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
  pub left:   f32,
  pub top:    f32,
  pub width:  f32,
  pub height: f32,
}

impl Rect {
  pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
    Self {
      left,
      top,
      width,
      height,
    }
  }

  pub fn right(&self) -> f32 {
    self.left + self.width
  }

  pub fn bottom(&self) -> f32 {
    self.top + self.height
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
  pub width:  f32,
  pub height: f32,
}

impl Size {
  pub const fn new(width: f32, height: f32) -> Self {
    Self { width, height }
  }
}

/// Visible area of the host surface plus how far the document is scrolled.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
  pub width:    f32,
  pub height:   f32,
  pub scroll_x: f32,
  pub scroll_y: f32,
}

impl Viewport {
  pub const fn new(width: f32, height: f32) -> Self {
    Self {
      width,
      height,
      scroll_x: 0.0,
      scroll_y: 0.0,
    }
  }

  pub const fn with_scroll(mut self, scroll_x: f32, scroll_y: f32) -> Self {
    self.scroll_x = scroll_x;
    self.scroll_y = scroll_y;
    self
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementConfig {
  /// Distance between the anchor and the popup.
  pub gap:     f32,
  /// Minimum distance between the popup and the viewport's side edges.
  pub padding: f32,
}

impl Default for PlacementConfig {
  fn default() -> Self {
    Self {
      gap:     crate::config::DEFAULT_GAP,
      padding: crate::config::DEFAULT_PADDING,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PopupPlacement {
  pub top:  f32,
  pub left: f32,
}

/// Place a popup of `popup` size next to `anchor`.
///
/// The popup goes below the anchor, left aligned with it. It flips above the
/// anchor when it would overflow the bottom of the viewport, and shifts left
/// when it would overflow the right edge. A popup that fits nowhere is pinned
/// to the viewport's top-left corner and allowed to overlap the anchor.
pub fn place(
  anchor: Rect,
  popup: Size,
  viewport: Viewport,
  config: PlacementConfig,
) -> PopupPlacement {
  let below = anchor.bottom() + config.gap;
  let top = if below + popup.height > viewport.height {
    (anchor.top - popup.height - config.gap).max(0.0)
  } else {
    below
  };

  let mut left = anchor.left;
  let max_right = viewport.width - config.padding;
  if left + popup.width > max_right {
    left = (max_right - popup.width).max(config.padding);
  }
  let left = left.max(0.0);

  PopupPlacement {
    top:  top + viewport.scroll_y,
    left: left + viewport.scroll_x,
  }
}
