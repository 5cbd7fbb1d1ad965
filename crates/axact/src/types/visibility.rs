/*! Viewport visibility and scroll-container annotations.

Computed post-traversal by the viewport analyzer; carried on elements so
action code can decide whether a scroll is needed before touching them.
*/

use super::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Why an element is (or is not) inside its viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityReason {
  FullyVisible,
  PartiallyVisible,
  AboveViewport,
  BelowViewport,
  LeftOfViewport,
  RightOfViewport,
  OutsideWindow,
  ZeroSize,
  NoScrollContainer,
  Unknown,
}

/// Direction content must move to bring an element into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
  Up,
  Down,
  Left,
  Right,
}

impl ScrollDirection {
  pub const fn is_vertical(&self) -> bool {
    matches!(self, Self::Up | Self::Down)
  }
}

/// Scroll needed to land the element's center on the viewport's center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RequiresScroll {
  pub direction: ScrollDirection,
  pub estimated_pixels: f64,
}

/// Viewport status of an element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Visibility {
  pub in_viewport: bool,
  /// Fraction of the element's area inside the viewport, in [0, 1].
  pub percent_visible: f64,
  pub reason: VisibilityReason,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub requires_scroll: Option<RequiresScroll>,
}

impl Visibility {
  /// Annotation for a zero-area element. No scroll can help.
  pub const fn zero_size() -> Self {
    Self {
      in_viewport: false,
      percent_visible: 0.0,
      reason: VisibilityReason::ZeroSize,
      requires_scroll: None,
    }
  }

  pub const fn fully_visible() -> Self {
    Self {
      in_viewport: true,
      percent_visible: 1.0,
      reason: VisibilityReason::FullyVisible,
      requires_scroll: None,
    }
  }
}

/// The nearest scrollable ancestor of an annotated element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollContainerInfo {
  pub role: String,
  pub visible_frame: Rect,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub content_size: Option<Size>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub scroll_position: Option<Point>,
  pub can_scroll_up: bool,
  pub can_scroll_down: bool,
  pub can_scroll_left: bool,
  pub can_scroll_right: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reason_serializes_snake_case() {
    let json = serde_json::to_string(&VisibilityReason::BelowViewport).unwrap();
    assert_eq!(json, "\"below_viewport\"");
    let json = serde_json::to_string(&VisibilityReason::FullyVisible).unwrap();
    assert_eq!(json, "\"fully_visible\"");
  }

  #[test]
  fn requires_scroll_absent_when_fully_visible() {
    let v = Visibility::fully_visible();
    let json = serde_json::to_value(&v).unwrap();
    assert!(json.get("requires_scroll").is_none());
    assert_eq!(json["in_viewport"], true);
  }
}
