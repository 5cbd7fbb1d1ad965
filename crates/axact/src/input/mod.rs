/*!
Input-event dispatch.

[`EventDispatcher`] is the narrow, testable interface over the host's
trusted input-event API. The action layer and the scroll service only ever
talk to this trait; the macOS implementation posts `CGEvent`s at the HID
tap, and tests substitute a recording double.
*/

mod keymap;
#[cfg(target_os = "macos")]
mod macos;

pub use keymap::{keystroke_for_char, KeyStroke};
#[cfg(target_os = "macos")]
pub use macos::SystemDispatcher;

use crate::types::{Point, Result};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
  Left,
  Right,
  Middle,
}

/// Modifier flag set carried on keyboard events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
  pub shift: bool,
  pub control: bool,
  pub option: bool,
  pub command: bool,
}

impl Modifiers {
  /// No modifiers held.
  pub const NONE: Self = Self {
    shift: false,
    control: false,
    option: false,
    command: false,
  };

  /// Shift alone, for shifted characters.
  pub const SHIFT: Self = Self {
    shift: true,
    control: false,
    option: false,
    command: false,
  };

  /// True when no modifier is held.
  pub const fn is_empty(&self) -> bool {
    !self.shift && !self.control && !self.option && !self.command
  }
}

/// Trusted input-event sink.
///
/// Implementations post events that receiving applications cannot tell from
/// physical input. All calls are synchronous; event-creation failure
/// surfaces as [`crate::Error::EventCreationFailed`] with no retry.
pub trait EventDispatcher: Send + Sync {
  /// Move the pointer. Uses the display-level cursor warp so the visible
  /// cursor actually moves, then posts the matching trusted move event.
  fn mouse_move(&self, point: Point) -> Result<()>;

  fn mouse_down(&self, point: Point, button: MouseButton) -> Result<()>;

  fn mouse_up(&self, point: Point, button: MouseButton) -> Result<()>;

  /// Drag event: button held while the pointer moves to `point`.
  fn mouse_drag(&self, point: Point, button: MouseButton) -> Result<()>;

  /// Pixel-unit scroll at the current pointer position. Positive `wheel_y`
  /// moves content down under the OS's natural-scrolling convention.
  fn scroll(&self, wheel_x: f64, wheel_y: f64) -> Result<()>;

  fn key_down(&self, keycode: u16, modifiers: Modifiers) -> Result<()>;

  fn key_up(&self, keycode: u16, modifiers: Modifiers) -> Result<()>;

  /// Key press carrying a Unicode-string payload instead of a virtual
  /// keycode, for characters outside the keymap. Posts a down/up pair.
  fn key_text(&self, text: &str) -> Result<()>;
}
