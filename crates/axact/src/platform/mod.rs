/*!
Platform layer: OS bindings and coordinate conversion.

Screen coordinates in this crate are top-left origin. Collaborators that
speak bottom-left origin (window-level geometry, the trail overlay) convert
at this boundary; both helpers degrade to the identity when no display is
available to anchor the flip.
*/

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
pub use macos::MacDesktop;

use crate::types::Point;

/// Flip a top-left-origin point to bottom-left origin using the primary
/// display height. Returns the input unchanged when no display is
/// available.
pub fn to_bottom_left(point: Point) -> Point {
  match primary_display_height() {
    Some(height) => flip_vertical(point, height),
    None => point,
  }
}

/// Flip a bottom-left-origin point back to top-left origin. The flip is an
/// involution, so this is the same transform.
pub fn to_top_left(point: Point) -> Point {
  to_bottom_left(point)
}

pub(crate) fn flip_vertical(point: Point, display_height: f64) -> Point {
  Point::new(point.x, display_height - point.y)
}

#[cfg(target_os = "macos")]
fn primary_display_height() -> Option<f64> {
  macos::main_display_bounds().map(|bounds| bounds.height)
}

#[cfg(target_os = "macos")]
pub(crate) fn macos_trusted() -> bool {
  macos::check_accessibility_trust()
}

#[cfg(not(target_os = "macos"))]
fn primary_display_height() -> Option<f64> {
  None
}
