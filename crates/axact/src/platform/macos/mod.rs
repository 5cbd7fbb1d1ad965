/*!
macOS backend: `AXUIElement` nodes, the workspace desktop, and display
queries.
*/

#![allow(unsafe_code)]

mod desktop;
mod node;

pub use desktop::MacDesktop;
pub(crate) use node::AxNode;

use crate::types::Rect;
use objc2_application_services::AXIsProcessTrusted;
use objc2_core_graphics::{CGDisplayBounds, CGMainDisplayID};

/// Whether this process holds the accessibility trust grant.
pub(crate) fn check_accessibility_trust() -> bool {
  unsafe { AXIsProcessTrusted() }
}

/// Bounds of the main display in top-left-origin coordinates.
pub(crate) fn main_display_bounds() -> Option<Rect> {
  let bounds = unsafe { CGDisplayBounds(CGMainDisplayID()) };
  if bounds.size.width <= 0.0 || bounds.size.height <= 0.0 {
    return None;
  }
  Some(Rect::new(
    bounds.origin.x,
    bounds.origin.y,
    bounds.size.width,
    bounds.size.height,
  ))
}
