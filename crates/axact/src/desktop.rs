/*!
Desktop-global accessibility entry points.

The engine's window onto the workspace: running applications, per-app
accessibility roots, the system-wide hit test, and the trust check. macOS
implements this over `NSWorkspace` + `AXUIElement`; tests implement it over
in-memory trees.
*/

use crate::a11y::attr;
use crate::tree::UiHandle;
use crate::types::{Point, Rect, Result};
use serde::{Deserialize, Serialize};

/// One running application with a regular activation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppInfo {
  pub pid: i32,
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bundle_id: Option<String>,
  pub frontmost: bool,
  pub hidden: bool,
}

/// Global operations the element engine needs from the host.
pub trait Desktop: Send + Sync {
  /// Whether this process holds the accessibility trust grant.
  fn is_trusted(&self) -> bool;

  /// Running applications with a regular activation policy.
  fn applications(&self) -> Vec<AppInfo>;

  /// Accessibility root element for a process.
  fn application_root(&self, pid: i32) -> Option<UiHandle>;

  /// System-wide hit test at screen coordinates.
  fn element_at(&self, x: f64, y: f64) -> Option<UiHandle>;

  /// The element currently holding keyboard focus, system-wide.
  fn focused_element(&self) -> Option<UiHandle>;

  /// Bounds of the main display. `None` when no display is available.
  fn main_display_bounds(&self) -> Option<Rect>;

  /// Current pointer position in screen coordinates, when readable.
  fn pointer_position(&self) -> Option<Point> {
    None
  }

  /// Bring an application to the front by process id.
  fn activate(&self, pid: i32) -> Result<()>;

  /// Look up a running application by localized name (case-insensitive).
  fn application_named(&self, name: &str) -> Option<AppInfo> {
    self
      .applications()
      .into_iter()
      .find(|app| app.name.eq_ignore_ascii_case(name))
  }

  /// The frontmost regular application, when one exists.
  fn frontmost_application(&self) -> Option<AppInfo> {
    self.applications().into_iter().find(|app| app.frontmost)
  }

  /// Window elements of an application, in the order the OS reports them.
  fn windows_of(&self, pid: i32) -> Vec<UiHandle> {
    self
      .application_root(pid)
      .map(|root| root.element_list_attribute(attr::WINDOWS))
      .unwrap_or_default()
  }
}
