/*! Element type representing one node of the accessibility tree. */

use super::{Point, Rect, ScrollContainerInfo, Size, Visibility};
use crate::tree::UiHandle;
use serde::{Deserialize, Serialize};

/// A UI element captured at discovery time.
///
/// Elements are snapshots: every field except `handle` is read when the
/// walker visits the node, and the snapshot goes stale as soon as the
/// underlying UI changes. The handle stays live so later actions can
/// operate on the same OS node, but action code re-queries anything older
/// than a few hundred milliseconds.
///
/// The parent is carried as a role string only; storing the parent element
/// would create a cycle through the children references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
  /// Live handle to the underlying OS node. Not part of the wire shape and
  /// absent on deserialized elements.
  #[serde(skip)]
  pub handle: Option<UiHandle>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(
    rename = "accessibility_description",
    skip_serializing_if = "Option::is_none"
  )]
  pub description: Option<String>,
  /// Normalized role; never empty.
  pub role: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subrole: Option<String>,
  /// Current value in string form.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub value: Option<String>,

  /// Top-left corner in top-left-origin screen coordinates.
  pub position: Point,
  pub size: Size,

  /// Roles from the root to this node, inclusive.
  pub path: Vec<String>,
  /// 0 = root.
  pub depth: usize,

  /// Accessibility identifier (the DOM-id analogue). Unique within its
  /// window at a given instant, not stable across application states.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub identifier: Option<String>,
  /// Index among the parent's ordered children. Absent for hit-test roots.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sibling_index: Option<usize>,

  // Web-view DOM attributes, present only when the owning process exposes
  // them.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub dom_identifier: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub dom_class_list: Vec<String>,

  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_role: Option<String>,

  /// Serialized stable reference (`@id:…` / `@ref:…` / `@pos:…`).
  #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
  pub reference: Option<String>,

  // Post-traversal annotations.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub visibility: Option<Visibility>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub scroll_container: Option<ScrollContainerInfo>,
}

impl Element {
  /// Screen-space bounding rectangle.
  pub fn frame(&self) -> Rect {
    Rect::from_parts(self.position, self.size)
  }

  pub fn center(&self) -> Point {
    self.frame().center()
  }

  /// True when either dimension is zero: the element cannot be clicked,
  /// captured, or meaningfully scrolled to.
  pub fn is_zero_size(&self) -> bool {
    self.size.is_empty()
  }

  /// Display label captured at discovery time: title, then description,
  /// then value.
  pub fn label(&self) -> Option<&str> {
    self
      .title
      .as_deref()
      .or(self.description.as_deref())
      .or(self.value.as_deref())
  }

  /// Label for error messages; falls back to the role.
  pub fn describe(&self) -> String {
    match self.label() {
      Some(label) => format!("{} \"{label}\"", self.role),
      None => self.role.clone(),
    }
  }

  /// Whether the recorded visibility annotation says the element is fully
  /// inside its viewport.
  pub fn is_recorded_visible(&self) -> bool {
    self.visibility.is_some_and(|v| v.in_viewport)
  }
}
