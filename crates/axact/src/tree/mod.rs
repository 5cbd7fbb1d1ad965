/*!
Accessibility tree access: the opaque node seam and the walker.

The engine never touches OS types directly. Platform code implements
[`UiNode`] (macOS wraps an `AXUIElement`); tests implement it over
in-memory trees. [`UiHandle`] is the cheap-clone, type-erased handle the
rest of the crate passes around and stores inside [`crate::Element`].
*/

mod walker;

pub use walker::{collect, materialize, traverse, Step, TreeWalker};

use crate::a11y::attr;
use crate::types::{Point, Rect, Result, Size};
use std::sync::Arc;

/// One node of the accessibility tree.
///
/// The accessibility API is fundamentally attribute-by-string lookup of
/// dynamically typed values; this trait narrows it to the typed reads the
/// engine needs. Absence is always `None`/empty, never an error; only the
/// mutating calls can fail.
pub trait UiNode: Send + Sync {
  /// Read a named string attribute. Scalar (numeric, boolean) values are
  /// rendered to their string form; empty strings read as `None`.
  fn string_attribute(&self, name: &str) -> Option<String>;

  /// Read a named point-typed geometry attribute.
  fn point_attribute(&self, name: &str) -> Option<Point>;

  /// Read a named size-typed geometry attribute.
  fn size_attribute(&self, name: &str) -> Option<Size>;

  /// Read a named string-list attribute (e.g. a DOM class list).
  fn string_list_attribute(&self, name: &str) -> Vec<String>;

  /// Read a named attribute holding another element.
  fn element_attribute(&self, name: &str) -> Option<UiHandle>;

  /// Read a named attribute holding an ordered element list.
  fn element_list_attribute(&self, name: &str) -> Vec<UiHandle>;

  /// Identity hash from the OS's identity function for opaque handles.
  ///
  /// The same logical element may be handed back as distinct wrappers on
  /// separate reads; this hash is stable across those wrappers. A collision
  /// costs a skipped subtree during traversal, which is a safe degradation.
  fn identity_hash(&self) -> u64;

  /// Names of the actions this element advertises.
  fn action_names(&self) -> Vec<String>;

  /// Perform a named action (e.g. press, show-menu, scroll-to-visible).
  fn perform(&self, action: &str) -> Result<()>;

  /// Set a string attribute (used for typing via the value attribute).
  fn set_string(&self, name: &str, value: &str) -> Result<()>;

  /// Set the focused attribute.
  fn set_focused(&self, focused: bool) -> Result<()>;

  /// Process id of the owning application, when the OS exposes it.
  fn pid(&self) -> Option<i32>;
}

/// Cheap-clone, type-erased handle to a [`UiNode`].
#[derive(Clone)]
pub struct UiHandle(Arc<dyn UiNode>);

impl UiHandle {
  /// Wrap a concrete node.
  pub fn new(node: impl UiNode + 'static) -> Self {
    Self(Arc::new(node))
  }

  /// Wrap an already-shared node.
  pub fn from_arc(node: Arc<dyn UiNode>) -> Self {
    Self(node)
  }

  /// Borrow the underlying node.
  pub fn node(&self) -> &dyn UiNode {
    &*self.0
  }

  /// Ordered children list.
  pub fn children(&self) -> Vec<UiHandle> {
    self.0.element_list_attribute(attr::CHILDREN)
  }

  /// Containing element, when one exists.
  pub fn parent(&self) -> Option<UiHandle> {
    self.0.element_attribute(attr::PARENT)
  }

  /// Role string, when readable.
  pub fn role(&self) -> Option<String> {
    self.0.string_attribute(attr::ROLE)
  }

  /// Screen-space bounding rectangle, when both geometry reads succeed.
  pub fn frame(&self) -> Option<Rect> {
    let position = self.0.point_attribute(attr::POSITION)?;
    let size = self.0.size_attribute(attr::SIZE)?;
    Some(Rect::from_parts(position, size))
  }

  /// Whether the element advertises the given action.
  pub fn advertises_action(&self, action: &str) -> bool {
    self.0.action_names().iter().any(|a| a == action)
  }
}

impl std::ops::Deref for UiHandle {
  type Target = dyn UiNode;

  fn deref(&self) -> &Self::Target {
    &*self.0
  }
}

impl std::fmt::Debug for UiHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_tuple("UiHandle")
      .field(&self.0.identity_hash())
      .finish()
  }
}

/// Equality by OS identity, matching how the walker deduplicates nodes.
impl PartialEq for UiHandle {
  fn eq(&self, other: &Self) -> bool {
    self.0.identity_hash() == other.0.identity_hash()
  }
}
