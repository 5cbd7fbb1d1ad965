/*!
Depth-first traversal of the accessibility tree.

Produces fully populated [`Element`] values with path, depth, and sibling
index. Cycle detection uses the OS identity hash of each handle: malformed
trees can hand back already-seen nodes through the parent/children
attributes, and in-process wrapper identity would not catch that because
the same logical element may arrive as distinct wrappers on separate reads.
*/

use super::UiHandle;
use crate::a11y::attr;
use crate::types::{Element, Point, Size};
use std::collections::HashSet;

/// Visitor verdict for each visited element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  /// Keep descending into this element's children.
  Continue,
  /// Skip this element's subtree but keep walking siblings.
  SkipChildren,
  /// Abort the whole traversal.
  Stop,
}

/// Depth-first walker over one accessibility tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeWalker {
  max_depth: usize,
}

struct Walk<'v> {
  visitor: &'v mut dyn FnMut(&Element) -> Step,
  visited: HashSet<u64>,
  visited_count: usize,
  max_depth: usize,
}

impl TreeWalker {
  pub const fn new(max_depth: usize) -> Self {
    Self { max_depth }
  }

  /// Walk the tree rooted at `root`, calling `visitor` for every element
  /// whose required attributes could be read. Returns the number of nodes
  /// visited.
  pub fn traverse(&self, root: &UiHandle, visitor: &mut dyn FnMut(&Element) -> Step) -> usize {
    let mut walk = Walk {
      visitor,
      visited: HashSet::new(),
      visited_count: 0,
      max_depth: self.max_depth,
    };
    walk.descend(root, &[], 0, None, root.parent().and_then(|p| p.role()));
    walk.visited_count
  }
}

impl Walk<'_> {
  /// Returns false when the traversal should abort entirely.
  fn descend(
    &mut self,
    handle: &UiHandle,
    parent_path: &[String],
    depth: usize,
    sibling_index: Option<usize>,
    parent_role: Option<String>,
  ) -> bool {
    if !self.visited.insert(handle.identity_hash()) {
      // Already seen: a cycle or a hash collision. Either way the subtree
      // is skipped, which is a safe degradation.
      log::trace!("skipping already-visited node at depth {depth}");
      return true;
    }

    // Role is the one required attribute; a node that cannot report it is
    // dropped along with its subtree.
    let Some(element) = build_element(handle, parent_path, depth, sibling_index, parent_role)
    else {
      log::trace!("skipping node with unreadable role at depth {depth}");
      return true;
    };
    self.visited_count += 1;

    let descend_children = match (self.visitor)(&element) {
      Step::Continue => true,
      Step::SkipChildren => false,
      Step::Stop => return false,
    };

    if !descend_children || depth >= self.max_depth {
      return true;
    }

    let role = element.role;
    let path = element.path;
    for (index, child) in handle.children().into_iter().enumerate() {
      if !self.descend(&child, &path, depth + 1, Some(index), Some(role.clone())) {
        return false;
      }
    }
    true
  }
}

/// Build an [`Element`] snapshot from a handle.
///
/// Returns `None` when the role attribute is unreadable. Every other
/// attribute is best-effort; geometry defaults to the origin on read
/// failure.
pub(crate) fn build_element(
  handle: &UiHandle,
  parent_path: &[String],
  depth: usize,
  sibling_index: Option<usize>,
  parent_role: Option<String>,
) -> Option<Element> {
  let role = handle.string_attribute(attr::ROLE)?;

  let position = handle.point_attribute(attr::POSITION).unwrap_or_default();
  let size = handle.size_attribute(attr::SIZE).unwrap_or_default();

  let mut path = Vec::with_capacity(parent_path.len() + 1);
  path.extend_from_slice(parent_path);
  path.push(role.clone());

  Some(Element {
    handle: Some(handle.clone()),
    title: handle.string_attribute(attr::TITLE),
    description: handle.string_attribute(attr::DESCRIPTION),
    subrole: handle.string_attribute(attr::SUBROLE),
    value: handle.string_attribute(attr::VALUE),
    identifier: handle.string_attribute(attr::IDENTIFIER),
    dom_identifier: handle.string_attribute(attr::DOM_IDENTIFIER),
    dom_class_list: handle.string_list_attribute(attr::DOM_CLASS_LIST),
    role,
    position: Point::new(position.x, position.y),
    size: Size::new(size.width.max(0.0), size.height.max(0.0)),
    path,
    depth,
    sibling_index,
    parent_role,
    reference: None,
    visibility: None,
    scroll_container: None,
  })
}

/// Materialize a handle alone, without walking its children.
///
/// Used for hit-test and focused-element results, where no sibling index is
/// defined.
pub fn materialize(handle: &UiHandle) -> Option<Element> {
  let parent_role = handle.parent().and_then(|p| p.role());
  build_element(handle, &[], 0, None, parent_role)
}

/// Collect every element under `root` (up to `max_depth`) passing `filter`.
pub fn collect(
  root: &UiHandle,
  max_depth: usize,
  filter: Option<&dyn Fn(&Element) -> bool>,
) -> Vec<Element> {
  let mut out = Vec::new();
  TreeWalker::new(max_depth).traverse(root, &mut |element| {
    if filter.is_none_or(|f| f(element)) {
      out.push(element.clone());
    }
    Step::Continue
  });
  out
}

/// Walk the tree rooted at `root` with the default depth bound.
pub fn traverse(root: &UiHandle, visitor: &mut dyn FnMut(&Element) -> Step) -> usize {
  TreeWalker::new(crate::types::DEFAULT_MAX_DEPTH).traverse(root, visitor)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testkit::FakeNode;
  use crate::types::Rect;

  fn small_tree() -> UiHandle {
    FakeNode::app("TestApp")
      .child(
        FakeNode::new("AXWindow")
          .with_frame(Rect::new(0.0, 0.0, 800.0, 600.0))
          .child(
            FakeNode::new("AXButton")
              .with_title("OK")
              .with_frame(Rect::new(10.0, 10.0, 80.0, 24.0)),
          )
          .child(
            FakeNode::new("AXButton")
              .with_title("Cancel")
              .with_frame(Rect::new(100.0, 10.0, 80.0, 24.0)),
          ),
      )
      .build()
  }

  #[test]
  fn paths_depths_and_sibling_indices() {
    let root = small_tree();
    let all = collect(&root, 10, None);
    assert_eq!(all.len(), 4);

    let app = &all[0];
    assert_eq!(app.role, "AXApplication");
    assert_eq!(app.depth, 0);
    assert_eq!(app.path, vec!["AXApplication"]);
    assert_eq!(app.sibling_index, None);

    let cancel = all.iter().find(|e| e.title.as_deref() == Some("Cancel")).unwrap();
    assert_eq!(cancel.depth, 2);
    assert_eq!(cancel.sibling_index, Some(1));
    assert_eq!(cancel.parent_role.as_deref(), Some("AXWindow"));
    assert_eq!(
      cancel.path,
      vec!["AXApplication", "AXWindow", "AXButton"]
    );
  }

  #[test]
  fn every_element_upholds_invariants() {
    let root = small_tree();
    for e in collect(&root, 10, None) {
      assert!(!e.role.is_empty());
      assert_eq!(e.path.last().unwrap(), &e.role);
      assert!(e.depth <= 10);
      assert!(e.size.width >= 0.0 && e.size.height >= 0.0);
    }
  }

  #[test]
  fn best_effort_attributes_are_captured() {
    let root = FakeNode::app("WebApp")
      .child(
        FakeNode::new("AXTextField")
          .with_subrole("AXSearchField")
          .with_description("site search")
          .with_value("query")
          .with_identifier("search")
          .with_attr(attr::DOM_IDENTIFIER, "search-box")
          .with_string_list(attr::DOM_CLASS_LIST, &["input", "large"])
          .with_frame(Rect::new(5.0, 5.0, 200.0, 24.0)),
      )
      .build();
    let field = collect(&root, 5, None).remove(1);
    assert_eq!(field.subrole.as_deref(), Some("AXSearchField"));
    assert_eq!(field.description.as_deref(), Some("site search"));
    assert_eq!(field.value.as_deref(), Some("query"));
    assert_eq!(field.identifier.as_deref(), Some("search"));
    assert_eq!(field.dom_identifier.as_deref(), Some("search-box"));
    assert_eq!(field.dom_class_list, vec!["input", "large"]);
  }

  #[test]
  fn unreadable_geometry_defaults_to_origin() {
    let root = FakeNode::app("App")
      .child(FakeNode::new("AXButton").with_title("NoFrame"))
      .build();
    let button = collect(&root, 5, None).remove(1);
    assert_eq!(button.position, crate::types::Point::new(0.0, 0.0));
    assert_eq!(button.size, crate::types::Size::new(0.0, 0.0));
  }

  #[test]
  fn max_depth_bounds_traversal() {
    let root = small_tree();
    let shallow = collect(&root, 1, None);
    assert_eq!(shallow.len(), 2); // app + window, buttons are at depth 2
  }

  #[test]
  fn roleless_nodes_are_dropped_with_their_subtree() {
    let root = FakeNode::app("TestApp")
      .child(FakeNode::new("").child(FakeNode::new("AXButton").with_title("hidden")))
      .child(FakeNode::new("AXButton").with_title("visible"))
      .build();
    let all = collect(&root, 10, None);
    let titles: Vec<_> = all.iter().filter_map(|e| e.title.as_deref()).collect();
    assert_eq!(titles, vec!["visible"]);
  }

  #[test]
  fn cycles_are_broken_by_identity() {
    let root = FakeNode::app("TestApp")
      .child(FakeNode::new("AXGroup").with_title("g"))
      .build_cyclic(); // group's child list points back at the root
    let all = collect(&root, 50, None);
    assert_eq!(all.len(), 2);
  }

  #[test]
  fn stop_aborts_traversal() {
    let root = small_tree();
    let mut seen = 0;
    let visited = TreeWalker::new(10).traverse(&root, &mut |_| {
      seen += 1;
      if seen == 2 {
        Step::Stop
      } else {
        Step::Continue
      }
    });
    assert_eq!(seen, 2);
    assert_eq!(visited, 2);
  }

  #[test]
  fn skip_children_prunes_subtree() {
    let root = small_tree();
    let mut roles = Vec::new();
    TreeWalker::new(10).traverse(&root, &mut |e| {
      roles.push(e.role.clone());
      if e.role == "AXWindow" {
        Step::SkipChildren
      } else {
        Step::Continue
      }
    });
    assert_eq!(roles, vec!["AXApplication", "AXWindow"]);
  }

  #[test]
  fn collect_matches_breadth_first_enumeration() {
    // Same set of elements regardless of visit order.
    let root = small_tree();
    let dfs: std::collections::HashSet<String> = collect(&root, 10, None)
      .into_iter()
      .map(|e| format!("{}:{}", e.depth, e.describe()))
      .collect();

    let mut bfs = std::collections::HashSet::new();
    let mut queue = std::collections::VecDeque::from([(root, 0usize)]);
    while let Some((handle, depth)) = queue.pop_front() {
      if let Some(e) = build_element(&handle, &[], depth, None, None) {
        bfs.insert(format!("{}:{}", depth, e.describe()));
      }
      if depth < 10 {
        for child in handle.children() {
          queue.push_back((child, depth + 1));
        }
      }
    }
    assert_eq!(dfs, bfs);
  }
}
