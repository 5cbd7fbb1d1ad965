/*!
Query evaluation over the accessibility forest.

Filters the traversal stream from the tree walker, producing a
[`SearchResult`] with the matched elements, the wall-clock duration, and
the count of nodes visited. Matched elements are annotated with their
viewport status and stamped with a stable reference before being returned.
*/

use crate::a11y::normalize_role;
use crate::desktop::Desktop;
use crate::reference::ElementReference;
use crate::tree::{Step, TreeWalker};
use crate::types::{
  Element, ElementQuery, Error, Permission, Result, SearchResult, DEFAULT_MAX_DEPTH,
};
use crate::viewport::Annotator;
use std::time::Instant;

/// Case-insensitive containment, relaxed to in-order subsequence when
/// `fuzzy` is set.
pub fn text_matches(needle: &str, haystack: &str, fuzzy: bool) -> bool {
  let needle = needle.to_lowercase();
  let haystack = haystack.to_lowercase();
  if haystack.contains(&needle) {
    return true;
  }
  fuzzy && is_subsequence(&needle, &haystack)
}

/// Whether every char of `needle` appears in `haystack` in order.
fn is_subsequence(needle: &str, haystack: &str) -> bool {
  let mut chars = needle.chars();
  let Some(mut current) = chars.next() else {
    return true;
  };
  for c in haystack.chars() {
    if c == current {
      match chars.next() {
        Some(next) => current = next,
        None => return true,
      }
    }
  }
  false
}

/// Whether `element` satisfies every predicate of `query`.
///
/// The application scope is resolved before traversal and is not checked
/// here.
pub fn matches(element: &Element, query: &ElementQuery) -> bool {
  if let Some(role) = &query.role {
    if element.role != normalize_role(role) {
      return false;
    }
  }

  if let Some(text) = &query.text {
    let candidates = [
      element.title.as_deref(),
      element.description.as_deref(),
      element.value.as_deref(),
    ];
    let hit = candidates
      .into_iter()
      .flatten()
      .any(|candidate| text_matches(text, candidate, query.fuzzy_match));
    if !hit {
      return false;
    }
  }

  if let Some(identifier) = &query.identifier {
    if element.identifier.as_deref() != Some(identifier.as_str()) {
      return false;
    }
  }

  if let Some(index) = query.sibling_index {
    if element.sibling_index != Some(index) {
      return false;
    }
  }

  if let Some(parent_role) = &query.parent_role {
    if element.parent_role.as_deref() != Some(normalize_role(parent_role).as_str()) {
      return false;
    }
  }

  let width = element.size.width;
  if query.min_width.is_some_and(|min| width < min)
    || query.max_width.is_some_and(|max| width > max)
  {
    return false;
  }
  let height = element.size.height;
  if query.min_height.is_some_and(|min| height < min)
    || query.max_height.is_some_and(|max| height > max)
  {
    return false;
  }

  true
}

/// Element search over a [`Desktop`].
#[derive(Clone, Copy)]
pub struct SearchEngine<'d> {
  desktop: &'d dyn Desktop,
}

impl std::fmt::Debug for SearchEngine<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SearchEngine").finish_non_exhaustive()
  }
}

impl<'d> SearchEngine<'d> {
  /// Engine over the given desktop.
  pub const fn new(desktop: &'d dyn Desktop) -> Self {
    Self { desktop }
  }

  /// Run `query` across the applications in scope.
  ///
  /// An application name that resolves to no running application yields an
  /// empty result; a missing accessibility grant is an error.
  pub fn find(&self, query: &ElementQuery) -> Result<SearchResult> {
    if !self.desktop.is_trusted() {
      return Err(Error::PermissionDenied(Permission::Accessibility));
    }

    let started = Instant::now();
    let mut elements: Vec<Element> = Vec::new();
    let mut searched_count = 0usize;

    let roots = match &query.application {
      Some(name) => match self.desktop.application_named(name) {
        Some(app) => self.desktop.application_root(app.pid).into_iter().collect(),
        None => {
          log::debug!("application '{name}' not running; returning empty result");
          Vec::new()
        }
      },
      None => self
        .desktop
        .applications()
        .into_iter()
        .filter_map(|app| self.desktop.application_root(app.pid))
        .collect(),
    };

    let max_depth = if query.max_depth == 0 {
      DEFAULT_MAX_DEPTH
    } else {
      query.max_depth
    };
    let walker = TreeWalker::new(max_depth);

    'apps: for root in roots {
      let mut done = false;
      searched_count += walker.traverse(&root, &mut |element| {
        if matches(element, query) {
          elements.push(element.clone());
          if query.limit > 0 && elements.len() >= query.limit {
            done = true;
            return Step::Stop;
          }
        }
        Step::Continue
      });
      if done {
        break 'apps;
      }
    }

    let mut annotator = Annotator::new(self.desktop);
    annotator.annotate_all(&mut elements);
    for element in &mut elements {
      element.reference = Some(ElementReference::for_element(element).encode());
    }

    let duration_ms = started.elapsed().as_millis() as u64;
    log::debug!(
      "query [{}] matched {} of {} nodes in {}ms",
      query.describe(),
      elements.len(),
      searched_count,
      duration_ms
    );

    Ok(SearchResult {
      elements,
      duration_ms,
      searched_count,
    })
  }

  /// First match for `query`, or [`Error::ElementNotFound`].
  pub fn find_first(&self, query: &ElementQuery) -> Result<Element> {
    let mut scoped = query.clone();
    if scoped.limit == 0 {
      scoped.limit = 1;
    }
    let mut result = self.find(&scoped)?;
    if result.elements.is_empty() {
      return Err(Error::ElementNotFound(query.describe()));
    }
    Ok(result.elements.remove(0))
  }
}

/// Size tolerance for re-query matching, in pixels per axis.
const REQUERY_SIZE_MARGIN: f64 = 5.0;

/// Re-find a previously discovered element after the UI may have changed.
///
/// Walks up to the element's application root, then matches on the
/// identifying attributes captured at discovery time: title, role,
/// identifier, sibling index, parent role, and size within ±5 px. Some web
/// views reorder focusable children while scrolling, so a second pass drops
/// the sibling index when the first finds nothing.
pub fn requery(element: &Element) -> Option<Element> {
  let handle = element.handle.as_ref()?;
  let root = application_root_of(handle)?;
  find_snapshot_match(&root, element, true)
    .or_else(|| find_snapshot_match(&root, element, false))
}

/// Nearest application-root ancestor, or the topmost reachable node.
pub(crate) fn application_root_of(handle: &crate::tree::UiHandle) -> Option<crate::tree::UiHandle> {
  let mut current = handle.clone();
  for _ in 0..crate::viewport::MAX_ANCESTOR_STEPS {
    if current.role().as_deref() == Some("AXApplication") {
      return Some(current);
    }
    match current.parent() {
      Some(parent) => current = parent,
      None => return Some(current),
    }
  }
  None
}

fn find_snapshot_match(
  root: &crate::tree::UiHandle,
  snapshot: &Element,
  match_sibling_index: bool,
) -> Option<Element> {
  let mut found = None;
  TreeWalker::new(DEFAULT_MAX_DEPTH).traverse(root, &mut |candidate| {
    if candidate.role != snapshot.role {
      return Step::Continue;
    }
    if snapshot.identifier.is_some() && candidate.identifier != snapshot.identifier {
      return Step::Continue;
    }
    if snapshot.title.is_some() && candidate.title != snapshot.title {
      return Step::Continue;
    }
    if match_sibling_index
      && snapshot.sibling_index.is_some()
      && candidate.sibling_index != snapshot.sibling_index
    {
      return Step::Continue;
    }
    if snapshot.parent_role.is_some() && candidate.parent_role != snapshot.parent_role {
      return Step::Continue;
    }
    if (candidate.size.width - snapshot.size.width).abs() > REQUERY_SIZE_MARGIN
      || (candidate.size.height - snapshot.size.height).abs() > REQUERY_SIZE_MARGIN
    {
      return Step::Continue;
    }
    found = Some(candidate.clone());
    Step::Stop
  });
  found
}
