/*!
Viewport visibility analysis.

For each element, finds the nearest scrollable ancestor, takes its frame as
the effective viewport (falling back to the enclosing window, then the main
display), and classifies how much of the element is rendered inside it.
When the element is out of view, the annotation carries the direction and
distance a scroll would need to cover.
*/

use crate::a11y::{attr, is_scrollable_role};
use crate::desktop::Desktop;
use crate::tree::UiHandle;
use crate::types::{
  Element, Point, Rect, RequiresScroll, ScrollContainerInfo, ScrollDirection, Size, Visibility,
  VisibilityReason,
};
use std::collections::HashMap;

/// Bound on the parent-chain walk, a guard against malformed trees.
pub(crate) const MAX_ANCESTOR_STEPS: usize = 50;

/// Intersection ratio treated as fully visible.
const FULLY_VISIBLE_RATIO: f64 = 0.99;

/// Scroll-bar fractions within this distance of an end stop count as
/// pinned.
const SCROLL_BAR_EPSILON: f64 = 0.01;

/// Nearest scrollable ancestor, with its introspected scroll state.
#[derive(Debug, Clone)]
pub(crate) struct ContainerRecord {
  pub(crate) handle: UiHandle,
  pub(crate) frame: Rect,
  pub(crate) info: ScrollContainerInfo,
}

#[derive(Debug, Clone)]
enum Resolution {
  Container(ContainerRecord),
  /// No scrollable ancestor; the nearest window frame when one exists.
  WindowOnly(Option<Rect>),
}

/// Batched visibility annotator.
///
/// Memoizes container resolution by handle identity so annotating many
/// siblings repeats neither the parent-chain walk, the frame read, nor the
/// scroll-bar introspection.
pub struct Annotator<'d> {
  desktop: &'d dyn Desktop,
  cache: HashMap<u64, Resolution>,
}

impl std::fmt::Debug for Annotator<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Annotator")
      .field("cached", &self.cache.len())
      .finish_non_exhaustive()
  }
}

impl<'d> Annotator<'d> {
  /// Annotator with an empty container cache.
  pub fn new(desktop: &'d dyn Desktop) -> Self {
    Self {
      desktop,
      cache: HashMap::new(),
    }
  }

  /// Annotate one element in place.
  pub fn annotate(&mut self, element: &mut Element) {
    if element.is_zero_size() {
      element.visibility = Some(Visibility::zero_size());
      element.scroll_container = None;
      return;
    }

    let Some(handle) = element.handle.clone() else {
      element.visibility = Some(Visibility {
        in_viewport: false,
        percent_visible: 0.0,
        reason: VisibilityReason::Unknown,
        requires_scroll: None,
      });
      return;
    };

    let resolution = self.resolve_container(&handle);
    let frame = element.frame();
    match resolution {
      Some(Resolution::Container(record)) => {
        element.visibility = Some(classify(frame, record.frame));
        element.scroll_container = Some(record.info);
      }
      Some(Resolution::WindowOnly(window_frame)) => {
        let (viewport, off_reason) = match window_frame {
          Some(frame) => (Some(frame), VisibilityReason::OutsideWindow),
          None => (
            self.desktop.main_display_bounds(),
            VisibilityReason::NoScrollContainer,
          ),
        };
        element.visibility = Some(match viewport {
          Some(viewport) => {
            let mut visibility = classify(frame, viewport);
            // Off-view with nothing to scroll gets the fallback reason
            // rather than a side.
            if visibility.percent_visible == 0.0 {
              visibility.reason = off_reason;
            }
            visibility
          }
          None => Visibility {
            in_viewport: false,
            percent_visible: 0.0,
            reason: VisibilityReason::Unknown,
            requires_scroll: None,
          },
        });
        element.scroll_container = None;
      }
      None => {
        element.visibility = Some(Visibility {
          in_viewport: false,
          percent_visible: 0.0,
          reason: VisibilityReason::Unknown,
          requires_scroll: None,
        });
        element.scroll_container = None;
      }
    }
  }

  /// Annotate a batch, sharing the container cache across elements.
  pub fn annotate_all(&mut self, elements: &mut [Element]) {
    for element in elements {
      self.annotate(element);
    }
  }

  /// The nearest scrollable ancestor of `handle`, for the scroll service.
  pub(crate) fn container_for(&mut self, handle: &UiHandle) -> Option<ContainerRecord> {
    match self.resolve_container(handle)? {
      Resolution::Container(record) => Some(record),
      Resolution::WindowOnly(_) => None,
    }
  }

  fn resolve_container(&mut self, handle: &UiHandle) -> Option<Resolution> {
    let mut chain: Vec<u64> = Vec::new();
    let mut window_frame: Option<Rect> = None;
    let mut current = handle.parent();
    let mut resolved: Option<Resolution> = None;

    for _ in 0..MAX_ANCESTOR_STEPS {
      let Some(ancestor) = current else {
        break;
      };
      let hash = ancestor.identity_hash();
      if let Some(cached) = self.cache.get(&hash) {
        resolved = Some(cached.clone());
        break;
      }
      chain.push(hash);

      let Some(role) = ancestor.role() else {
        current = ancestor.parent();
        continue;
      };
      if is_scrollable_role(&role) {
        if let Some(record) = self.build_record(&ancestor, &role) {
          resolved = Some(Resolution::Container(record));
          break;
        }
      }
      if role == "AXWindow" && window_frame.is_none() {
        window_frame = ancestor.frame();
      }
      if role == "AXApplication" {
        break;
      }
      current = ancestor.parent();
    }

    let resolution = resolved.unwrap_or(Resolution::WindowOnly(window_frame));
    match &resolution {
      Resolution::Container(_) => {
        // Every intermediate ancestor shares this container.
        for hash in chain {
          self.cache.insert(hash, resolution.clone());
        }
      }
      Resolution::WindowOnly(_) => {
        // A window may sit between deeper elements and the cached node, so
        // only the immediate parent is safe to memoize.
        if let Some(parent) = handle.parent() {
          self.cache.insert(parent.identity_hash(), resolution.clone());
        }
      }
    }
    Some(resolution)
  }

  fn build_record(&self, container: &UiHandle, role: &str) -> Option<ContainerRecord> {
    let frame = container.frame()?;
    let info = introspect_container(container, role, frame);
    Some(ContainerRecord {
      handle: container.clone(),
      frame,
      info,
    })
  }
}

/// Read a container's scroll bars and content extent.
///
/// One pass over the direct children: scroll bars contribute the
/// can-scroll booleans (a bar with no readable value is presumed movable in
/// both directions), the largest non-bar child is taken as the content
/// view.
fn introspect_container(container: &UiHandle, role: &str, frame: Rect) -> ScrollContainerInfo {
  let mut can_scroll_up = true;
  let mut can_scroll_down = true;
  let mut can_scroll_left = true;
  let mut can_scroll_right = true;
  let mut vertical_fraction: Option<f64> = None;
  let mut horizontal_fraction: Option<f64> = None;
  let mut content_size: Option<Size> = None;

  for child in container.children() {
    let Some(child_role) = child.role() else {
      continue;
    };
    if child_role == "AXScrollBar" {
      let fraction = child
        .string_attribute(attr::VALUE)
        .and_then(|v| v.parse::<f64>().ok());
      let vertical = child.string_attribute(attr::ORIENTATION).as_deref()
        != Some(attr::ORIENTATION_HORIZONTAL);
      if vertical {
        if let Some(value) = fraction {
          can_scroll_up = value > SCROLL_BAR_EPSILON;
          can_scroll_down = value < 1.0 - SCROLL_BAR_EPSILON;
          vertical_fraction = Some(value);
        }
      } else if let Some(value) = fraction {
        can_scroll_left = value > SCROLL_BAR_EPSILON;
        can_scroll_right = value < 1.0 - SCROLL_BAR_EPSILON;
        horizontal_fraction = Some(value);
      }
    } else if let Some(child_frame) = child.frame() {
      let bigger = content_size.is_none_or(|s| child_frame.area() > s.area());
      if bigger {
        content_size = Some(child_frame.size());
      }
    }
  }

  let scroll_position = content_size.map(|content| {
    let x = horizontal_fraction.unwrap_or(0.0) * (content.width - frame.width).max(0.0);
    let y = vertical_fraction.unwrap_or(0.0) * (content.height - frame.height).max(0.0);
    Point::new(x, y)
  });

  ScrollContainerInfo {
    role: role.to_string(),
    visible_frame: frame,
    content_size,
    scroll_position,
    can_scroll_up,
    can_scroll_down,
    can_scroll_left,
    can_scroll_right,
  }
}

/// Center-to-center deltas between an element frame and its viewport.
///
/// Positive y means the element's center sits below the viewport's center,
/// so content must scroll down to reach it.
pub(crate) fn center_deltas(frame: Rect, viewport: Rect) -> (f64, f64) {
  let element = frame.center();
  let target = viewport.center();
  (element.x - target.x, element.y - target.y)
}

/// Scroll requirement from center deltas: primary axis is the larger of
/// the two.
pub(crate) fn required_scroll(dx: f64, dy: f64) -> Option<RequiresScroll> {
  if dx == 0.0 && dy == 0.0 {
    return None;
  }
  let (direction, pixels) = if dy.abs() >= dx.abs() {
    (
      if dy > 0.0 {
        ScrollDirection::Down
      } else {
        ScrollDirection::Up
      },
      dy.abs(),
    )
  } else {
    (
      if dx > 0.0 {
        ScrollDirection::Right
      } else {
        ScrollDirection::Left
      },
      dx.abs(),
    )
  };
  Some(RequiresScroll {
    direction,
    estimated_pixels: pixels,
  })
}

/// Classify a non-zero-size frame against a viewport rect.
fn classify(frame: Rect, viewport: Rect) -> Visibility {
  if viewport.area() <= 0.0 || frame.area() <= 0.0 {
    return Visibility {
      in_viewport: false,
      percent_visible: 0.0,
      reason: VisibilityReason::Unknown,
      requires_scroll: None,
    };
  }

  let visible_area = viewport
    .intersection(&frame)
    .map(|r| r.area())
    .unwrap_or(0.0);
  let percent = (visible_area / frame.area()).clamp(0.0, 1.0);
  let (dx, dy) = center_deltas(frame, viewport);

  if percent >= FULLY_VISIBLE_RATIO {
    return Visibility::fully_visible();
  }

  if percent > 0.0 {
    return Visibility {
      in_viewport: false,
      percent_visible: percent,
      reason: VisibilityReason::PartiallyVisible,
      requires_scroll: required_scroll(dx, dy),
    };
  }

  // Entirely off-view: name the side where the element's center lies,
  // preferring the axis with the larger overshoot past the viewport edge.
  let center = frame.center();
  let beyond_x = if center.x < viewport.x {
    viewport.x - center.x
  } else {
    (center.x - viewport.max_x()).max(0.0)
  };
  let beyond_y = if center.y < viewport.y {
    viewport.y - center.y
  } else {
    (center.y - viewport.max_y()).max(0.0)
  };
  let reason = if beyond_y >= beyond_x {
    if center.y < viewport.y {
      VisibilityReason::AboveViewport
    } else {
      VisibilityReason::BelowViewport
    }
  } else if center.x < viewport.x {
    VisibilityReason::LeftOfViewport
  } else {
    VisibilityReason::RightOfViewport
  };

  Visibility {
    in_viewport: false,
    percent_visible: 0.0,
    reason,
    requires_scroll: required_scroll(dx, dy),
  }
}
