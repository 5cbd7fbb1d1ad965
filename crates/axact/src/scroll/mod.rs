/*!
Scroll-into-view service.

Brings a target element fully inside its scroll container using the least
intrusive mechanism that works: nothing when it is already visible, the
native scroll-to-visible action when the element advertises it, and
synthetic wheel events with position re-query otherwise.
*/

use crate::a11y::action;
use crate::desktop::Desktop;
use crate::input::EventDispatcher;
use crate::search::requery;
use crate::types::{
  Element, Error, Point, Rect, Result, ScrollIntoViewResult, ScrollMethod, Visibility,
};
use crate::viewport::{center_deltas, Annotator, ContainerRecord};
use std::time::Duration;
use tokio::time::Instant;

/// Tuning for the scroll-into-view loop.
#[derive(Debug, Clone, Copy)]
pub struct ScrollConfig {
  /// Synthetic-scroll iterations before giving up.
  pub max_attempts: u32,
  /// Wait after each posted scroll (and after the native action) for the
  /// UI to settle and the accessibility tree to update.
  pub settle: Duration,
  /// Wall-clock ceiling for the whole operation.
  pub hard_timeout: Duration,
  /// Deltas under this many pixels on both axes cannot make progress.
  pub min_step: f64,
  /// Kept back from the viewport extent when capping a delta, so one
  /// iteration cannot overshoot the target past the opposite edge.
  pub edge_margin: f64,
}

impl Default for ScrollConfig {
  fn default() -> Self {
    Self {
      max_attempts: 8,
      settle: Duration::from_millis(100),
      hard_timeout: Duration::from_secs(10),
      min_step: 5.0,
      edge_margin: 100.0,
    }
  }
}

/// Scroll-into-view over a [`Desktop`] and an [`EventDispatcher`].
pub struct Scroller<'a> {
  desktop: &'a dyn Desktop,
  dispatcher: &'a dyn EventDispatcher,
  config: ScrollConfig,
}

impl std::fmt::Debug for Scroller<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Scroller")
      .field("config", &self.config)
      .finish_non_exhaustive()
  }
}

impl<'a> Scroller<'a> {
  /// Scroller with default tuning.
  pub fn new(desktop: &'a dyn Desktop, dispatcher: &'a dyn EventDispatcher) -> Self {
    Self {
      desktop,
      dispatcher,
      config: ScrollConfig::default(),
    }
  }

  /// Replace the loop tuning.
  pub const fn with_config(mut self, config: ScrollConfig) -> Self {
    self.config = config;
    self
  }

  /// Make `element` fully visible inside its scroll container.
  pub async fn scroll_into_view(&self, element: &Element) -> Result<ScrollIntoViewResult> {
    let deadline = Instant::now() + self.config.hard_timeout;
    let started = Instant::now();

    let Some(handle) = element.handle.clone() else {
      return Err(Error::ElementNotFound(element.describe()));
    };

    // Already visible: nothing to do.
    if !element.is_zero_size() && self.current_visibility(element).in_viewport {
      return Ok(ScrollIntoViewResult {
        success: true,
        attempts: 0,
        final_position: Some(element.position),
        scrolled_by: Point::new(0.0, 0.0),
        method: ScrollMethod::None,
      });
    }

    // Native scroll-to-visible, when advertised.
    if handle.advertises_action(action::SCROLL_TO_VISIBLE) {
      match handle.perform(action::SCROLL_TO_VISIBLE) {
        Ok(()) => {
          tokio::time::sleep(self.config.settle).await;
          if let Some(fresh) = requery(element) {
            if self.current_visibility(&fresh).in_viewport {
              let scrolled_by = Point::new(
                element.center().x - fresh.center().x,
                element.center().y - fresh.center().y,
              );
              return Ok(ScrollIntoViewResult {
                success: true,
                attempts: 1,
                final_position: Some(fresh.position),
                scrolled_by,
                method: ScrollMethod::AxScrollToVisible,
              });
            }
          }
          log::debug!("native scroll-to-visible did not land the target; falling back");
        }
        Err(err) => {
          log::debug!("native scroll-to-visible rejected ({err}); falling back");
        }
      }
    }

    self
      .synthetic_scroll(element, started, deadline)
      .await
  }

  async fn synthetic_scroll(
    &self,
    element: &Element,
    started: Instant,
    deadline: Instant,
  ) -> Result<ScrollIntoViewResult> {
    let handle = element
      .handle
      .clone()
      .ok_or_else(|| Error::ElementNotFound(element.describe()))?;

    let mut annotator = Annotator::new(self.desktop);
    let Some(container) = annotator.container_for(&handle) else {
      return Err(Error::NoScrollContainer);
    };
    let viewport = scroll_host_frame(&container);

    // The pointer must sit over the scroll bars' host for wheel events to
    // reach it.
    self.dispatcher.mouse_move(viewport.center())?;

    let mut current = element.clone();
    let mut scrolled_by = Point::new(0.0, 0.0);

    for attempt in 1..=self.config.max_attempts {
      if Instant::now() >= deadline {
        return Err(Error::HardTimeout {
          elapsed_ms: started.elapsed().as_millis() as u64,
        });
      }

      let (dx, dy) = center_deltas(current.frame(), viewport);
      let step_x = cap_delta(dx, viewport.width, self.config.edge_margin);
      let step_y = cap_delta(dy, viewport.height, self.config.edge_margin);

      if step_x.abs() < self.config.min_step && step_y.abs() < self.config.min_step {
        // No meaningful movement left. Close enough counts; anything else
        // cannot be reached.
        let visibility = self.current_visibility(&current);
        if visibility.percent_visible > 0.0 {
          return Ok(ScrollIntoViewResult {
            success: visibility.in_viewport,
            attempts: attempt - 1,
            final_position: Some(current.position),
            scrolled_by,
            method: ScrollMethod::Synthetic,
          });
        }
        return Err(Error::NoProgress {
          attempts: attempt - 1,
        });
      }

      // Natural scrolling: content moves with the wheel, so the posted
      // delta is the negated desired content movement.
      self.dispatcher.scroll(-step_x, -step_y)?;
      scrolled_by.x += step_x;
      scrolled_by.y += step_y;

      tokio::time::sleep(self.config.settle).await;

      let Some(fresh) = requery(&current) else {
        return Err(Error::NoProgress { attempts: attempt });
      };
      current = fresh;

      if self.current_visibility(&current).in_viewport {
        return Ok(ScrollIntoViewResult {
          success: true,
          attempts: attempt,
          final_position: Some(current.position),
          scrolled_by,
          method: ScrollMethod::Synthetic,
        });
      }
    }

    Err(Error::MaxScrollAttemptsExceeded {
      attempts: self.config.max_attempts,
    })
  }

  /// Recorded visibility when present, otherwise freshly computed.
  fn current_visibility(&self, element: &Element) -> Visibility {
    if let Some(visibility) = element.visibility {
      return visibility;
    }
    let mut copy = element.clone();
    Annotator::new(self.desktop).annotate(&mut copy);
    copy.visibility.unwrap_or(Visibility::zero_size())
  }
}

/// Frame of the node synthetic scrolls should target.
///
/// A web area's scroll bars live on its wrapping scroll area; scroll there
/// when that parent exists.
fn scroll_host_frame(container: &ContainerRecord) -> Rect {
  if container.info.role == "AXWebArea" {
    if let Some(parent) = container.handle.parent() {
      if parent.role().as_deref() == Some("AXScrollArea") {
        if let Some(frame) = parent.frame() {
          return frame;
        }
      }
    }
  }
  container.frame
}

/// Clamp a desired content delta to the viewport extent minus the margin.
fn cap_delta(delta: f64, extent: f64, margin: f64) -> f64 {
  let cap = (extent - margin).max(1.0);
  delta.clamp(-cap, cap)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::search::SearchEngine;
  use crate::testkit::{DispatchedEvent, FakeDesktop, FakeHandle, FakeNode, RecordingDispatcher};
  use crate::types::ElementQuery;
  use std::sync::Arc;

  /// Scroll world: a (0,100)-(1200,900) scroll area with a target at
  /// y=2400. Wheel events shift the content group and everything in it.
  fn scroll_world() -> (FakeDesktop, Arc<RecordingDispatcher>, Element) {
    let (_root, handles) = FakeNode::app("ScrollApp")
      .with_frame(Rect::new(0.0, 0.0, 1200.0, 900.0))
      .child(
        FakeNode::new("AXWindow")
          .with_frame(Rect::new(0.0, 0.0, 1200.0, 900.0))
          .child(
            FakeNode::new("AXScrollArea")
              .with_frame(Rect::new(0.0, 100.0, 1200.0, 800.0))
              .child(
                FakeNode::new("AXGroup")
                  .with_frame(Rect::new(0.0, 100.0, 1200.0, 3000.0))
                  .child(
                    FakeNode::new("AXButton")
                      .with_title("Target")
                      .with_frame(Rect::new(800.0, 2400.0, 40.0, 20.0)),
                  ),
              ),
          ),
      )
      .build_indexed();

    let app = handles[0].clone();
    let group = handles[3].clone();
    let target = handles[4].clone();

    let desktop = FakeDesktop::new().with_app("ScrollApp", 1000, app.handle());
    let dispatcher = Arc::new(RecordingDispatcher::new());
    let content: Vec<FakeHandle> = vec![group, target];
    dispatcher.on_scroll(move |wheel_x, wheel_y| {
      // Natural scrolling: content moves with the wheel delta.
      for node in &content {
        node.shift_by(wheel_x, wheel_y);
      }
    });

    let engine = SearchEngine::new(&desktop);
    let element = engine
      .find_first(&ElementQuery::new().with_text("Target"))
      .unwrap();
    (desktop, dispatcher, element)
  }

  #[tokio::test(start_paused = true)]
  async fn synthetic_scroll_converges_on_offscreen_target() {
    let (desktop, dispatcher, element) = scroll_world();
    let scroller = Scroller::new(&desktop, &*dispatcher);
    let result = scroller.scroll_into_view(&element).await.unwrap();

    assert!(result.success);
    assert_eq!(result.method, ScrollMethod::Synthetic);
    assert!(result.attempts <= 8);
    // Element center was 1910 px below the viewport center; per-iteration
    // cap is 800 - 100 = 700.
    assert!((result.scrolled_by.y - 1910.0).abs() < 20.0);
    assert!(result.attempts >= 3);

    // Pointer was parked on the container center before any wheel event.
    let events = dispatcher.recorded();
    assert_eq!(
      events[0],
      DispatchedEvent::MouseMove(Point::new(600.0, 500.0))
    );
    assert!(matches!(events[1], DispatchedEvent::Scroll { .. }));

    // Wheel sign is the negated content delta.
    if let DispatchedEvent::Scroll { wheel_y, .. } = events[1] {
      assert_eq!(wheel_y, -700.0);
    }
  }

  #[tokio::test(start_paused = true)]
  async fn already_visible_returns_method_none() {
    let (desktop, dispatcher, mut element) = scroll_world();
    // Pretend it is on-screen.
    element.position = Point::new(100.0, 300.0);
    element.visibility = Some(Visibility::fully_visible());
    let scroller = Scroller::new(&desktop, &*dispatcher);
    let result = scroller.scroll_into_view(&element).await.unwrap();
    assert!(result.success);
    assert_eq!(result.method, ScrollMethod::None);
    assert_eq!(result.attempts, 0);
    assert!(dispatcher.recorded().is_empty());
  }

  #[tokio::test(start_paused = true)]
  async fn native_action_wins_when_it_lands_the_target() {
    let (_root, handles) = FakeNode::app("NativeApp")
      .with_frame(Rect::new(0.0, 0.0, 1200.0, 900.0))
      .child(
        FakeNode::new("AXWindow")
          .with_frame(Rect::new(0.0, 0.0, 1200.0, 900.0))
          .child(
            FakeNode::new("AXScrollArea")
              .with_frame(Rect::new(0.0, 100.0, 1200.0, 800.0))
              .child(
                FakeNode::new("AXButton")
                  .with_title("Target")
                  .with_actions(&[action::SCROLL_TO_VISIBLE])
                  .with_frame(Rect::new(800.0, 2400.0, 40.0, 20.0)),
              ),
          ),
      )
      .build_indexed();
    let app = handles[0].clone();
    let target = handles[3].clone();

    // Performing the action teleports the element into the viewport.
    {
      let target = target.clone();
      handles[3].on_perform(move |name| {
        assert_eq!(name, action::SCROLL_TO_VISIBLE);
        target.set_frame(Rect::new(800.0, 480.0, 40.0, 20.0));
        Ok(())
      });
    }

    let desktop = FakeDesktop::new().with_app("NativeApp", 1, app.handle());
    let dispatcher = RecordingDispatcher::new();
    let engine = SearchEngine::new(&desktop);
    let element = engine
      .find_first(&ElementQuery::new().with_text("Target"))
      .unwrap();

    let scroller = Scroller::new(&desktop, &dispatcher);
    let result = scroller.scroll_into_view(&element).await.unwrap();
    assert!(result.success);
    assert_eq!(result.method, ScrollMethod::AxScrollToVisible);
    assert_eq!(result.attempts, 1);
    assert!((result.scrolled_by.y - 1920.0).abs() < 1.0);
    // No synthetic wheel events were needed.
    assert!(dispatcher
      .recorded()
      .iter()
      .all(|e| !matches!(e, DispatchedEvent::Scroll { .. })));
  }

  #[tokio::test(start_paused = true)]
  async fn no_scroll_container_fails_fast() {
    let (_root, handles) = FakeNode::app("PlainApp")
      .with_frame(Rect::new(0.0, 0.0, 800.0, 600.0))
      .child(
        FakeNode::new("AXWindow")
          .with_frame(Rect::new(0.0, 0.0, 800.0, 600.0))
          .child(
            FakeNode::new("AXButton")
              .with_title("Out")
              .with_frame(Rect::new(2000.0, 10.0, 50.0, 20.0)),
          ),
      )
      .build_indexed();
    let desktop = FakeDesktop::new().with_app("PlainApp", 1, handles[0].handle());
    let dispatcher = RecordingDispatcher::new();
    let engine = SearchEngine::new(&desktop);
    let element = engine
      .find_first(&ElementQuery::new().with_text("Out"))
      .unwrap();

    let scroller = Scroller::new(&desktop, &dispatcher);
    let err = scroller.scroll_into_view(&element).await.unwrap_err();
    assert!(matches!(err, Error::NoScrollContainer));
  }

  #[tokio::test(start_paused = true)]
  async fn disappearing_element_reports_no_progress() {
    let (_root, handles) = FakeNode::app("FlakyApp")
      .with_frame(Rect::new(0.0, 0.0, 1200.0, 900.0))
      .child(
        FakeNode::new("AXWindow")
          .with_frame(Rect::new(0.0, 0.0, 1200.0, 900.0))
          .child(
            FakeNode::new("AXScrollArea")
              .with_frame(Rect::new(0.0, 100.0, 1200.0, 800.0))
              .child(
                FakeNode::new("AXButton")
                  .with_title("Ghost")
                  .with_frame(Rect::new(800.0, 2400.0, 40.0, 20.0)),
              ),
          ),
      )
      .build_indexed();
    let desktop = FakeDesktop::new().with_app("FlakyApp", 1, handles[0].handle());
    let dispatcher = RecordingDispatcher::new();

    // The first wheel event makes the element vanish from the tree.
    let doomed = handles[3].clone();
    dispatcher.on_scroll(move |_, _| doomed.remove_from_parent());

    let engine = SearchEngine::new(&desktop);
    let element = engine
      .find_first(&ElementQuery::new().with_text("Ghost"))
      .unwrap();

    let scroller = Scroller::new(&desktop, &dispatcher);
    let err = scroller.scroll_into_view(&element).await.unwrap_err();
    assert!(matches!(err, Error::NoProgress { attempts: 1 }));
  }

  #[tokio::test(start_paused = true)]
  async fn zero_deadline_surfaces_hard_timeout() {
    let (desktop, dispatcher, element) = scroll_world();
    let scroller = Scroller::new(&desktop, &*dispatcher).with_config(ScrollConfig {
      hard_timeout: Duration::ZERO,
      ..ScrollConfig::default()
    });
    let err = scroller.scroll_into_view(&element).await.unwrap_err();
    assert!(matches!(err, Error::HardTimeout { .. }));
  }

  #[tokio::test(start_paused = true)]
  async fn max_attempts_exceeded_when_content_never_moves() {
    let (_root, handles) = FakeNode::app("StuckApp")
      .with_frame(Rect::new(0.0, 0.0, 1200.0, 900.0))
      .child(
        FakeNode::new("AXWindow")
          .with_frame(Rect::new(0.0, 0.0, 1200.0, 900.0))
          .child(
            FakeNode::new("AXScrollArea")
              .with_frame(Rect::new(0.0, 100.0, 1200.0, 800.0))
              .child(
                FakeNode::new("AXButton")
                  .with_title("Stuck")
                  .with_frame(Rect::new(800.0, 2400.0, 40.0, 20.0)),
              ),
          ),
      )
      .build_indexed();
    let desktop = FakeDesktop::new().with_app("StuckApp", 1, handles[0].handle());
    // No scroll hook: wheel events change nothing.
    let dispatcher = RecordingDispatcher::new();
    let engine = SearchEngine::new(&desktop);
    let element = engine
      .find_first(&ElementQuery::new().with_text("Stuck"))
      .unwrap();

    let scroller = Scroller::new(&desktop, &dispatcher);
    let err = scroller.scroll_into_view(&element).await.unwrap_err();
    assert!(matches!(
      err,
      Error::MaxScrollAttemptsExceeded { attempts: 8 }
    ));
  }

  #[test]
  fn delta_capping() {
    assert_eq!(cap_delta(1910.0, 800.0, 100.0), 700.0);
    assert_eq!(cap_delta(-1910.0, 800.0, 100.0), -700.0);
    assert_eq!(cap_delta(50.0, 800.0, 100.0), 50.0);
    // Degenerate viewport still allows a 1 px step.
    assert_eq!(cap_delta(50.0, 50.0, 100.0), 1.0);
  }

  #[test]
  fn web_area_prefers_scroll_area_host() {
    let (_root, handles) = FakeNode::app("WebApp")
      .child(
        FakeNode::new("AXWindow")
          .with_frame(Rect::new(0.0, 0.0, 1000.0, 700.0))
          .child(
            FakeNode::new("AXScrollArea")
              .with_frame(Rect::new(0.0, 50.0, 1000.0, 650.0))
              .child(
                FakeNode::new("AXWebArea")
                  .with_frame(Rect::new(0.0, 52.0, 996.0, 648.0))
                  .child(
                    FakeNode::new("AXButton")
                      .with_title("Deep")
                      .with_frame(Rect::new(10.0, 2000.0, 40.0, 20.0)),
                  ),
              ),
          ),
      )
      .build_indexed();
    let desktop = FakeDesktop::new().with_app("WebApp", 1, handles[0].handle());
    let engine = SearchEngine::new(&desktop);
    let element = engine
      .find_first(&ElementQuery::new().with_text("Deep"))
      .unwrap();

    let mut annotator = Annotator::new(&desktop);
    let container = annotator
      .container_for(element.handle.as_ref().unwrap())
      .unwrap();
    assert_eq!(container.info.role, "AXWebArea");
    // Synthetic scrolls target the wrapping scroll area's frame.
    assert_eq!(
      scroll_host_frame(&container),
      Rect::new(0.0, 50.0, 1000.0, 650.0)
    );
  }
}
