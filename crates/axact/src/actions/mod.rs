/*!
Element actions: click, type, read, capture, drag, scroll.

[`Driver`] composes the lower layers (search for re-query, the viewport
analyzer for visibility, the scroll service for off-screen targets, the
motion planner for humanized trajectories, the event dispatcher for
trusted input) into the user-visible operations.
*/

use crate::a11y::attr;
use crate::desktop::Desktop;
use crate::input::{keystroke_for_char, EventDispatcher, Modifiers, MouseButton};
use crate::motion::{humanized_path, MotionConfig};
use crate::scroll::{ScrollConfig, Scroller};
use crate::search::{requery, SearchEngine};
use crate::tree::UiHandle;
use crate::types::{
  Element, ElementQuery, Error, Permission, Point, Rect, Result, ScrollDirection,
  ScrollIntoViewResult, SearchResult,
};
use crate::viewport::Annotator;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Inclusive delay band sampled per use.
#[derive(Debug, Clone, Copy)]
pub struct DelayRange {
  pub min: Duration,
  pub max: Duration,
}

impl DelayRange {
  /// Band between `min` and `max` milliseconds.
  pub const fn from_millis(min: u64, max: u64) -> Self {
    Self {
      min: Duration::from_millis(min),
      max: Duration::from_millis(max),
    }
  }

  fn sample(&self, rng: &mut impl Rng) -> Duration {
    if self.max <= self.min {
      return self.min;
    }
    let span = (self.max - self.min).as_secs_f64();
    self.min + Duration::from_secs_f64(rng.random_range(0.0..span))
  }
}

/// Timing and behavior knobs for the action layer.
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
  pub motion: MotionConfig,
  pub scroll: ScrollConfig,
  /// Wait after activating the owning application.
  pub activation_settle: Duration,
  /// Button hold between down and up on a click.
  pub click_dwell: DelayRange,
  /// Wait between a focus request and the first value write.
  pub focus_settle: Duration,
  /// Wait between setting the value attribute and reading it back.
  pub value_settle: Duration,
  /// Hold between key-down and key-up.
  pub key_hold: DelayRange,
  /// Gap between consecutive key presses.
  pub key_gap: DelayRange,
  /// Button hold on the drag source before moving.
  pub drag_hold: Duration,
  /// Drag interpolation frame interval (~60 Hz).
  pub drag_frame: Duration,
}

impl Default for DriverConfig {
  fn default() -> Self {
    Self {
      motion: MotionConfig::default(),
      scroll: ScrollConfig::default(),
      activation_settle: Duration::from_millis(50),
      click_dwell: DelayRange::from_millis(50, 150),
      focus_settle: Duration::from_millis(200),
      value_settle: Duration::from_millis(50),
      key_hold: DelayRange::from_millis(20, 60),
      key_gap: DelayRange::from_millis(30, 80),
      drag_hold: Duration::from_millis(50),
      drag_frame: Duration::from_millis(16),
    }
  }
}

/// Per-click options.
#[derive(Debug, Clone, Copy)]
pub struct ClickOptions {
  pub button: MouseButton,
  /// Trace a humanized trajectory instead of warping straight to the
  /// target.
  pub humanize: bool,
  /// Scroll off-screen targets into view before clicking.
  pub auto_scroll: bool,
}

impl Default for ClickOptions {
  fn default() -> Self {
    Self {
      button: MouseButton::Left,
      humanize: true,
      auto_scroll: true,
    }
  }
}

/// How a drag travels from source to destination.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragMode {
  /// One drag event straight to the destination.
  Direct,
  /// Linear interpolation over the given duration at the drag frame rate,
  /// anchored to the wall clock so drift does not accumulate.
  Interpolated { duration: Duration },
  /// Humanized trajectory emitted as drag events.
  Humanized,
}

/// Where a scroll-here gesture points.
#[derive(Debug, Clone)]
pub enum ScrollTarget {
  /// A literal screen coordinate.
  At(Point),
  /// The center of the scrollable ancestor of an element.
  Container(Element),
}

/// Scroll magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollAmount {
  /// Viewport pages (90 % of the viewport extent each).
  Pages(f64),
  Pixels(f64),
}

/// Fraction of the viewport extent one page covers.
const PAGE_FRACTION: f64 = 0.9;

/// Outcome of a scroll-here gesture.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScrollOutcome {
  pub direction: ScrollDirection,
  /// Pixels posted.
  pub amount: f64,
}

/// Region-capture collaborator (the vision pipeline owns the
/// implementation).
pub trait ScreenCapture: Send + Sync {
  /// Capture the given screen region.
  fn capture_region(&self, region: Rect) -> Result<CaptureImage>;
}

/// A captured image handed back by the capture collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureImage {
  pub width: u32,
  pub height: u32,
  pub data: Vec<u8>,
}

/// Debug-overlay sink for pointer trail points. Implementations forward to
/// their own UI loop; the driver never blocks on them.
pub trait TrailSink: Send + Sync {
  /// Record one pointer position.
  fn push(&self, point: Point);
}

/// The element action layer.
pub struct Driver {
  desktop: Arc<dyn Desktop>,
  dispatcher: Arc<dyn EventDispatcher>,
  capture: Option<Arc<dyn ScreenCapture>>,
  trail: Option<Arc<dyn TrailSink>>,
  config: DriverConfig,
}

impl std::fmt::Debug for Driver {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Driver")
      .field("config", &self.config)
      .finish_non_exhaustive()
  }
}

impl Driver {
  /// Driver over explicit collaborators (tests inject fakes here).
  pub fn new(desktop: Arc<dyn Desktop>, dispatcher: Arc<dyn EventDispatcher>) -> Self {
    Self {
      desktop,
      dispatcher,
      capture: None,
      trail: None,
      config: DriverConfig::default(),
    }
  }

  /// Driver over the live OS desktop and HID event tap.
  #[cfg(target_os = "macos")]
  pub fn system() -> Result<Self> {
    let desktop = crate::platform::MacDesktop::new()?;
    Ok(Self::new(
      Arc::new(desktop),
      Arc::new(crate::input::SystemDispatcher::new()?),
    ))
  }

  /// Replace the timing and behavior configuration.
  pub fn with_config(mut self, config: DriverConfig) -> Self {
    self.config = config;
    self
  }

  /// Attach the screen-capture collaborator.
  pub fn with_capture(mut self, capture: Arc<dyn ScreenCapture>) -> Self {
    self.capture = Some(capture);
    self
  }

  /// Attach the trail-overlay sink.
  pub fn with_trail(mut self, trail: Arc<dyn TrailSink>) -> Self {
    self.trail = Some(trail);
    self
  }

  /// The desktop this driver operates on.
  pub fn desktop(&self) -> &dyn Desktop {
    &*self.desktop
  }

  /// Search engine over this driver's desktop.
  pub fn engine(&self) -> SearchEngine<'_> {
    SearchEngine::new(&*self.desktop)
  }

  /// Run a query across the applications in scope.
  pub fn find(&self, query: &ElementQuery) -> Result<SearchResult> {
    self.engine().find(query)
  }

  /// First match for a query, or [`Error::ElementNotFound`].
  pub fn find_first(&self, query: &ElementQuery) -> Result<Element> {
    self.engine().find_first(query)
  }

  fn ensure_trusted(&self) -> Result<()> {
    if self.desktop.is_trusted() {
      Ok(())
    } else {
      Err(Error::PermissionDenied(Permission::Accessibility))
    }
  }

  /// Click an element.
  ///
  /// Off-screen or zero-size targets are scrolled into view first (unless
  /// disabled), then re-queried so the click lands on fresh coordinates.
  /// Returns the element actually clicked.
  pub async fn click(&self, element: &Element, options: ClickOptions) -> Result<Element> {
    self.ensure_trusted()?;

    let target = if options.auto_scroll && self.needs_scroll(element) {
      self.scroll_to_element(element).await?;
      requery(element).ok_or_else(|| Error::ElementNotFound(element.describe()))?
    } else {
      element.clone()
    };

    if target.is_zero_size() {
      return Err(Error::ElementNotVisible(target.describe()));
    }

    self.activate_owner(&target).await?;

    let center = target.center();
    self.move_pointer(center, options.humanize, target.size.width).await?;

    let dwell = self.config.click_dwell.sample(&mut rand::rng());
    self.dispatcher.mouse_down(center, options.button)?;
    tokio::time::sleep(dwell).await;
    self.dispatcher.mouse_up(center, options.button)?;

    Ok(target)
  }

  /// Type text into an element.
  ///
  /// Clicks to focus, sets the focused attribute, then tries the value
  /// attribute directly; when the read-back does not stick, falls back to
  /// per-character keystrokes with humanized gaps.
  pub async fn type_text(&self, element: &Element, text: &str) -> Result<()> {
    self.ensure_trusted()?;

    let target = self.click(element, ClickOptions::default()).await?;
    let handle = target
      .handle
      .clone()
      .ok_or_else(|| Error::ElementNotFound(target.describe()))?;

    if let Err(err) = handle.set_focused(true) {
      log::debug!("focus attribute rejected ({err}); relying on the click");
    }
    tokio::time::sleep(self.config.focus_settle).await;

    if handle.set_string(attr::VALUE, text).is_ok() {
      tokio::time::sleep(self.config.value_settle).await;
      if handle.string_attribute(attr::VALUE).as_deref() == Some(text) {
        return Ok(());
      }
      log::debug!("value write did not stick; falling back to keystrokes");
    }

    self.send_keystrokes(text).await
  }

  async fn send_keystrokes(&self, text: &str) -> Result<()> {
    let mut first = true;
    for c in text.chars() {
      if !first {
        let gap = self.config.key_gap.sample(&mut rand::rng());
        tokio::time::sleep(gap).await;
      }
      first = false;

      match keystroke_for_char(c) {
        Some(stroke) => {
          let modifiers = if stroke.shift {
            Modifiers::SHIFT
          } else {
            Modifiers::NONE
          };
          let hold = self.config.key_hold.sample(&mut rand::rng());
          self.dispatcher.key_down(stroke.keycode, modifiers)?;
          tokio::time::sleep(hold).await;
          self.dispatcher.key_up(stroke.keycode, modifiers)?;
        }
        None => {
          // Outside the keymap: post the character as a Unicode payload.
          let mut buffer = [0u8; 4];
          self.dispatcher.key_text(c.encode_utf8(&mut buffer))?;
        }
      }
    }
    Ok(())
  }

  /// Read an element's current text: live value, live title, live
  /// description, then the snapshot label.
  pub fn read(&self, element: &Element) -> Result<String> {
    if let Some(handle) = &element.handle {
      for name in [attr::VALUE, attr::TITLE, attr::DESCRIPTION] {
        if let Some(text) = handle.string_attribute(name) {
          return Ok(text);
        }
      }
    }
    element
      .label()
      .map(String::from)
      .ok_or_else(|| Error::ReadFailed(attr::VALUE.to_string()))
  }

  /// Capture the element's frame via the capture collaborator.
  pub fn capture(&self, element: &Element) -> Result<CaptureImage> {
    if element.is_zero_size() {
      return Err(Error::ElementNotVisible(element.describe()));
    }
    let capture = self
      .capture
      .as_ref()
      .ok_or_else(|| Error::CaptureFailed("no capture backend configured".into()))?;
    capture.capture_region(element.frame())
  }

  /// Pass a named accessibility action straight through.
  pub fn perform(&self, element: &Element, action: &str) -> Result<()> {
    self.ensure_trusted()?;
    let handle = element
      .handle
      .as_ref()
      .ok_or_else(|| Error::ElementNotFound(element.describe()))?;
    handle.perform(action)
  }

  /// Drag from `from` to `to` with the left button.
  pub async fn drag(&self, from: Point, to: Point, mode: DragMode) -> Result<()> {
    self.ensure_trusted()?;
    let button = MouseButton::Left;

    self.dispatcher.mouse_move(from)?;
    self.dispatcher.mouse_down(from, button)?;
    tokio::time::sleep(self.config.drag_hold).await;

    match mode {
      DragMode::Direct => {
        self.dispatcher.mouse_drag(to, button)?;
      }
      DragMode::Interpolated { duration } => {
        let frames = (duration.as_secs_f64() / self.config.drag_frame.as_secs_f64())
          .ceil()
          .max(1.0) as u32;
        let anchor = Instant::now();
        for i in 1..=frames {
          // Anchored to the start instant: a late frame shortens the next
          // sleep instead of accumulating drift.
          tokio::time::sleep_until(anchor + self.config.drag_frame * i).await;
          let t = f64::from(i) / f64::from(frames);
          let point = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
          self.dispatcher.mouse_drag(point, button)?;
        }
      }
      DragMode::Humanized => {
        let path = humanized_path(from, to, 10.0, &self.config.motion, &mut rand::rng());
        for step in path {
          tokio::time::sleep(step.delay).await;
          self.push_trail(step.point);
          self.dispatcher.mouse_drag(step.point, button)?;
        }
      }
    }

    self.dispatcher.mouse_up(to, button)?;
    Ok(())
  }

  /// Move the pointer to `to`, directly or along a humanized trajectory.
  pub async fn move_pointer(&self, to: Point, humanize: bool, target_width: f64) -> Result<()> {
    if !humanize {
      self.push_trail(to);
      return self.dispatcher.mouse_move(to);
    }
    let start = self.desktop.pointer_position().unwrap_or(to);
    let path =
      humanized_path(start, to, target_width.max(1.0), &self.config.motion, &mut rand::rng());
    for step in path {
      tokio::time::sleep(step.delay).await;
      self.push_trail(step.point);
      self.dispatcher.mouse_move(step.point)?;
    }
    Ok(())
  }

  /// Scroll at a resolved point: warp there, post one wheel event.
  pub async fn scroll_at(
    &self,
    target: ScrollTarget,
    direction: ScrollDirection,
    amount: ScrollAmount,
  ) -> Result<ScrollOutcome> {
    self.ensure_trusted()?;

    let (point, extent) = match &target {
      ScrollTarget::At(point) => (*point, self.viewport_extent_at(*point, direction)),
      ScrollTarget::Container(element) => {
        let handle = element
          .handle
          .clone()
          .ok_or_else(|| Error::ElementNotFound(element.describe()))?;
        let container = Annotator::new(&*self.desktop)
          .container_for(&handle)
          .ok_or(Error::NoScrollContainer)?;
        let extent = if direction.is_vertical() {
          container.frame.height
        } else {
          container.frame.width
        };
        (container.frame.center(), extent)
      }
    };

    if !point.x.is_finite() || !point.y.is_finite() {
      return Err(Error::InvalidCoordinates {
        x: point.x,
        y: point.y,
      });
    }

    let pixels = match amount {
      ScrollAmount::Pixels(pixels) => pixels.abs(),
      ScrollAmount::Pages(pages) => pages.abs() * PAGE_FRACTION * extent,
    };

    self.dispatcher.mouse_move(point)?;
    // Natural scrolling: moving the view down means content moves up.
    let (wheel_x, wheel_y) = match direction {
      ScrollDirection::Down => (0.0, -pixels),
      ScrollDirection::Up => (0.0, pixels),
      ScrollDirection::Right => (-pixels, 0.0),
      ScrollDirection::Left => (pixels, 0.0),
    };
    self.dispatcher.scroll(wheel_x, wheel_y)?;

    Ok(ScrollOutcome {
      direction,
      amount: pixels,
    })
  }

  /// Bring an element into view via the scroll service.
  pub async fn scroll_to_element(&self, element: &Element) -> Result<ScrollIntoViewResult> {
    self.ensure_trusted()?;
    Scroller::new(&*self.desktop, &*self.dispatcher)
      .with_config(self.config.scroll)
      .scroll_into_view(element)
      .await
  }

  fn needs_scroll(&self, element: &Element) -> bool {
    if element.is_zero_size() {
      return true;
    }
    match element.visibility {
      Some(visibility) => !visibility.in_viewport,
      None => false,
    }
  }

  async fn activate_owner(&self, element: &Element) -> Result<()> {
    let pid = element.handle.as_ref().and_then(|h| h.pid());
    let Some(pid) = pid else {
      return Ok(());
    };
    self.desktop.activate(pid)?;
    tokio::time::sleep(self.config.activation_settle).await;
    Ok(())
  }

  /// Extent of the viewport owning a point: the window under it, else the
  /// main display, else a conservative default.
  fn viewport_extent_at(&self, point: Point, direction: ScrollDirection) -> f64 {
    let window_frame = self
      .desktop
      .element_at(point.x, point.y)
      .and_then(|handle| window_frame_of(&handle));
    let frame = window_frame
      .or_else(|| self.desktop.main_display_bounds())
      .unwrap_or(Rect::new(0.0, 0.0, 800.0, 800.0));
    if direction.is_vertical() {
      frame.height
    } else {
      frame.width
    }
  }

  fn push_trail(&self, point: Point) {
    if let Some(trail) = &self.trail {
      trail.push(point);
    }
  }
}

/// Frame of the nearest window ancestor (or the handle itself).
fn window_frame_of(handle: &UiHandle) -> Option<Rect> {
  let mut current = handle.clone();
  for _ in 0..crate::viewport::MAX_ANCESTOR_STEPS {
    if current.role().as_deref() == Some("AXWindow") {
      return current.frame();
    }
    current = current.parent()?;
  }
  None
}
