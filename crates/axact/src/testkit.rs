/*!
In-memory fakes for exercising the engine without an OS.

`FakeNode` builds mutable accessibility trees, `FakeDesktop` serves them as
a workspace, and `RecordingDispatcher` captures every input event. Scroll
tests wire the dispatcher's scroll hook back into the tree so synthetic
wheel events actually move content.
*/

use crate::a11y::attr;
use crate::desktop::{AppInfo, Desktop};
use crate::input::{EventDispatcher, Modifiers, MouseButton};
use crate::tree::{UiHandle, UiNode};
use crate::types::{Error, Point, Rect, Result, Size};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type PerformHook = Box<dyn Fn(&str) -> Result<()> + Send + Sync>;
type ScrollHook = Box<dyn Fn(f64, f64) + Send + Sync>;

struct NodeData {
  id: u64,
  pid: Option<i32>,
  strings: Mutex<HashMap<String, String>>,
  string_lists: Mutex<HashMap<String, Vec<String>>>,
  frame: Mutex<Option<Rect>>,
  children: Mutex<Vec<Arc<NodeData>>>,
  parent: Mutex<Weak<NodeData>>,
  actions: Mutex<Vec<String>>,
  focused: Mutex<bool>,
  /// Whether a set on the value attribute is stored (editable native field)
  /// or silently dropped (the web-view case that forces keystrokes).
  value_sticks: bool,
  on_perform: Mutex<Option<PerformHook>>,
}

/// Handle over one fake node. Cloning shares the node.
#[derive(Clone)]
pub(crate) struct FakeHandle(Arc<NodeData>);

impl FakeHandle {
  pub(crate) fn handle(&self) -> UiHandle {
    UiHandle::new(self.clone())
  }

  pub(crate) fn set_frame(&self, frame: Rect) {
    *self.0.frame.lock() = Some(frame);
  }

  pub(crate) fn shift_by(&self, dx: f64, dy: f64) {
    let mut guard = self.0.frame.lock();
    if let Some(frame) = guard.as_mut() {
      frame.x += dx;
      frame.y += dy;
    }
  }

  pub(crate) fn on_perform(&self, hook: impl Fn(&str) -> Result<()> + Send + Sync + 'static) {
    *self.0.on_perform.lock() = Some(Box::new(hook));
  }

  pub(crate) fn remove_from_parent(&self) {
    if let Some(parent) = self.0.parent.lock().upgrade() {
      parent.children.lock().retain(|c| c.id != self.0.id);
    }
  }
}

impl UiNode for FakeHandle {
  fn string_attribute(&self, name: &str) -> Option<String> {
    let value = self.0.strings.lock().get(name).cloned()?;
    if value.is_empty() {
      None
    } else {
      Some(value)
    }
  }

  fn point_attribute(&self, name: &str) -> Option<Point> {
    if name == attr::POSITION {
      self.0.frame.lock().map(|f| f.origin())
    } else {
      None
    }
  }

  fn size_attribute(&self, name: &str) -> Option<Size> {
    if name == attr::SIZE {
      self.0.frame.lock().map(|f| f.size())
    } else {
      None
    }
  }

  fn string_list_attribute(&self, name: &str) -> Vec<String> {
    self
      .0
      .string_lists
      .lock()
      .get(name)
      .cloned()
      .unwrap_or_default()
  }

  fn element_attribute(&self, name: &str) -> Option<UiHandle> {
    if name == attr::PARENT {
      self
        .0
        .parent
        .lock()
        .upgrade()
        .map(|p| UiHandle::new(FakeHandle(p)))
    } else {
      None
    }
  }

  fn element_list_attribute(&self, name: &str) -> Vec<UiHandle> {
    match name {
      attr::CHILDREN => self
        .0
        .children
        .lock()
        .iter()
        .map(|c| UiHandle::new(FakeHandle(Arc::clone(c))))
        .collect(),
      attr::WINDOWS => self
        .0
        .children
        .lock()
        .iter()
        .filter(|c| c.strings.lock().get(attr::ROLE).map(String::as_str) == Some("AXWindow"))
        .map(|c| UiHandle::new(FakeHandle(Arc::clone(c))))
        .collect(),
      _ => Vec::new(),
    }
  }

  fn identity_hash(&self) -> u64 {
    self.0.id
  }

  fn action_names(&self) -> Vec<String> {
    self.0.actions.lock().clone()
  }

  fn perform(&self, action: &str) -> Result<()> {
    if let Some(hook) = self.0.on_perform.lock().as_ref() {
      return hook(action);
    }
    if self.0.actions.lock().iter().any(|a| a == action) {
      Ok(())
    } else {
      Err(Error::ActionFailed {
        action: action.to_string(),
        code: -25205,
      })
    }
  }

  fn set_string(&self, name: &str, value: &str) -> Result<()> {
    if self.0.value_sticks {
      self
        .0
        .strings
        .lock()
        .insert(name.to_string(), value.to_string());
    }
    Ok(())
  }

  fn set_focused(&self, focused: bool) -> Result<()> {
    *self.0.focused.lock() = focused;
    Ok(())
  }

  fn pid(&self) -> Option<i32> {
    self.0.pid
  }
}

/// Builder for fake tree nodes.
pub(crate) struct FakeNode {
  strings: HashMap<String, String>,
  string_lists: HashMap<String, Vec<String>>,
  frame: Option<Rect>,
  children: Vec<FakeNode>,
  actions: Vec<String>,
  value_sticks: bool,
  pid: Option<i32>,
}

impl FakeNode {
  pub(crate) fn new(role: &str) -> Self {
    let mut strings = HashMap::new();
    strings.insert(attr::ROLE.to_string(), role.to_string());
    Self {
      strings,
      string_lists: HashMap::new(),
      frame: None,
      children: Vec::new(),
      actions: Vec::new(),
      value_sticks: true,
      pid: None,
    }
  }

  /// Application root with a title and pid.
  pub(crate) fn app(name: &str) -> Self {
    Self::new("AXApplication").with_title(name).with_pid(1000)
  }

  pub(crate) fn with_title(mut self, title: &str) -> Self {
    self.strings.insert(attr::TITLE.to_string(), title.to_string());
    self
  }

  pub(crate) fn with_description(mut self, description: &str) -> Self {
    self
      .strings
      .insert(attr::DESCRIPTION.to_string(), description.to_string());
    self
  }

  pub(crate) fn with_value(mut self, value: &str) -> Self {
    self.strings.insert(attr::VALUE.to_string(), value.to_string());
    self
  }

  pub(crate) fn with_subrole(mut self, subrole: &str) -> Self {
    self
      .strings
      .insert(attr::SUBROLE.to_string(), subrole.to_string());
    self
  }

  pub(crate) fn with_identifier(mut self, identifier: &str) -> Self {
    self
      .strings
      .insert(attr::IDENTIFIER.to_string(), identifier.to_string());
    self
  }

  pub(crate) fn with_attr(mut self, name: &str, value: &str) -> Self {
    self.strings.insert(name.to_string(), value.to_string());
    self
  }

  pub(crate) fn with_string_list(mut self, name: &str, values: &[&str]) -> Self {
    self.string_lists.insert(
      name.to_string(),
      values.iter().map(|s| (*s).to_string()).collect(),
    );
    self
  }

  pub(crate) fn with_frame(mut self, frame: Rect) -> Self {
    self.frame = Some(frame);
    self
  }

  pub(crate) fn with_actions(mut self, actions: &[&str]) -> Self {
    self.actions = actions.iter().map(|s| (*s).to_string()).collect();
    self
  }

  pub(crate) fn with_pid(mut self, pid: i32) -> Self {
    self.pid = Some(pid);
    self
  }

  /// Sets on the value attribute are accepted but not stored, forcing the
  /// keystroke fallback when typing.
  pub(crate) fn value_set_ignored(mut self) -> Self {
    self.value_sticks = false;
    self
  }

  pub(crate) fn child(mut self, child: FakeNode) -> Self {
    self.children.push(child);
    self
  }

  fn materialize(self, parent: Weak<NodeData>, inherited_pid: Option<i32>) -> Arc<NodeData> {
    let pid = self.pid.or(inherited_pid);
    let node = Arc::new(NodeData {
      id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
      pid,
      strings: Mutex::new(self.strings),
      string_lists: Mutex::new(self.string_lists),
      frame: Mutex::new(self.frame),
      children: Mutex::new(Vec::new()),
      parent: Mutex::new(parent),
      actions: Mutex::new(self.actions),
      focused: Mutex::new(false),
      value_sticks: self.value_sticks,
      on_perform: Mutex::new(None),
    });
    let children: Vec<Arc<NodeData>> = self
      .children
      .into_iter()
      .map(|c| c.materialize(Arc::downgrade(&node), pid))
      .collect();
    *node.children.lock() = children;
    node
  }

  pub(crate) fn build(self) -> UiHandle {
    UiHandle::new(FakeHandle(self.materialize(Weak::new(), None)))
  }

  /// Build the tree, then give the first child a child list pointing back
  /// at the root, forming a cycle.
  pub(crate) fn build_cyclic(self) -> UiHandle {
    let root = self.materialize(Weak::new(), None);
    if let Some(first) = root.children.lock().first() {
      first.children.lock().push(Arc::clone(&root));
    }
    UiHandle::new(FakeHandle(root))
  }

  /// Build and return both the root handle and handles to every node in
  /// document order, for tests that mutate the tree.
  pub(crate) fn build_indexed(self) -> (UiHandle, Vec<FakeHandle>) {
    let root = self.materialize(Weak::new(), None);
    let mut all = Vec::new();
    fn walk(node: &Arc<NodeData>, out: &mut Vec<FakeHandle>) {
      out.push(FakeHandle(Arc::clone(node)));
      for child in node.children.lock().iter() {
        walk(child, out);
      }
    }
    walk(&root, &mut all);
    (UiHandle::new(FakeHandle(root)), all)
  }
}

/// In-memory [`Desktop`] over fake trees.
pub(crate) struct FakeDesktop {
  apps: Vec<(AppInfo, UiHandle)>,
  trusted: bool,
  display: Option<Rect>,
  focused: Mutex<Option<UiHandle>>,
  pointer: Mutex<Point>,
  pub(crate) activations: Mutex<Vec<i32>>,
}

impl FakeDesktop {
  pub(crate) fn new() -> Self {
    Self {
      apps: Vec::new(),
      trusted: true,
      display: Some(Rect::new(0.0, 0.0, 1920.0, 1080.0)),
      focused: Mutex::new(None),
      pointer: Mutex::new(Point::new(0.0, 0.0)),
      activations: Mutex::new(Vec::new()),
    }
  }

  pub(crate) fn set_pointer(&self, point: Point) {
    *self.pointer.lock() = point;
  }

  pub(crate) fn with_app(mut self, name: &str, pid: i32, root: UiHandle) -> Self {
    self.apps.push((
      AppInfo {
        pid,
        name: name.to_string(),
        bundle_id: None,
        frontmost: self.apps.is_empty(),
        hidden: false,
      },
      root,
    ));
    self
  }

  pub(crate) fn untrusted(mut self) -> Self {
    self.trusted = false;
    self
  }

  pub(crate) fn without_display(mut self) -> Self {
    self.display = None;
    self
  }

  pub(crate) fn set_focused(&self, handle: UiHandle) {
    *self.focused.lock() = Some(handle);
  }
}

impl Desktop for FakeDesktop {
  fn is_trusted(&self) -> bool {
    self.trusted
  }

  fn applications(&self) -> Vec<AppInfo> {
    self.apps.iter().map(|(info, _)| info.clone()).collect()
  }

  fn application_root(&self, pid: i32) -> Option<UiHandle> {
    self
      .apps
      .iter()
      .find(|(info, _)| info.pid == pid)
      .map(|(_, root)| root.clone())
  }

  fn element_at(&self, x: f64, y: f64) -> Option<UiHandle> {
    // Smallest node containing the point, across all apps.
    let point = Point::new(x, y);
    let mut best: Option<(f64, UiHandle)> = None;
    for (_, root) in &self.apps {
      let mut stack = vec![root.clone()];
      while let Some(handle) = stack.pop() {
        if let Some(frame) = handle.frame() {
          if frame.contains(point) {
            let area = frame.area();
            if best.as_ref().is_none_or(|(a, _)| area < *a) {
              best = Some((area, handle.clone()));
            }
          }
        }
        stack.extend(handle.children());
      }
    }
    best.map(|(_, h)| h)
  }

  fn focused_element(&self) -> Option<UiHandle> {
    self.focused.lock().clone()
  }

  fn main_display_bounds(&self) -> Option<Rect> {
    self.display
  }

  fn pointer_position(&self) -> Option<Point> {
    Some(*self.pointer.lock())
  }

  fn activate(&self, pid: i32) -> Result<()> {
    if self.apps.iter().any(|(info, _)| info.pid == pid) {
      self.activations.lock().push(pid);
      Ok(())
    } else {
      Err(Error::AppNotRunning(format!("pid {pid}")))
    }
  }
}

/// Everything the recording dispatcher saw, in posting order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum DispatchedEvent {
  MouseMove(Point),
  MouseDown(Point, MouseButton),
  MouseUp(Point, MouseButton),
  MouseDrag(Point, MouseButton),
  Scroll { wheel_x: f64, wheel_y: f64 },
  KeyDown { keycode: u16, modifiers: Modifiers },
  KeyUp { keycode: u16, modifiers: Modifiers },
  KeyText(String),
}

/// [`EventDispatcher`] double that records the event stream.
///
/// The optional scroll hook lets tests feed wheel deltas back into a fake
/// tree so scrolled content moves.
#[derive(Default)]
pub(crate) struct RecordingDispatcher {
  pub(crate) events: Mutex<Vec<DispatchedEvent>>,
  scroll_hook: Mutex<Option<ScrollHook>>,
}

impl RecordingDispatcher {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn on_scroll(&self, hook: impl Fn(f64, f64) + Send + Sync + 'static) {
    *self.scroll_hook.lock() = Some(Box::new(hook));
  }

  pub(crate) fn recorded(&self) -> Vec<DispatchedEvent> {
    self.events.lock().clone()
  }

  pub(crate) fn key_events(&self) -> Vec<DispatchedEvent> {
    self
      .recorded()
      .into_iter()
      .filter(|e| {
        matches!(
          e,
          DispatchedEvent::KeyDown { .. }
            | DispatchedEvent::KeyUp { .. }
            | DispatchedEvent::KeyText(_)
        )
      })
      .collect()
  }

  fn record(&self, event: DispatchedEvent) -> Result<()> {
    self.events.lock().push(event);
    Ok(())
  }
}

impl EventDispatcher for RecordingDispatcher {
  fn mouse_move(&self, point: Point) -> Result<()> {
    self.record(DispatchedEvent::MouseMove(point))
  }

  fn mouse_down(&self, point: Point, button: MouseButton) -> Result<()> {
    self.record(DispatchedEvent::MouseDown(point, button))
  }

  fn mouse_up(&self, point: Point, button: MouseButton) -> Result<()> {
    self.record(DispatchedEvent::MouseUp(point, button))
  }

  fn mouse_drag(&self, point: Point, button: MouseButton) -> Result<()> {
    self.record(DispatchedEvent::MouseDrag(point, button))
  }

  fn scroll(&self, wheel_x: f64, wheel_y: f64) -> Result<()> {
    if let Some(hook) = self.scroll_hook.lock().as_ref() {
      hook(wheel_x, wheel_y);
    }
    self.record(DispatchedEvent::Scroll { wheel_x, wheel_y })
  }

  fn key_down(&self, keycode: u16, modifiers: Modifiers) -> Result<()> {
    self.record(DispatchedEvent::KeyDown { keycode, modifiers })
  }

  fn key_up(&self, keycode: u16, modifiers: Modifiers) -> Result<()> {
    self.record(DispatchedEvent::KeyUp { keycode, modifiers })
  }

  fn key_text(&self, text: &str) -> Result<()> {
    self.record(DispatchedEvent::KeyText(text.to_string()))
  }
}
