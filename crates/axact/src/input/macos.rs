/*!
Trusted event dispatch over CGEvent.

Events are created from a HID-state source, stamped with the host's
monotonic uptime, and posted at the HID tap so receiving applications see
them as physical input. Mouse moves additionally warp the cursor so the
visible pointer tracks the logical one.
*/

#![allow(unsafe_code)]
#![allow(clippy::cast_possible_truncation)]

use super::{EventDispatcher, Modifiers, MouseButton};
use crate::types::{Error, Point, Result};
use objc2_core_foundation::CGPoint;
use objc2_core_graphics::{
  CGEvent, CGEventFlags, CGEventSource, CGEventSourceStateID, CGEventTapLocation, CGEventType,
  CGMouseButton, CGScrollEventUnit, CGWarpMouseCursorPosition,
};
use std::sync::OnceLock;

extern "C" {
  fn mach_absolute_time() -> u64;
  fn mach_timebase_info(info: *mut MachTimebaseInfo) -> i32;
}

#[repr(C)]
#[derive(Clone, Copy)]
struct MachTimebaseInfo {
  numer: u32,
  denom: u32,
}

/// Host uptime in nanoseconds from the mach timebase.
///
/// Scaled piecewise so `t * numer` cannot overflow on long uptimes.
fn uptime_nanos() -> u64 {
  static TIMEBASE: OnceLock<MachTimebaseInfo> = OnceLock::new();
  let info = TIMEBASE.get_or_init(|| {
    let mut info = MachTimebaseInfo { numer: 1, denom: 1 };
    unsafe {
      mach_timebase_info(&mut info);
    }
    if info.denom == 0 {
      info = MachTimebaseInfo { numer: 1, denom: 1 };
    }
    info
  });
  let t = unsafe { mach_absolute_time() };
  let (numer, denom) = (u64::from(info.numer), u64::from(info.denom));
  (t / denom) * numer + (t % denom) * numer / denom
}

const fn cg_button(button: MouseButton) -> CGMouseButton {
  match button {
    MouseButton::Left => CGMouseButton::Left,
    MouseButton::Right => CGMouseButton::Right,
    MouseButton::Middle => CGMouseButton::Center,
  }
}

const fn mouse_event_type(button: MouseButton, down: bool) -> CGEventType {
  match (button, down) {
    (MouseButton::Left, true) => CGEventType::LeftMouseDown,
    (MouseButton::Left, false) => CGEventType::LeftMouseUp,
    (MouseButton::Right, true) => CGEventType::RightMouseDown,
    (MouseButton::Right, false) => CGEventType::RightMouseUp,
    (MouseButton::Middle, true) => CGEventType::OtherMouseDown,
    (MouseButton::Middle, false) => CGEventType::OtherMouseUp,
  }
}

const fn drag_event_type(button: MouseButton) -> CGEventType {
  match button {
    MouseButton::Left => CGEventType::LeftMouseDragged,
    MouseButton::Right => CGEventType::RightMouseDragged,
    MouseButton::Middle => CGEventType::OtherMouseDragged,
  }
}

fn event_flags(modifiers: Modifiers) -> CGEventFlags {
  let mut flags = CGEventFlags::empty();
  if modifiers.shift {
    flags |= CGEventFlags::MaskShift;
  }
  if modifiers.control {
    flags |= CGEventFlags::MaskControl;
  }
  if modifiers.option {
    flags |= CGEventFlags::MaskAlternate;
  }
  if modifiers.command {
    flags |= CGEventFlags::MaskCommand;
  }
  flags
}

/// [`EventDispatcher`] posting real CGEvents at the HID tap.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemDispatcher;

impl SystemDispatcher {
  /// Dispatcher posting at the HID tap.
  pub fn new() -> Result<Self> {
    Ok(Self)
  }

  fn source() -> Result<objc2_core_foundation::CFRetained<CGEventSource>> {
    CGEventSource::new(CGEventSourceStateID::HIDSystemState).ok_or(Error::EventCreationFailed)
  }

  fn post(event: &CGEvent) {
    unsafe {
      CGEvent::set_timestamp(Some(event), uptime_nanos());
      CGEvent::post(CGEventTapLocation::HIDEventTap, Some(event));
    }
  }

  fn post_mouse(&self, event_type: CGEventType, point: Point, button: MouseButton) -> Result<()> {
    if !point.x.is_finite() || !point.y.is_finite() {
      return Err(Error::InvalidCoordinates {
        x: point.x,
        y: point.y,
      });
    }
    let source = Self::source()?;
    let position = CGPoint {
      x: point.x,
      y: point.y,
    };
    let event = unsafe {
      CGEvent::new_mouse_event(Some(&source), event_type, position, cg_button(button))
    }
    .ok_or(Error::EventCreationFailed)?;
    Self::post(&event);
    Ok(())
  }
}

impl EventDispatcher for SystemDispatcher {
  fn mouse_move(&self, point: Point) -> Result<()> {
    // Warp first so the visible cursor moves, then post the trusted move
    // event so tracking applications observe it.
    unsafe {
      CGWarpMouseCursorPosition(CGPoint {
        x: point.x,
        y: point.y,
      });
    }
    self.post_mouse(CGEventType::MouseMoved, point, MouseButton::Left)
  }

  fn mouse_down(&self, point: Point, button: MouseButton) -> Result<()> {
    self.post_mouse(mouse_event_type(button, true), point, button)
  }

  fn mouse_up(&self, point: Point, button: MouseButton) -> Result<()> {
    self.post_mouse(mouse_event_type(button, false), point, button)
  }

  fn mouse_drag(&self, point: Point, button: MouseButton) -> Result<()> {
    self.post_mouse(drag_event_type(button), point, button)
  }

  fn scroll(&self, wheel_x: f64, wheel_y: f64) -> Result<()> {
    let source = Self::source()?;
    let event = unsafe {
      CGEvent::new_scroll_wheel_event2(
        Some(&source),
        CGScrollEventUnit::Pixel,
        2,
        wheel_y.round() as i32,
        wheel_x.round() as i32,
        0,
      )
    }
    .ok_or(Error::EventCreationFailed)?;
    Self::post(&event);
    Ok(())
  }

  fn key_down(&self, keycode: u16, modifiers: Modifiers) -> Result<()> {
    let source = Self::source()?;
    let event = unsafe { CGEvent::new_keyboard_event(Some(&source), keycode, true) }
      .ok_or(Error::EventCreationFailed)?;
    unsafe {
      CGEvent::set_flags(Some(&event), event_flags(modifiers));
    }
    Self::post(&event);
    Ok(())
  }

  fn key_up(&self, keycode: u16, modifiers: Modifiers) -> Result<()> {
    let source = Self::source()?;
    let event = unsafe { CGEvent::new_keyboard_event(Some(&source), keycode, false) }
      .ok_or(Error::EventCreationFailed)?;
    unsafe {
      CGEvent::set_flags(Some(&event), event_flags(modifiers));
    }
    Self::post(&event);
    Ok(())
  }

  fn key_text(&self, text: &str) -> Result<()> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let source = Self::source()?;
    for down in [true, false] {
      let event = unsafe { CGEvent::new_keyboard_event(Some(&source), 0, down) }
        .ok_or(Error::EventCreationFailed)?;
      unsafe {
        CGEvent::keyboard_set_unicode_string(Some(&event), units.len(), units.as_ptr());
      }
      Self::post(&event);
    }
    Ok(())
  }
}
