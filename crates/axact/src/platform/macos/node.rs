/*!
`UiNode` over `AXUIElement`.

All platform-specific unsafe code for element access is encapsulated here;
the engine only ever sees the safe trait surface.
*/

#![allow(unsafe_code)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::tree::{UiHandle, UiNode};
use crate::types::{Error, Point, Result, Size};
use objc2_application_services::{AXError, AXUIElement, AXValue as AXValueRef, AXValueType};
use objc2_core_foundation::{
  CFArray, CFBoolean, CFHash, CFNumber, CFRetained, CFString, CFType, CGPoint, CGSize,
};
use std::ffi::c_void;
use std::ptr::NonNull;

/// Opaque handle to a UI element. Clone is cheap (reference counted).
#[derive(Clone)]
pub(crate) struct AxNode(CFRetained<AXUIElement>);

// AXUIElement is a thread-safe CF type.
unsafe impl Send for AxNode {}
unsafe impl Sync for AxNode {}

impl AxNode {
  pub(crate) fn new(element: CFRetained<AXUIElement>) -> Self {
    Self(element)
  }

  /// Root accessibility element for a process.
  pub(crate) fn application(pid: i32) -> Self {
    Self(unsafe { AXUIElement::new_application(pid) })
  }

  /// The system-wide element, the root for hit tests and global focus.
  pub(crate) fn system_wide() -> Self {
    Self(unsafe { AXUIElement::new_system_wide() })
  }

  pub(crate) fn into_handle(self) -> UiHandle {
    UiHandle::new(self)
  }

  fn raw_attribute(&self, name: &CFString) -> Option<CFRetained<CFType>> {
    unsafe {
      let mut value: *const CFType = std::ptr::null();
      let result = self.0.copy_attribute_value(name, NonNull::new(&mut value)?);
      if result != AXError::Success || value.is_null() {
        return None;
      }
      Some(CFRetained::from_raw(NonNull::new_unchecked(
        value.cast_mut(),
      )))
    }
  }

  /// Hit test against this element's subtree (system-wide element for
  /// global hit tests).
  pub(crate) fn element_at_position(&self, x: f64, y: f64) -> Option<AxNode> {
    unsafe {
      let mut element_ptr: *const AXUIElement = std::ptr::null();
      let result = self.0.copy_element_at_position(
        x as f32,
        y as f32,
        NonNull::new(&mut element_ptr)?,
      );
      if result != AXError::Success || element_ptr.is_null() {
        return None;
      }
      let element = CFRetained::from_raw(NonNull::new_unchecked(element_ptr.cast_mut()));
      Some(AxNode::new(element))
    }
  }

  /// Render a scalar attribute value to string form.
  fn stringify(value: &CFType) -> Option<String> {
    if let Some(string) = value.downcast_ref::<CFString>() {
      let s = string.to_string();
      return if s.is_empty() { None } else { Some(s) };
    }
    if let Some(number) = value.downcast_ref::<CFNumber>() {
      if let Some(int) = number.as_i64() {
        return Some(int.to_string());
      }
      if let Some(float) = number.as_f64() {
        return Some(float.to_string());
      }
    }
    if let Some(boolean) = value.downcast_ref::<CFBoolean>() {
      return Some(boolean.as_bool().to_string());
    }
    None
  }
}

impl UiNode for AxNode {
  fn string_attribute(&self, name: &str) -> Option<String> {
    let value = self.raw_attribute(&CFString::from_str(name))?;
    Self::stringify(&value)
  }

  fn point_attribute(&self, name: &str) -> Option<Point> {
    let value = self.raw_attribute(&CFString::from_str(name))?;
    let ax_value = value.downcast_ref::<AXValueRef>()?;
    unsafe {
      if ax_value.r#type() != AXValueType::CGPoint {
        return None;
      }
      let mut point = CGPoint { x: 0.0, y: 0.0 };
      if !ax_value.value(
        AXValueType::CGPoint,
        NonNull::new(&mut point as *mut _ as *mut c_void)?,
      ) {
        return None;
      }
      Some(Point::new(point.x, point.y))
    }
  }

  fn size_attribute(&self, name: &str) -> Option<Size> {
    let value = self.raw_attribute(&CFString::from_str(name))?;
    let ax_value = value.downcast_ref::<AXValueRef>()?;
    unsafe {
      if ax_value.r#type() != AXValueType::CGSize {
        return None;
      }
      let mut size = CGSize {
        width: 0.0,
        height: 0.0,
      };
      if !ax_value.value(
        AXValueType::CGSize,
        NonNull::new(&mut size as *mut _ as *mut c_void)?,
      ) {
        return None;
      }
      Some(Size::new(size.width, size.height))
    }
  }

  fn string_list_attribute(&self, name: &str) -> Vec<String> {
    let Some(value) = self.raw_attribute(&CFString::from_str(name)) else {
      return Vec::new();
    };
    let Ok(array) = value.downcast::<CFArray>() else {
      return Vec::new();
    };
    // SAFETY: list-typed string attributes hold CFStrings.
    let typed: CFRetained<CFArray<CFString>> = unsafe { CFRetained::cast_unchecked(array) };
    let len = typed.len();
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
      if let Some(s) = typed.get(i) {
        out.push(s.to_string());
      }
    }
    out
  }

  fn element_attribute(&self, name: &str) -> Option<UiHandle> {
    let value = self.raw_attribute(&CFString::from_str(name))?;
    let element = value.downcast::<AXUIElement>().ok()?;
    Some(AxNode::new(element).into_handle())
  }

  fn element_list_attribute(&self, name: &str) -> Vec<UiHandle> {
    let Some(value) = self.raw_attribute(&CFString::from_str(name)) else {
      return Vec::new();
    };
    let Ok(array) = value.downcast::<CFArray>() else {
      return Vec::new();
    };
    // SAFETY: element-list attributes (children, windows) hold AXUIElements.
    let typed: CFRetained<CFArray<AXUIElement>> = unsafe { CFRetained::cast_unchecked(array) };
    let len = typed.len();
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
      if let Some(child) = typed.get(i) {
        out.push(AxNode::new(child).into_handle());
      }
    }
    out
  }

  fn identity_hash(&self) -> u64 {
    CFHash(Some(&*self.0)) as u64
  }

  fn action_names(&self) -> Vec<String> {
    unsafe {
      let mut actions_ref: *const CFArray<CFString> = std::ptr::null();
      let Some(out) = NonNull::new(&mut actions_ref as *mut *const CFArray<CFString> as *mut *const CFArray)
      else {
        return Vec::new();
      };
      let result = self.0.copy_action_names(out);
      if result != AXError::Success || actions_ref.is_null() {
        return Vec::new();
      }
      let actions =
        CFRetained::<CFArray<CFString>>::from_raw(NonNull::new_unchecked(actions_ref.cast_mut()));
      let len = actions.len();
      let mut names = Vec::with_capacity(len);
      for i in 0..len {
        if let Some(name) = actions.get(i) {
          names.push(name.to_string());
        }
      }
      names
    }
  }

  fn perform(&self, action: &str) -> Result<()> {
    let name = CFString::from_str(action);
    let result = unsafe { self.0.perform_action(&name) };
    if result == AXError::Success {
      Ok(())
    } else {
      Err(Error::ActionFailed {
        action: action.to_string(),
        code: result.0,
      })
    }
  }

  fn set_string(&self, name: &str, value: &str) -> Result<()> {
    let attribute = CFString::from_str(name);
    let cf_value = CFString::from_str(value);
    let result = unsafe { self.0.set_attribute_value(&attribute, &cf_value) };
    if result == AXError::Success {
      Ok(())
    } else {
      Err(Error::ActionFailed {
        action: format!("set {name}"),
        code: result.0,
      })
    }
  }

  fn set_focused(&self, focused: bool) -> Result<()> {
    let attribute = CFString::from_static_str("AXFocused");
    let cf_value = CFBoolean::new(focused);
    let result = unsafe { self.0.set_attribute_value(&attribute, &cf_value) };
    if result == AXError::Success {
      Ok(())
    } else {
      Err(Error::ActionFailed {
        action: "set AXFocused".to_string(),
        code: result.0,
      })
    }
  }

  fn pid(&self) -> Option<i32> {
    unsafe {
      let mut pid: i32 = 0;
      let result = self.0.pid(NonNull::new_unchecked(&mut pid));
      if result == AXError::Success && pid != 0 {
        Some(pid)
      } else {
        None
      }
    }
  }
}
