/*!
Desktop implementation over NSWorkspace and the system-wide accessibility
element.
*/

#![allow(unsafe_code)]
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use super::node::AxNode;
use crate::a11y::attr;
use crate::desktop::{AppInfo, Desktop};
use crate::tree::UiHandle;
use crate::types::{Error, Permission, Point, Rect, Result};
use objc2::rc::autoreleasepool;
use objc2::{class, msg_send};
use objc2_app_kit::{
  NSApplicationActivationOptions, NSApplicationActivationPolicy, NSRunningApplication,
};
use objc2_core_graphics::{CGEvent, CGEventSource, CGEventSourceStateID};
use objc2_foundation::NSArray;

/// The live macOS desktop.
///
/// Construction fails fast when the accessibility trust grant is missing;
/// every operation on the accessibility forest needs it.
#[derive(Debug, Clone, Copy)]
pub struct MacDesktop;

impl MacDesktop {
  pub fn new() -> Result<Self> {
    if !super::check_accessibility_trust() {
      return Err(Error::PermissionDenied(Permission::Accessibility));
    }
    Ok(Self)
  }
}

impl Desktop for MacDesktop {
  fn is_trusted(&self) -> bool {
    super::check_accessibility_trust()
  }

  fn applications(&self) -> Vec<AppInfo> {
    autoreleasepool(|_pool| {
      let mut out = Vec::new();
      unsafe {
        let workspace: *mut objc2::runtime::AnyObject =
          msg_send![class!(NSWorkspace), sharedWorkspace];
        if workspace.is_null() {
          return out;
        }
        let apps: *mut NSArray<NSRunningApplication> = msg_send![workspace, runningApplications];
        if apps.is_null() {
          return out;
        }
        let apps = &*apps;
        let count: usize = msg_send![apps, count];
        for index in 0..count {
          let app: *mut NSRunningApplication = msg_send![apps, objectAtIndex: index];
          if app.is_null() {
            continue;
          }
          let app = &*app;
          if app.activationPolicy() != NSApplicationActivationPolicy::Regular {
            continue;
          }
          let Some(name) = app.localizedName().map(|n| n.to_string()) else {
            continue;
          };
          out.push(AppInfo {
            pid: app.processIdentifier(),
            name,
            bundle_id: app.bundleIdentifier().map(|b| b.to_string()),
            frontmost: app.isActive(),
            hidden: app.isHidden(),
          });
        }
      }
      out
    })
  }

  fn application_root(&self, pid: i32) -> Option<UiHandle> {
    Some(AxNode::application(pid).into_handle())
  }

  fn element_at(&self, x: f64, y: f64) -> Option<UiHandle> {
    AxNode::system_wide()
      .element_at_position(x, y)
      .map(AxNode::into_handle)
  }

  fn focused_element(&self) -> Option<UiHandle> {
    AxNode::system_wide()
      .into_handle()
      .element_attribute(attr::FOCUSED_UI_ELEMENT)
  }

  fn main_display_bounds(&self) -> Option<Rect> {
    super::main_display_bounds()
  }

  fn pointer_position(&self) -> Option<Point> {
    let source = CGEventSource::new(CGEventSourceStateID::CombinedSessionState)?;
    let event = CGEvent::new(Some(&source))?;
    let location = CGEvent::location(Some(&event));
    Some(Point::new(location.x, location.y))
  }

  fn activate(&self, pid: i32) -> Result<()> {
    let activated = unsafe {
      let app: *mut NSRunningApplication = msg_send![
        class!(NSRunningApplication),
        runningApplicationWithProcessIdentifier: pid
      ];
      if app.is_null() {
        return Err(Error::AppNotRunning(format!("pid {pid}")));
      }
      (*app).activateWithOptions(NSApplicationActivationOptions::ActivateIgnoringOtherApps)
    };
    if activated {
      Ok(())
    } else {
      Err(Error::ActionFailed {
        action: format!("activate pid {pid}"),
        code: 0,
      })
    }
  }
}
