/*!
Axact - element-targeted desktop UI automation.

Callers describe *what* they want to touch - visible text, role,
identifier, structure, size - and the engine resolves that against the
accessibility tree, brings the target on-screen, and delivers trusted
input events indistinguishable from human input.

```ignore
use axact::{ClickOptions, Driver, ElementQuery};

let driver = Driver::system()?;
let button = driver.find_first(
    &ElementQuery::new().with_text("Save").with_role("button"),
)?;
driver.click(&button, ClickOptions::default()).await?;
```
*/

pub mod a11y;
mod actions;
mod desktop;
mod motion;
mod platform;
mod reference;
mod scroll;
mod search;
mod tree;
mod viewport;

pub mod input;

mod types;
pub use types::*;

pub use actions::{
  CaptureImage, ClickOptions, DelayRange, DragMode, Driver, DriverConfig, ScreenCapture,
  ScrollAmount, ScrollOutcome, ScrollTarget, TrailSink,
};
pub use desktop::{AppInfo, Desktop};
pub use motion::{fitts_duration, humanized_path, MotionConfig, PathStep};
pub use platform::{to_bottom_left, to_top_left};
#[cfg(target_os = "macos")]
pub use platform::MacDesktop;
pub use reference::ElementReference;
pub use scroll::{ScrollConfig, Scroller};
pub use search::{matches, requery, text_matches, SearchEngine};
pub use tree::{collect, materialize, traverse, Step, TreeWalker, UiHandle, UiNode};
pub use viewport::Annotator;

#[cfg(test)]
pub(crate) mod testkit;

/// Check whether this process holds the accessibility trust grant.
///
/// Everything except value construction and the pure motion math requires
/// it.
pub fn verify_permissions() -> bool {
  #[cfg(target_os = "macos")]
  {
    platform::macos_trusted()
  }
  #[cfg(not(target_os = "macos"))]
  {
    false
  }
}
