/*! Accessibility action names the engine performs. */

/// Press a control, the accessibility click.
pub const PRESS: &str = "AXPress";
/// Open a control's context menu.
pub const SHOW_MENU: &str = "AXShowMenu";
/// Ask the owning view to scroll this element into its viewport.
pub const SCROLL_TO_VISIBLE: &str = "AXScrollToVisible";
