/*! Accessibility attribute names read and written by the engine. */

/// Categorical role label. The one attribute every node must report.
pub const ROLE: &str = "AXRole";
/// More specific role classification.
pub const SUBROLE: &str = "AXSubrole";
/// Visible title text.
pub const TITLE: &str = "AXTitle";
/// Descriptive text for elements without a title.
pub const DESCRIPTION: &str = "AXDescription";
/// Current value (text content, slider position, toggle state).
pub const VALUE: &str = "AXValue";
/// Accessibility identifier, the DOM-id analogue.
pub const IDENTIFIER: &str = "AXIdentifier";
/// Top-left corner in screen coordinates.
pub const POSITION: &str = "AXPosition";
/// Width and height.
pub const SIZE: &str = "AXSize";
/// Ordered child element list.
pub const CHILDREN: &str = "AXChildren";
/// Containing element.
pub const PARENT: &str = "AXParent";
/// Window list on an application element.
pub const WINDOWS: &str = "AXWindows";
/// Keyboard-focus flag, settable on focusable elements.
pub const FOCUSED: &str = "AXFocused";
/// Globally focused element, read on the system-wide element.
pub const FOCUSED_UI_ELEMENT: &str = "AXFocusedUIElement";
/// Scroll-bar axis.
pub const ORIENTATION: &str = "AXOrientation";

/// Web-view DOM id, exposed only by browser processes.
pub const DOM_IDENTIFIER: &str = "AXDOMIdentifier";
/// Web-view DOM class list, exposed only by browser processes.
pub const DOM_CLASS_LIST: &str = "AXDOMClassList";

/// Orientation value of a vertical scroll bar.
pub const ORIENTATION_VERTICAL: &str = "AXVerticalOrientation";
/// Orientation value of a horizontal scroll bar.
pub const ORIENTATION_HORIZONTAL: &str = "AXHorizontalOrientation";
