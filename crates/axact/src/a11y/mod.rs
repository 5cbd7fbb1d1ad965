/*! Accessibility vocabulary: attribute names, action names, role helpers. */

pub mod action;
pub mod attr;
mod role;

pub use role::{is_scrollable_role, normalize_role, short_role, SCROLLABLE_ROLES};
