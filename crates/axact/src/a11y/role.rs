/*!
Role string handling.

Roles are the platform's categorical labels ("AXButton", "AXTextField").
Callers may pass short names; [`normalize_role`] canonicalizes them.
*/

/// Roles whose frame acts as a viewport for their descendants.
///
/// A web area hosts its own scroll bars in a wrapping scroll area, which the
/// viewport analyzer prefers when present.
pub const SCROLLABLE_ROLES: &[&str] = &["AXScrollArea", "AXWebArea", "AXTable", "AXList"];

/// Canonicalize a role name to the accessibility convention.
///
/// Short names get the `AX` prefix and an upper-cased first character:
/// "button" becomes "AXButton". Names already carrying the prefix pass
/// through unchanged.
pub fn normalize_role(role: &str) -> String {
  if role.is_empty() || role.starts_with("AX") {
    return role.to_string();
  }
  let mut chars = role.chars();
  let first = chars.next().map(|c| c.to_ascii_uppercase());
  match first {
    Some(first) => format!("AX{first}{}", chars.as_str()),
    None => role.to_string(),
  }
}

/// Strip the `AX` prefix for compact display and reference encoding.
pub fn short_role(role: &str) -> &str {
  role.strip_prefix("AX").unwrap_or(role)
}

/// Whether a role belongs to the scrollable-ancestor set.
pub fn is_scrollable_role(role: &str) -> bool {
  SCROLLABLE_ROLES.contains(&role)
}
