/*! Query descriptions for element search. */

use serde::{Deserialize, Serialize};

/// Immutable description of what to look for.
///
/// Empty queries match everything up to `limit`; rejecting a query with no
/// predicates is the caller's concern, not the engine's.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementQuery {
  /// Matched against title, description, and value (case-insensitive
  /// containment; in-order subsequence when `fuzzy_match`).
  #[serde(skip_serializing_if = "Option::is_none")]
  pub text: Option<String>,
  /// Role, normalized before matching ("button" and "AXButton" are equal).
  #[serde(skip_serializing_if = "Option::is_none")]
  pub role: Option<String>,
  /// Localized name of the owning application. An unresolvable name yields
  /// an empty result, not an error.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub application: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub identifier: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sibling_index: Option<usize>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent_role: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min_width: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_width: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min_height: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_height: Option<f64>,
  /// Relax text containment to in-order subsequence matching.
  pub fuzzy_match: bool,
  /// Maximum matches to return; 0 = unlimited.
  pub limit: usize,
  /// Traversal depth bound.
  pub max_depth: usize,
}

/// Default traversal depth. Deep enough for real web content, a safety
/// bound against pathological trees.
pub const DEFAULT_MAX_DEPTH: usize = 40;

impl ElementQuery {
  pub fn new() -> Self {
    Self {
      fuzzy_match: true,
      max_depth: DEFAULT_MAX_DEPTH,
      ..Self::default()
    }
  }

  pub fn with_text(mut self, text: impl Into<String>) -> Self {
    self.text = Some(text.into());
    self
  }

  pub fn with_role(mut self, role: impl Into<String>) -> Self {
    self.role = Some(role.into());
    self
  }

  pub fn with_application(mut self, application: impl Into<String>) -> Self {
    self.application = Some(application.into());
    self
  }

  pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
    self.identifier = Some(identifier.into());
    self
  }

  pub fn with_sibling_index(mut self, index: usize) -> Self {
    self.sibling_index = Some(index);
    self
  }

  pub fn with_parent_role(mut self, role: impl Into<String>) -> Self {
    self.parent_role = Some(role.into());
    self
  }

  pub fn with_limit(mut self, limit: usize) -> Self {
    self.limit = limit;
    self
  }

  /// True when no predicate is set: such a query returns everything.
  pub fn is_unconstrained(&self) -> bool {
    self.text.is_none()
      && self.role.is_none()
      && self.identifier.is_none()
      && self.sibling_index.is_none()
      && self.parent_role.is_none()
      && self.min_width.is_none()
      && self.max_width.is_none()
      && self.min_height.is_none()
      && self.max_height.is_none()
  }

  /// Compact rendering for error messages.
  pub fn describe(&self) -> String {
    let mut parts = Vec::new();
    if let Some(text) = &self.text {
      parts.push(format!("text=\"{text}\""));
    }
    if let Some(role) = &self.role {
      parts.push(format!("role={role}"));
    }
    if let Some(app) = &self.application {
      parts.push(format!("app={app}"));
    }
    if let Some(id) = &self.identifier {
      parts.push(format!("id={id}"));
    }
    if let Some(index) = self.sibling_index {
      parts.push(format!("index={index}"));
    }
    if let Some(parent) = &self.parent_role {
      parts.push(format!("parent={parent}"));
    }
    if parts.is_empty() {
      "<any element>".to_string()
    } else {
      parts.join(" ")
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_defaults_to_fuzzy_and_bounded_depth() {
    let q = ElementQuery::new();
    assert!(q.fuzzy_match);
    assert_eq!(q.max_depth, DEFAULT_MAX_DEPTH);
    assert_eq!(q.limit, 0);
  }

  #[test]
  fn unconstrained_detection() {
    assert!(ElementQuery::new().is_unconstrained());
    assert!(!ElementQuery::new().with_text("x").is_unconstrained());
    assert!(!ElementQuery::new().with_role("button").is_unconstrained());
    // An application scope alone still matches every element in that app.
    assert!(ElementQuery::new()
      .with_application("Safari")
      .is_unconstrained());
  }

  #[test]
  fn describe_lists_predicates() {
    let q = ElementQuery::new().with_text("Save").with_role("AXButton");
    let s = q.describe();
    assert!(s.contains("text=\"Save\""));
    assert!(s.contains("role=AXButton"));
  }
}
