/*! Typed results returned by the search and scroll services. */

use super::{Element, Point};
use serde::{Deserialize, Serialize};

/// Outcome of one element search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
  pub elements: Vec<Element>,
  /// Wall-clock duration of the search in milliseconds.
  pub duration_ms: u64,
  /// Total nodes visited, including non-matching ones.
  pub searched_count: usize,
}

/// Mechanism that brought an element into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrollMethod {
  /// Already visible; nothing was done.
  #[serde(rename = "none")]
  None,
  /// The element's native scroll-to-visible action.
  #[serde(rename = "AXScrollToVisible")]
  AxScrollToVisible,
  /// Synthetic wheel events with position re-query.
  #[serde(rename = "synthetic")]
  Synthetic,
  #[serde(rename = "failed")]
  Failed,
}

/// Outcome of a scroll-into-view request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollIntoViewResult {
  pub success: bool,
  pub attempts: u32,
  /// Element position after the final re-query, when it was found.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub final_position: Option<Point>,
  /// Accumulated content movement, viewport-relative (positive y = content
  /// scrolled down).
  pub scrolled_by: Point,
  pub method: ScrollMethod,
}
