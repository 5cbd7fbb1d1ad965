/*! Geometry types for screen coordinates.

Screen coordinates are top-left origin; y grows downward.
*/

use serde::{Deserialize, Serialize};

/// A 2D point in screen coordinates.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }

  /// Straight-line distance to another point.
  pub fn distance_to(&self, other: Point) -> f64 {
    (other.x - self.x).hypot(other.y - self.y)
  }
}

/// Width and height of an element or region.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Size {
  pub width: f64,
  pub height: f64,
}

impl Size {
  pub const fn new(width: f64, height: f64) -> Self {
    Self { width, height }
  }

  /// True when either dimension is zero (or negative from a bad read).
  pub fn is_empty(&self) -> bool {
    self.width <= 0.0 || self.height <= 0.0
  }

  pub fn area(&self) -> f64 {
    if self.is_empty() {
      0.0
    } else {
      self.width * self.height
    }
  }
}

/// Rectangle in screen coordinates (top-left origin).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Rect {
  pub x: f64,
  pub y: f64,
  pub width: f64,
  pub height: f64,
}

impl Rect {
  pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  pub const fn from_parts(origin: Point, size: Size) -> Self {
    Self {
      x: origin.x,
      y: origin.y,
      width: size.width,
      height: size.height,
    }
  }

  pub const fn origin(&self) -> Point {
    Point::new(self.x, self.y)
  }

  pub const fn size(&self) -> Size {
    Size::new(self.width, self.height)
  }

  pub fn max_x(&self) -> f64 {
    self.x + self.width
  }

  pub fn max_y(&self) -> f64 {
    self.y + self.height
  }

  pub fn center(&self) -> Point {
    Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
  }

  pub fn area(&self) -> f64 {
    self.size().area()
  }

  pub fn contains(&self, point: Point) -> bool {
    point.x >= self.x && point.x <= self.max_x() && point.y >= self.y && point.y <= self.max_y()
  }

  /// Intersection with another rect. `None` when the rects do not overlap.
  pub fn intersection(&self, other: &Rect) -> Option<Rect> {
    let x = self.x.max(other.x);
    let y = self.y.max(other.y);
    let max_x = self.max_x().min(other.max_x());
    let max_y = self.max_y().min(other.max_y());
    if max_x <= x || max_y <= y {
      return None;
    }
    Some(Rect::new(x, y, max_x - x, max_y - y))
  }

  /// Check if two rects match within a margin of error.
  pub fn matches(&self, other: &Rect, margin: f64) -> bool {
    (self.x - other.x).abs() <= margin
      && (self.y - other.y).abs() <= margin
      && (self.width - other.width).abs() <= margin
      && (self.height - other.height).abs() <= margin
  }
}
