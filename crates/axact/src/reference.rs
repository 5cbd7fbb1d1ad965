/*!
Stable element references.

Round-trips between an element and a compact string so later commands can
re-target it without repeating the search. Three tiers, best first: the
accessibility identifier, the structural position (role + sibling index +
parent role), and a grid-snapped screen position. Serialized with an `@`
prefix at the boundary, e.g. `@ref:Button-2-Toolbar`.
*/

use crate::a11y::{normalize_role, short_role};
use crate::types::{Element, ElementQuery, Error, Point, Result};

/// Lattice pitch for positional references, in pixels.
const GRID: f64 = 50.0;

/// Matches returned when decoding a structural reference; the first is
/// taken.
const STRUCTURAL_LIMIT: usize = 10;

/// A stable, serializable element reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementReference {
  /// By accessibility identifier: `@id:<identifier>`.
  Id { identifier: String },
  /// By structure: `@ref:<role>-<siblingIndex>-<parentRole>`, roles with
  /// the prefix stripped.
  Structural {
    role: String,
    sibling_index: usize,
    parent_role: String,
  },
  /// By grid-snapped position: `@pos:<role>-<gridX>-<gridY>`.
  Positional {
    role: String,
    grid_x: i64,
    grid_y: i64,
  },
}

impl ElementReference {
  /// Best available reference for an element (first tier that applies).
  pub fn for_element(element: &Element) -> Self {
    if let Some(identifier) = element
      .identifier
      .as_deref()
      .filter(|id| !id.is_empty())
    {
      return Self::Id {
        identifier: identifier.to_string(),
      };
    }
    if let (Some(sibling_index), Some(parent_role)) =
      (element.sibling_index, element.parent_role.as_deref())
    {
      return Self::Structural {
        role: short_role(&element.role).to_string(),
        sibling_index,
        parent_role: short_role(parent_role).to_string(),
      };
    }
    Self::Positional {
      role: short_role(&element.role).to_string(),
      grid_x: snap(element.position.x),
      grid_y: snap(element.position.y),
    }
  }

  /// Serialized form, `@` prefix included.
  pub fn encode(&self) -> String {
    match self {
      Self::Id { identifier } => format!("@id:{identifier}"),
      Self::Structural {
        role,
        sibling_index,
        parent_role,
      } => format!("@ref:{role}-{sibling_index}-{parent_role}"),
      Self::Positional {
        role,
        grid_x,
        grid_y,
      } => format!("@pos:{role}-{grid_x}-{grid_y}"),
    }
  }

  /// Parse a serialized reference. The `@` prefix is required.
  pub fn parse(input: &str) -> Result<Self> {
    let malformed = || Error::MalformedReference(input.to_string());
    let body = input.strip_prefix('@').ok_or_else(malformed)?;
    let (tier, payload) = body.split_once(':').ok_or_else(malformed)?;
    match tier {
      "id" if !payload.is_empty() => Ok(Self::Id {
        identifier: payload.to_string(),
      }),
      "ref" => {
        let mut parts = payload.split('-');
        let (Some(role), Some(index), Some(parent), None) =
          (parts.next(), parts.next(), parts.next(), parts.next())
        else {
          return Err(malformed());
        };
        let sibling_index = index.parse().map_err(|_| malformed())?;
        if role.is_empty() || parent.is_empty() {
          return Err(malformed());
        }
        Ok(Self::Structural {
          role: role.to_string(),
          sibling_index,
          parent_role: parent.to_string(),
        })
      }
      "pos" => {
        let (rest, grid_y) = split_trailing_int(payload).ok_or_else(malformed)?;
        let (role, grid_x) = split_trailing_int(rest).ok_or_else(malformed)?;
        if role.is_empty() {
          return Err(malformed());
        }
        Ok(Self::Positional {
          role: role.to_string(),
          grid_x,
          grid_y,
        })
      }
      _ => Err(malformed()),
    }
  }

  /// Query that re-finds the referenced element.
  ///
  /// Identifier references resolve uniquely; structural references return
  /// up to ten candidates for the caller to take the first of; positional
  /// references narrow by role only, leaving proximity filtering (via
  /// [`Self::grid_point`]) to the caller.
  pub fn to_query(&self) -> ElementQuery {
    match self {
      Self::Id { identifier } => ElementQuery::new()
        .with_identifier(identifier.clone())
        .with_limit(1),
      Self::Structural {
        role,
        sibling_index,
        parent_role,
      } => ElementQuery::new()
        .with_role(normalize_role(role))
        .with_sibling_index(*sibling_index)
        .with_parent_role(normalize_role(parent_role))
        .with_limit(STRUCTURAL_LIMIT),
      Self::Positional { role, .. } => ElementQuery::new().with_role(normalize_role(role)),
    }
  }

  /// The lattice point of a positional reference.
  pub fn grid_point(&self) -> Option<Point> {
    match self {
      Self::Positional { grid_x, grid_y, .. } => {
        Some(Point::new(*grid_x as f64, *grid_y as f64))
      }
      Self::Id { .. } | Self::Structural { .. } => None,
    }
  }
}

impl std::fmt::Display for ElementReference {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.encode())
  }
}

impl std::str::FromStr for ElementReference {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::parse(s)
  }
}

fn snap(coordinate: f64) -> i64 {
  ((coordinate / GRID).round() * GRID) as i64
}

/// Split `"<head>-<int>"`, tolerating a negative integer (double dash).
fn split_trailing_int(input: &str) -> Option<(&str, i64)> {
  let dash = input.rfind('-')?;
  let value: i64 = input[dash + 1..].parse().ok()?;
  let head = &input[..dash];
  if let Some(stripped) = head.strip_suffix('-') {
    Some((stripped, -value))
  } else {
    Some((head, value))
  }
}
