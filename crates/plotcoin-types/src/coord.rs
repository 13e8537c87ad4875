//! Integer grid coordinates.
//!
//! The grid is unbounded in every direction. Positive `y` points "up", so
//! the top edge of a rectangle is its `max_y` row. A reserved sentinel,
//! [`GridCoord::INVALID`], stands for "no valid location"; producers return
//! it instead of an `Option` and consumers compare against it before use.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A signed 2D integer grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GridCoord {
    /// Column.
    pub x: i32,
    /// Row (grows upward).
    pub y: i32,
}

impl GridCoord {
    /// The "no valid location" sentinel.
    pub const INVALID: Self = Self {
        x: i32::MAX,
        y: i32::MAX,
    };

    /// The origin, `(0, 0)`.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Create a coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether this coordinate is anything other than the sentinel.
    pub const fn is_valid(self) -> bool {
        !(self.x == Self::INVALID.x && self.y == Self::INVALID.y)
    }

    /// Translate by `(dx, dy)`, saturating at the integer limits.
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// The four orthogonal neighbours in up, left, down, right order.
    pub const fn neighbors4(self) -> [Self; 4] {
        [
            self.offset(0, 1),
            self.offset(-1, 0),
            self.offset(0, -1),
            self.offset(1, 0),
        ]
    }

    /// Chebyshev distance to `other` (the number of king moves).
    pub const fn chebyshev(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        if dx > dy { dx } else { dy }
    }
}

impl core::fmt::Display for GridCoord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_is_not_valid() {
        assert!(!GridCoord::INVALID.is_valid());
        assert!(GridCoord::ORIGIN.is_valid());
        assert!(GridCoord::new(i32::MAX, 0).is_valid());
    }

    #[test]
    fn neighbours_are_orthogonal() {
        let c = GridCoord::new(3, -2);
        let n = c.neighbors4();
        assert_eq!(n[0], GridCoord::new(3, -1));
        assert_eq!(n[1], GridCoord::new(2, -2));
        assert_eq!(n[2], GridCoord::new(3, -3));
        assert_eq!(n[3], GridCoord::new(4, -2));
        assert!(n.iter().all(|adj| c.chebyshev(*adj) == 1));
    }

    #[test]
    fn chebyshev_takes_larger_axis() {
        assert_eq!(GridCoord::new(0, 0).chebyshev(GridCoord::new(-3, 2)), 3);
        assert_eq!(GridCoord::new(1, 1).chebyshev(GridCoord::new(1, 1)), 0);
    }

    #[test]
    fn display_format() {
        assert_eq!(GridCoord::new(-1, 4).to_string(), "(-1, 4)");
    }
}
