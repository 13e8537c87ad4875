//! Axis-aligned rectangles on the grid.
//!
//! A [`BoundingRegion`] has inclusive bounds and an optional buffer. The
//! tight bounds form the inner region; the buffered (outer) region extends
//! every side by the buffer distance. A region may carry the [`ClaimId`] of
//! the claim it belongs to, so that buffer checks can skip the claim's own
//! padding.

use plotcoin_types::{ClaimId, GridCoord};
use serde::{Deserialize, Serialize};

/// An inclusive rectangle of grid coordinates.
///
/// Width and height are always at least 1: a region is built from at least
/// one coordinate and only ever grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingRegion {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    buffer: u32,
    owner: Option<ClaimId>,
}

impl BoundingRegion {
    /// A 1x1 region around a single coordinate with no buffer.
    pub const fn around(coord: GridCoord) -> Self {
        Self {
            min_x: coord.x,
            min_y: coord.y,
            max_x: coord.x,
            max_y: coord.y,
            buffer: 0,
            owner: None,
        }
    }

    /// The smallest region containing every coordinate, or `None` if the
    /// iterator is empty.
    pub fn from_coords<I: IntoIterator<Item = GridCoord>>(coords: I) -> Option<Self> {
        let mut iter = coords.into_iter();
        let mut region = Self::around(iter.next()?);
        for coord in iter {
            region.expand_to_include(coord);
        }
        Some(region)
    }

    /// Return a copy with the given buffer distance.
    #[must_use]
    pub const fn with_buffer(mut self, buffer: u32) -> Self {
        self.buffer = buffer;
        self
    }

    /// Return a copy owned by the given claim.
    #[must_use]
    pub const fn with_owner(mut self, owner: ClaimId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Leftmost column.
    pub const fn min_x(&self) -> i32 {
        self.min_x
    }

    /// Bottom row.
    pub const fn min_y(&self) -> i32 {
        self.min_y
    }

    /// Rightmost column.
    pub const fn max_x(&self) -> i32 {
        self.max_x
    }

    /// Top row.
    pub const fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Buffer distance around the tight bounds.
    pub const fn buffer(&self) -> u32 {
        self.buffer
    }

    /// The claim this region belongs to, if any.
    pub const fn owner(&self) -> Option<ClaimId> {
        self.owner
    }

    /// Number of columns, `max_x - min_x + 1`.
    pub fn width(&self) -> u32 {
        span(self.min_x, self.max_x)
    }

    /// Number of rows, `max_y - min_y + 1`.
    pub fn height(&self) -> u32 {
        span(self.min_y, self.max_y)
    }

    /// Whether the tight bounds contain `coord`.
    pub const fn contains(&self, coord: GridCoord) -> bool {
        coord.x >= self.min_x
            && coord.x <= self.max_x
            && coord.y >= self.min_y
            && coord.y <= self.max_y
    }

    /// Whether the buffered bounds contain `coord`.
    pub const fn contains_buffered(&self, coord: GridCoord) -> bool {
        self.buffered().contains(coord)
    }

    /// Grow the tight bounds to include `coord`.
    pub const fn expand_to_include(&mut self, coord: GridCoord) {
        if coord.x < self.min_x {
            self.min_x = coord.x;
        }
        if coord.x > self.max_x {
            self.max_x = coord.x;
        }
        if coord.y < self.min_y {
            self.min_y = coord.y;
        }
        if coord.y > self.max_y {
            self.max_y = coord.y;
        }
    }

    /// The outer region: tight bounds extended by the buffer on every side.
    ///
    /// The result has a buffer of zero and keeps the owner.
    #[must_use]
    pub const fn buffered(&self) -> Self {
        Self {
            min_x: self.min_x.saturating_sub_unsigned(self.buffer),
            min_y: self.min_y.saturating_sub_unsigned(self.buffer),
            max_x: self.max_x.saturating_add_unsigned(self.buffer),
            max_y: self.max_y.saturating_add_unsigned(self.buffer),
            buffer: 0,
            owner: self.owner,
        }
    }

    /// Grow the region to at least `min_width` x `min_height`.
    ///
    /// Padding is split between both sides of an axis; an odd remainder puts
    /// the extra unit on the max side.
    #[must_use]
    pub fn padded_to(&self, min_width: u32, min_height: u32) -> Self {
        let (min_x, max_x) = pad_axis(self.min_x, self.max_x, min_width);
        let (min_y, max_y) = pad_axis(self.min_y, self.max_y, min_height);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            ..*self
        }
    }

    /// The ring of coordinates immediately outside the buffered region.
    ///
    /// Walks clockwise from the top-left corner: top edge left to right,
    /// right edge top to bottom, bottom edge right to left, left edge bottom
    /// to top. Each corner appears exactly once, so a buffered region of
    /// `w` x `h` yields `2w + 2h + 4` coordinates.
    pub fn ring(&self) -> Vec<GridCoord> {
        let outer = self.buffered();
        let left = outer.min_x.saturating_sub(1);
        let right = outer.max_x.saturating_add(1);
        let top = outer.max_y.saturating_add(1);
        let bottom = outer.min_y.saturating_sub(1);

        let capacity = usize::try_from(
            u64::from(outer.width())
                .saturating_add(u64::from(outer.height()))
                .saturating_mul(2)
                .saturating_add(4),
        )
        .unwrap_or(0);
        let mut ring = Vec::with_capacity(capacity);

        ring.extend((left..=right).map(|x| GridCoord::new(x, top)));
        ring.extend((bottom..=outer.max_y).rev().map(|y| GridCoord::new(right, y)));
        ring.extend((left..=outer.max_x).rev().map(|x| GridCoord::new(x, bottom)));
        ring.extend((outer.min_y..=outer.max_y).map(|y| GridCoord::new(left, y)));
        ring
    }

    /// Every coordinate inside the tight bounds, row by row from the bottom.
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> + use<> {
        let (min_x, max_x) = (self.min_x, self.max_x);
        (self.min_y..=self.max_y)
            .flat_map(move |y| (min_x..=max_x).map(move |x| GridCoord::new(x, y)))
    }
}

/// Inclusive length of `min..=max`.
fn span(min: i32, max: i32) -> u32 {
    u32::try_from(i64::from(max).saturating_sub(i64::from(min)).saturating_add(1))
        .unwrap_or(u32::MAX)
}

/// Widen `min..=max` to at least `target` units, extra unit on the max side.
fn pad_axis(min: i32, max: i32, target: u32) -> (i32, i32) {
    let current = span(min, max);
    if current >= target {
        return (min, max);
    }
    let diff = target.saturating_sub(current);
    let low = diff.checked_div(2).unwrap_or(0);
    let high = diff.saturating_sub(low);
    (
        min.saturating_sub_unsigned(low),
        max.saturating_add_unsigned(high),
    )
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn rect(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> BoundingRegion {
        BoundingRegion::from_coords([GridCoord::new(min_x, min_y), GridCoord::new(max_x, max_y)])
            .unwrap()
    }

    #[test]
    fn single_tile_is_one_by_one() {
        let region = BoundingRegion::around(GridCoord::new(4, -2));
        assert_eq!(region.width(), 1);
        assert_eq!(region.height(), 1);
        assert!(region.contains(GridCoord::new(4, -2)));
        assert!(!region.contains(GridCoord::new(5, -2)));
    }

    #[test]
    fn from_coords_empty_is_none() {
        assert!(BoundingRegion::from_coords(Vec::new()).is_none());
    }

    #[test]
    fn expand_grows_bounds() {
        let mut region = BoundingRegion::around(GridCoord::ORIGIN);
        region.expand_to_include(GridCoord::new(3, -1));
        assert_eq!(region.min_x(), 0);
        assert_eq!(region.max_x(), 3);
        assert_eq!(region.min_y(), -1);
        assert_eq!(region.max_y(), 0);
        assert_eq!(region.width(), 4);
        assert_eq!(region.height(), 2);
    }

    #[test]
    fn buffered_extends_every_side() {
        let region = rect(0, 0, 2, 1).with_buffer(2);
        let outer = region.buffered();
        assert_eq!(outer.min_x(), -2);
        assert_eq!(outer.max_x(), 4);
        assert_eq!(outer.min_y(), -2);
        assert_eq!(outer.max_y(), 3);
        assert_eq!(outer.buffer(), 0);
        assert!(region.contains_buffered(GridCoord::new(-2, 3)));
        assert!(!region.contains_buffered(GridCoord::new(-3, 3)));
    }

    #[test]
    fn padding_puts_odd_unit_on_max_side() {
        // Width 1 -> 10: 4 on the min side, 5 on the max side.
        // Height 1 -> 5: 2 on each side.
        let padded = BoundingRegion::around(GridCoord::ORIGIN).padded_to(10, 5);
        assert_eq!(padded.width(), 10);
        assert_eq!(padded.height(), 5);
        assert_eq!(padded.min_x(), -4);
        assert_eq!(padded.max_x(), 5);
        assert_eq!(padded.min_y(), -2);
        assert_eq!(padded.max_y(), 2);
    }

    #[test]
    fn padding_leaves_large_regions_alone() {
        let region = rect(0, 0, 19, 9);
        assert_eq!(region.padded_to(10, 5), region);
    }

    #[test]
    fn ring_walks_clockwise_from_top_left() {
        let ring = BoundingRegion::around(GridCoord::ORIGIN).ring();
        let expected: Vec<GridCoord> = [
            (-1, 1),
            (0, 1),
            (1, 1),
            (1, 0),
            (1, -1),
            (0, -1),
            (-1, -1),
            (-1, 0),
        ]
        .into_iter()
        .map(GridCoord::from)
        .collect();
        assert_eq!(ring, expected);
    }

    #[test]
    fn ring_size_and_uniqueness() {
        let region = rect(0, 0, 3, 1).with_buffer(1);
        let outer = region.buffered();
        let ring = region.ring();
        let expected_len = 2 * outer.width() + 2 * outer.height() + 4;
        assert_eq!(ring.len(), expected_len as usize);

        let unique: BTreeSet<GridCoord> = ring.iter().copied().collect();
        assert_eq!(unique.len(), ring.len());
        for coord in &ring {
            assert!(!outer.contains(*coord));
            let dx = (coord.x - outer.min_x()).min(outer.max_x() - coord.x);
            let dy = (coord.y - outer.min_y()).min(outer.max_y() - coord.y);
            assert!(dx == -1 || dy == -1, "{coord} not adjacent to region");
        }
    }

    #[test]
    fn coords_covers_every_tile() {
        let region = rect(-1, 0, 1, 1);
        let coords: Vec<GridCoord> = region.coords().collect();
        assert_eq!(coords.len(), 6);
        assert_eq!(coords[0], GridCoord::new(-1, 0));
        assert_eq!(coords[5], GridCoord::new(1, 1));
    }

    #[test]
    fn owner_survives_buffering() {
        let owner = ClaimId::new();
        let region = BoundingRegion::around(GridCoord::ORIGIN)
            .with_owner(owner)
            .with_buffer(1);
        assert_eq!(region.buffered().owner(), Some(owner));
    }
}
