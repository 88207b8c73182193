//! Board geometry and coordinates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A tile coordinate on the board.
///
/// Coordinates are signed so that offsets can be applied before the bounds
/// check; a coordinate is only meaningful once [`Board::in_bounds`] accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    /// X coordinate (column).
    pub x: i32,
    /// Y coordinate (row).
    pub y: i32,
}

impl Coord {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another coordinate.
    #[must_use]
    pub const fn distance(self, other: Coord) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Coordinate shifted by the given offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// All coordinates at Manhattan distance `1..=radius`, unfiltered.
    ///
    /// Scans the dense `(2r+1)²` square row by row and keeps the diamond.
    /// Distance 0 (the center itself) is never yielded.
    pub fn diamond(self, radius: u32) -> impl Iterator<Item = Coord> {
        let r = i32::try_from(radius).unwrap_or(i32::MAX / 2);
        (-r..=r).flat_map(move |dy| {
            (-r..=r).filter_map(move |dx| {
                let d = dx.unsigned_abs() + dy.unsigned_abs();
                (d != 0 && d <= radius).then(|| self.offset(dx, dy))
            })
        })
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Board dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    /// Width of the board in tiles.
    width: i32,
    /// Height of the board in tiles.
    height: i32,
}

impl Board {
    /// Create a board of the given size.
    ///
    /// Returns `None` if width or height is zero.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            width: i32::from(width),
            height: i32::from(height),
        })
    }

    /// Width of the board.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Height of the board.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Check if a coordinate is on the board.
    #[must_use]
    pub const fn in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height
    }

    /// Iterate every tile in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = Coord> {
        let width = self.width;
        (0..self.height).flat_map(move |y| (0..width).map(move |x| Coord::new(x, y)))
    }
}
