//! Hex coordinate system using axial coordinates (x, y).
//!
//! The board is an unbounded hex grid; positions are plain integer
//! pairs with no stored bounds. We use axial coordinates because they
//! make neighbor calculations elegant and avoid the wasted space of
//! offset coordinates.

use serde::{Deserialize, Serialize};

/// Number of sides of a hex tile, and therefore of neighbors a
/// position has.
pub const NUM_SIDES: usize = 6;

/// Axial coordinate on the hex grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct BoardPosition {
    /// Column (increases going east)
    pub x: i32,
    /// Row (increases going southeast)
    pub y: i32,
}

impl BoardPosition {
    /// Create a new position
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The six neighboring positions.
    pub fn neighbors(&self) -> [BoardPosition; NUM_SIDES] {
        let Self { x, y } = *self;
        [
            BoardPosition::new(x + 1, y),
            BoardPosition::new(x, y + 1),
            BoardPosition::new(x - 1, y),
            BoardPosition::new(x, y - 1),
            BoardPosition::new(x + 1, y - 1),
            BoardPosition::new(x - 1, y + 1),
        ]
    }

    /// Whether `other` is one of the six neighbors of this position.
    pub fn is_adjacent_to(&self, other: &BoardPosition) -> bool {
        self.neighbors().contains(other)
    }

    /// The direction vector pointing from this position toward an
    /// adjacent one. Adding the result repeatedly walks a straight
    /// hex line (used for grasshopper jumps).
    pub fn direction_to(&self, other: &BoardPosition) -> (i32, i32) {
        (other.x - self.x, other.y - self.y)
    }

    /// Offset this position by a direction vector.
    pub fn offset(&self, (dx, dy): (i32, i32)) -> BoardPosition {
        BoardPosition::new(self.x + dx, self.y + dy)
    }
}

/// The six neighbors of every input position, flattened. Not
/// deduplicated; callers dedupe by position where it matters.
pub fn surrounding_positions<'a, I>(positions: I) -> Vec<BoardPosition>
where
    I: IntoIterator<Item = &'a BoardPosition>,
{
    positions.into_iter().flat_map(|p| p.neighbors()).collect()
}
