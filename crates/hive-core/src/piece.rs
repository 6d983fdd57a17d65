//! Piece identity and placement.
//!
//! This module contains:
//! - `Color` for the two sides
//! - `PieceType` for the eight bug types
//! - `Piece`, an immutable identity plus an optional on-board placement

use crate::hex::BoardPosition;
use serde::{Deserialize, Serialize};

/// Unique identifier of a piece within one game. Assigned
/// sequentially at setup, white pieces before black.
pub type PieceId = u32;

/// Side color. White always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// The other side.
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

/// The eight bug types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PieceType {
    /// Moves one sliding step; losing her (fully surrounded) loses the game
    Queen,
    /// Slides any distance around the hive
    Ant,
    /// Slides exactly three steps without backtracking
    Spider,
    /// Jumps over a straight line of pieces to the first empty space
    Grasshopper,
    /// Moves one step and may climb on top of the hive
    Beetle,
    /// Climbs across exactly two pieces, then drops down
    Ladybug,
    /// Copies the movement of any bug type it is touching
    Mosquito,
    /// Moves one step; may relocate adjacent ground-level pieces
    Pillbug,
}

impl PieceType {
    /// All piece types
    pub const ALL: [PieceType; 8] = [
        PieceType::Queen,
        PieceType::Ant,
        PieceType::Spider,
        PieceType::Grasshopper,
        PieceType::Beetle,
        PieceType::Ladybug,
        PieceType::Mosquito,
        PieceType::Pillbug,
    ];
}

/// Where a piece sits on the board. Only present while the piece is
/// placed, so `stack` is defined exactly when `position` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// The occupied board position
    pub position: BoardPosition,
    /// Height index within the stack at `position`: 0 when alone or
    /// at the bottom, increasing upward
    pub stack: u32,
}

/// A single game piece. Identity (`id`, `color`, `kind`) never
/// changes; `placement` transitions from `None` (unplayed) to `Some`
/// when the piece enters the board. Pieces are never destroyed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: PieceId,
    pub color: Color,
    pub kind: PieceType,
    pub placement: Option<Placement>,
}

impl Piece {
    /// Create an unplayed piece.
    pub fn new(id: PieceId, color: Color, kind: PieceType) -> Self {
        Self {
            id,
            color,
            kind,
            placement: None,
        }
    }

    /// The piece's board position, if placed.
    pub fn position(&self) -> Option<BoardPosition> {
        self.placement.map(|p| p.position)
    }

    /// Height within its stack; 0 for unplayed or ground-level pieces.
    pub fn stack_height(&self) -> u32 {
        self.placement.map(|p| p.stack).unwrap_or(0)
    }

    /// Whether the piece is on the board.
    pub fn is_placed(&self) -> bool {
        self.placement.is_some()
    }

    /// Whether the piece sits on top of at least one other piece.
    pub fn is_stacked(&self) -> bool {
        self.stack_height() > 0
    }
}
