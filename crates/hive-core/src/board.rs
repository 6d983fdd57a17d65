//! Sparse board storage and movement geometry.
//!
//! This module contains:
//! - `Board`, a mapping from position to an ordered stack of pieces
//! - the one-hive connectivity check
//! - the gate rule that governs sliding, climbing, and dropping
//!
//! Stacks are kept in insertion order; the last element is the
//! topmost, visible piece. A position key exists only while its stack
//! is non-empty — every removal prunes, so iterating keys is the same
//! as iterating occupied positions.

use crate::hex::{surrounding_positions, BoardPosition, NUM_SIDES};
use crate::piece::{Piece, PieceId, Placement};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// The game board: piece stacks on an unbounded hex grid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Board {
    stacks: HashMap<BoardPosition, Vec<Piece>>,
}

impl Board {
    /// Create an empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no piece has been placed yet.
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Total number of placed pieces, counting every level of every stack.
    pub fn piece_count(&self) -> usize {
        self.stacks.values().map(|s| s.len()).sum()
    }

    /// All occupied positions.
    pub fn occupied_positions(&self) -> impl Iterator<Item = &BoardPosition> {
        self.stacks.keys()
    }

    /// The topmost (visible) piece at a position, if any.
    pub fn top_piece_at(&self, position: &BoardPosition) -> Option<&Piece> {
        self.stacks.get(position).and_then(|stack| stack.last())
    }

    /// All placed pieces, flattened across stacks. Order is not
    /// significant to callers.
    pub fn pieces(&self) -> Vec<&Piece> {
        self.stacks.values().flatten().collect()
    }

    /// Look up a placed piece by id.
    pub fn piece_by_id(&self, id: PieceId) -> Option<&Piece> {
        self.stacks
            .values()
            .flatten()
            .find(|piece| piece.id == id)
    }

    /// Top pieces at each of the six neighbor positions, skipping
    /// empty ones.
    pub fn surrounding_pieces(&self, position: &BoardPosition) -> Vec<&Piece> {
        position
            .neighbors()
            .iter()
            .filter_map(|p| self.top_piece_at(p))
            .collect()
    }

    /// Whether all six neighbor positions of a piece hold a piece.
    /// An unplayed piece is never surrounded.
    pub fn is_surrounded(&self, piece: &Piece) -> bool {
        match piece.position() {
            Some(position) => self.surrounding_pieces(&position).len() == NUM_SIDES,
            None => false,
        }
    }

    /// Place a piece on top of the stack at `position`, recording its
    /// new placement. The stack index is the stack length before the
    /// push.
    pub fn push_piece(&mut self, mut piece: Piece, position: BoardPosition) {
        let stack = self.stacks.entry(position).or_default();
        piece.placement = Some(Placement {
            position,
            stack: stack.len() as u32,
        });
        stack.push(piece);
    }

    /// Remove a placed piece by id, pruning the stack key if it
    /// becomes empty. Returns the removed piece with its placement
    /// cleared.
    pub fn remove_piece(&mut self, id: PieceId) -> Option<Piece> {
        let position = *self
            .stacks
            .iter()
            .find(|(_, stack)| stack.iter().any(|p| p.id == id))?
            .0;

        let stack = self.stacks.get_mut(&position)?;
        let index = stack.iter().position(|p| p.id == id)?;
        let mut removed = stack.remove(index);
        removed.placement = None;

        if stack.is_empty() {
            self.stacks.remove(&position);
        } else {
            for (i, piece) in stack.iter_mut().enumerate() {
                if let Some(placement) = piece.placement.as_mut() {
                    placement.stack = i as u32;
                }
            }
        }

        Some(removed)
    }

    /// A copy of the board with the given piece removed. Used to
    /// evaluate moves and connectivity as if the piece had been
    /// lifted off; the original board is untouched.
    pub fn without_piece(&self, piece: &Piece) -> Board {
        let mut board = self.clone();
        board.remove_piece(piece.id);
        board
    }

    /// One-hive check: every placed piece must be reachable from
    /// every other through chains of adjacency. Pieces sharing a
    /// stack are trivially connected. An empty board is vacuously
    /// connected.
    pub fn is_connected(&self) -> bool {
        let first = match self.stacks.keys().next() {
            Some(position) => *position,
            None => return true,
        };

        let mut visited: HashSet<BoardPosition> = HashSet::new();
        let mut frontier = vec![first];

        while let Some(position) = frontier.pop() {
            if !visited.insert(position) {
                continue;
            }
            for neighbor in position.neighbors() {
                if self.stacks.contains_key(&neighbor) && !visited.contains(&neighbor) {
                    frontier.push(neighbor);
                }
            }
        }

        visited.len() == self.stacks.len()
    }

    /// Empty neighbor positions of `position` that a ground-level
    /// piece can slide into: the destination must touch the hive, and
    /// exactly one of the two overlap neighbors shared with the
    /// source may be occupied. Two occupied overlaps form a gate; zero
    /// would break contact mid-slide.
    pub fn freely_movable_spaces(&self, position: &BoardPosition) -> Vec<BoardPosition> {
        position
            .neighbors()
            .into_iter()
            .filter(|target| {
                self.top_piece_at(target).is_none()
                    && !self.surrounding_pieces(target).is_empty()
                    && self.overlapping_neighbors(position, target).len() == 1
            })
            .collect()
    }

    /// Neighboring pieces the given piece can climb on top of without
    /// being blocked by a gate of taller stacks.
    pub fn freely_climbable_pieces(&self, piece: &Piece) -> Vec<&Piece> {
        let position = match piece.position() {
            Some(p) => p,
            None => return Vec::new(),
        };

        self.surrounding_pieces(&position)
            .into_iter()
            .filter(|neighbor| {
                let target = neighbor
                    .position()
                    .expect("placed pieces always carry a position");
                let overlap = self.overlapping_neighbors(&position, &target);
                can_slide_across_stacks(piece, &overlap, Some(neighbor))
            })
            .collect()
    }

    /// Empty neighbor positions a stacked piece can drop down into
    /// without being blocked by a gate. A ground-level piece has
    /// nowhere to drop from.
    pub fn freely_droppable_spaces(&self, piece: &Piece) -> Vec<BoardPosition> {
        let position = match piece.placement {
            Some(placement) if placement.stack > 0 => placement.position,
            _ => return Vec::new(),
        };

        position
            .neighbors()
            .into_iter()
            .filter(|target| {
                self.top_piece_at(target).is_none()
                    && can_slide_across_stacks(
                        piece,
                        &self.overlapping_neighbors(&position, target),
                        None,
                    )
            })
            .collect()
    }

    /// The top pieces at the positions neighboring both `source` and
    /// `target` — the two cells a piece squeezes between when moving
    /// from one to the other.
    pub fn overlapping_neighbors(
        &self,
        source: &BoardPosition,
        target: &BoardPosition,
    ) -> Vec<&Piece> {
        let source_neighbors = source.neighbors();
        target
            .neighbors()
            .iter()
            .filter(|n| source_neighbors.contains(n))
            .filter_map(|n| self.top_piece_at(n))
            .collect()
    }
}

/// Gate rule for movement across stacks, from the Hive FAQ: moving
/// between positions A and B is blocked only when the shorter of the
/// two blocking stacks C and D is still taller than both the source
/// piece's height below its topmost self and the target's existing
/// height. With fewer than two blockers there is no gate.
pub fn can_slide_across_stacks(
    source: &Piece,
    blockers: &[&Piece],
    target: Option<&Piece>,
) -> bool {
    if blockers.len() < 2 {
        return true;
    }

    let min_blocker = blockers
        .iter()
        .map(|b| b.stack_height() as i64)
        .min()
        .unwrap_or(0);
    let max_source_target = i64::max(
        source.stack_height() as i64 - 1,
        target.map(|t| t.stack_height() as i64).unwrap_or(0),
    );

    min_blocker <= max_source_target
}

/// Collect the surrounding positions of a set of placed pieces.
/// Duplicates are retained, matching [`surrounding_positions`].
pub fn positions_around_pieces<'a, I>(pieces: I) -> Vec<BoardPosition>
where
    I: IntoIterator<Item = &'a Piece>,
{
    let positions: Vec<BoardPosition> = pieces
        .into_iter()
        .filter_map(|piece| piece.position())
        .collect();
    surrounding_positions(positions.iter())
}
