//! Legal move generation.
//!
//! `legal_moves` runs an ordered rule pipeline: turn ownership, the
//! opening placements, the queen-by-fourth-placement rule, covered
//! and just-moved pieces, the one-hive rule, placement adjacency for
//! unplayed pieces, and finally the per-bug movement generators plus
//! the pillbug's relocation ability. The first rule that applies and
//! yields nothing short-circuits the rest.
//!
//! All per-bug generators evaluate the board with the moving piece
//! lifted off, so a piece never blocks its own slide.

use crate::board::{positions_around_pieces, Board};
use crate::hex::BoardPosition;
use crate::piece::{Color, Piece, PieceType, Placement};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Record of the most recent successful move. The piece moved by the
/// opponent on the immediately preceding turn may not be moved back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// Color that made the move
    pub color: Color,
    /// The piece as it stood after the move
    pub piece: Piece,
    /// Origin, or `None` for a placement from the unplayed pool
    pub moved_from: Option<BoardPosition>,
    /// Destination
    pub moved_to: BoardPosition,
}

/// Every position the given piece may legally move to or be placed
/// at, for the player of `acting_color` while it is `turn_color`'s
/// turn. Deduplicated by position; order is not significant.
pub fn legal_moves(
    piece: &Piece,
    board: &Board,
    acting_color: Color,
    turn_color: Color,
    last_move: Option<&Move>,
    tournament: bool,
) -> Vec<BoardPosition> {
    // A player whose turn it is not has no moves at all.
    if acting_color != turn_color {
        return Vec::new();
    }

    // First placement always lands on the origin; tournament rules
    // forbid opening with the queen.
    if board.is_empty() {
        if tournament && piece.kind == PieceType::Queen {
            return Vec::new();
        }
        return vec![BoardPosition::new(0, 0)];
    }

    // Second placement may touch the single placed piece anywhere.
    if board.piece_count() == 1 {
        if tournament && piece.kind == PieceType::Queen {
            return Vec::new();
        }
        let only = board.pieces()[0]
            .position()
            .expect("placed pieces always carry a position");
        return only.neighbors().to_vec();
    }

    let friendly: Vec<&Piece> = board
        .pieces()
        .into_iter()
        .filter(|p| p.color == acting_color)
        .collect();
    let queen_placed = friendly.iter().any(|p| p.kind == PieceType::Queen);

    // Board pieces are frozen until their queen is placed.
    if !queen_placed && piece.is_placed() {
        return Vec::new();
    }

    // Three placements down without the queen: the fourth must be her.
    if friendly.len() == 3 && !queen_placed && piece.kind != PieceType::Queen {
        return Vec::new();
    }

    // A piece underneath another piece cannot move.
    if let Some(position) = piece.position() {
        if board
            .top_piece_at(&position)
            .map(|top| top.id)
            != Some(piece.id)
        {
            return Vec::new();
        }
    }

    // The piece moved on the immediately preceding turn is immobile.
    if last_move.is_some_and(|m| m.piece.id == piece.id) {
        return Vec::new();
    }

    // One-hive rule: lifting the piece must not split the hive.
    if piece.is_placed() && !board.without_piece(piece).is_connected() {
        return Vec::new();
    }

    // Placements go on empty cells touching only friendly pieces.
    if !piece.is_placed() {
        let placements: HashSet<BoardPosition> =
            positions_around_pieces(friendly.iter().copied())
                .into_iter()
                .filter(|candidate| {
                    board.top_piece_at(candidate).is_none()
                        && board
                            .surrounding_pieces(candidate)
                            .iter()
                            .all(|neighbor| neighbor.color == acting_color)
                })
                .collect();
        return placements.into_iter().collect();
    }

    // Per-bug movement, for the player's own pieces only. Opponent
    // pieces can still gain moves below through a friendly pillbug.
    let mut moves: HashSet<BoardPosition> = if piece.color == acting_color {
        moves_for_type(piece.kind, piece, board).into_iter().collect()
    } else {
        HashSet::new()
    };

    moves.extend(pillbug_granted_moves(piece, board, acting_color, last_move));
    moves.into_iter().collect()
}

/// Whether the given color has any legal move for any of its pieces,
/// placed or unplayed. The tournament flag only constrains the very
/// first placement, where alternatives always exist, so it plays no
/// part here.
pub fn player_has_moves(
    board: &Board,
    color: Color,
    unplayed_pieces: &[Piece],
    last_move: Option<&Move>,
) -> bool {
    unplayed_pieces
        .iter()
        .chain(board.pieces())
        .any(|piece| !legal_moves(piece, board, color, color, last_move, false).is_empty())
}

fn moves_for_type(kind: PieceType, piece: &Piece, board: &Board) -> Vec<BoardPosition> {
    match kind {
        PieceType::Queen | PieceType::Pillbug => slide_steps(piece, board, 1),
        PieceType::Ant => slide_closure(piece, board),
        PieceType::Spider => slide_steps(piece, board, 3),
        PieceType::Grasshopper => grasshopper_moves(piece, board),
        PieceType::Beetle => beetle_moves(piece, board),
        PieceType::Ladybug => ladybug_moves(piece, board),
        PieceType::Mosquito => mosquito_moves(piece, board),
    }
}

/// Endpoints of slide paths of exactly `steps` steps, never
/// revisiting a position within one path. One step gives the queen
/// and pillbug their movement; three gives the spider.
fn slide_steps(piece: &Piece, board: &Board, steps: usize) -> Vec<BoardPosition> {
    let origin = match piece.position() {
        Some(p) => p,
        None => return Vec::new(),
    };
    let without = board.without_piece(piece);

    let mut endpoints = HashSet::new();
    let mut path = HashSet::new();
    walk_slides(origin, steps, &without, &mut path, &mut endpoints);
    endpoints.remove(&origin);
    endpoints.into_iter().collect()
}

fn walk_slides(
    position: BoardPosition,
    remaining: usize,
    board: &Board,
    path: &mut HashSet<BoardPosition>,
    endpoints: &mut HashSet<BoardPosition>,
) {
    if remaining == 0 {
        endpoints.insert(position);
        return;
    }
    path.insert(position);
    for next in board.freely_movable_spaces(&position) {
        if !path.contains(&next) {
            walk_slides(next, remaining - 1, board, path, endpoints);
        }
    }
    path.remove(&position);
}

/// Every empty space reachable by repeated sliding: the ant's
/// movement. A plain flood fill over the freely-movable graph.
fn slide_closure(piece: &Piece, board: &Board) -> Vec<BoardPosition> {
    let origin = match piece.position() {
        Some(p) => p,
        None => return Vec::new(),
    };
    let without = board.without_piece(piece);

    let mut reachable = HashSet::new();
    reachable.insert(origin);
    let mut frontier = vec![origin];
    while let Some(position) = frontier.pop() {
        for next in without.freely_movable_spaces(&position) {
            if reachable.insert(next) {
                frontier.push(next);
            }
        }
    }
    reachable.remove(&origin);
    reachable.into_iter().collect()
}

/// For each occupied neighbor direction, jump the line of pieces and
/// land on the first empty cell beyond it. Exactly one landing cell
/// per occupied direction.
fn grasshopper_moves(piece: &Piece, board: &Board) -> Vec<BoardPosition> {
    let origin = match piece.position() {
        Some(p) => p,
        None => return Vec::new(),
    };

    board
        .surrounding_pieces(&origin)
        .into_iter()
        .map(|neighbor| {
            let start = neighbor
                .position()
                .expect("placed pieces always carry a position");
            let direction = origin.direction_to(&start);
            let mut landing = start;
            while board.top_piece_at(&landing).is_some() {
                landing = landing.offset(direction);
            }
            landing
        })
        .collect()
}

/// Climb onto a neighboring piece, drop back down when stacked, or
/// take a single ground step.
fn beetle_moves(piece: &Piece, board: &Board) -> Vec<BoardPosition> {
    if !piece.is_placed() {
        return Vec::new();
    }

    let mut moves: Vec<BoardPosition> = board
        .freely_climbable_pieces(piece)
        .into_iter()
        .filter_map(|p| p.position())
        .collect();

    if piece.is_stacked() {
        moves.extend(board.freely_droppable_spaces(piece));
    } else {
        moves.extend(slide_steps(piece, board, 1));
    }
    moves
}

/// Exactly two climbs over occupied cells followed by one drop onto
/// an empty neighbor. The second climb runs on the board without the
/// ladybug so it cannot climb over itself; the drop runs on the full
/// board so it cannot land back on its own cell.
fn ladybug_moves(piece: &Piece, board: &Board) -> Vec<BoardPosition> {
    if !piece.is_placed() {
        return Vec::new();
    }
    let without = board.without_piece(piece);

    let mut second_climbs: HashSet<(BoardPosition, u32)> = HashSet::new();
    for first in board.freely_climbable_pieces(piece) {
        let on_first = simulate_on_top(piece, first);
        for second in without.freely_climbable_pieces(&on_first) {
            let position = second
                .position()
                .expect("placed pieces always carry a position");
            second_climbs.insert((position, second.stack_height()));
        }
    }

    let mut drops = HashSet::new();
    for (position, stack) in second_climbs {
        let mut on_second = piece.clone();
        on_second.placement = Some(Placement {
            position,
            stack: stack + 1,
        });
        drops.extend(board.freely_droppable_spaces(&on_second));
    }
    drops.into_iter().collect()
}

/// Copy the movement of every distinct bug type the mosquito is
/// touching. While stacked it keeps moving as a beetle until it is
/// back on the ground; a neighboring mosquito contributes nothing.
fn mosquito_moves(piece: &Piece, board: &Board) -> Vec<BoardPosition> {
    if piece.is_stacked() {
        return beetle_moves(piece, board);
    }
    let origin = match piece.position() {
        Some(p) => p,
        None => return Vec::new(),
    };

    let kinds: HashSet<PieceType> = board
        .surrounding_pieces(&origin)
        .into_iter()
        .map(|p| p.kind)
        .collect();

    let mut moves = HashSet::new();
    for kind in kinds {
        if kind == PieceType::Mosquito {
            continue;
        }
        moves.extend(moves_for_type(kind, piece, board));
    }
    moves.into_iter().collect()
}

/// Relocations granted by a friendly pillbug (or a grounded friendly
/// mosquito touching a pillbug): a ground-level piece adjacent and
/// freely climbable to it may be set down on any empty space the
/// pillbug can reach as a drop. The pillbug cannot use the ability on
/// the turn after it was itself moved.
fn pillbug_granted_moves(
    piece: &Piece,
    board: &Board,
    acting_color: Color,
    last_move: Option<&Move>,
) -> Vec<BoardPosition> {
    if piece.is_stacked() {
        return Vec::new();
    }
    let position = match piece.position() {
        Some(p) => p,
        None => return Vec::new(),
    };

    let climbable: HashSet<BoardPosition> = board
        .freely_climbable_pieces(piece)
        .into_iter()
        .filter_map(|p| p.position())
        .collect();

    board
        .surrounding_pieces(&position)
        .into_iter()
        .filter(|carrier| {
            carrier.color == acting_color
                && !last_move.is_some_and(|m| m.piece.id == carrier.id)
                && is_pillbug_carrier(carrier, board)
                && carrier.position().is_some_and(|p| climbable.contains(&p))
        })
        .flat_map(|carrier| {
            let on_top = simulate_on_top(piece, carrier);
            board.freely_droppable_spaces(&on_top)
        })
        .collect()
}

fn is_pillbug_carrier(carrier: &Piece, board: &Board) -> bool {
    match carrier.kind {
        PieceType::Pillbug => true,
        PieceType::Mosquito => {
            !carrier.is_stacked()
                && carrier.position().is_some_and(|p| {
                    board
                        .surrounding_pieces(&p)
                        .iter()
                        .any(|n| n.kind == PieceType::Pillbug)
                })
        }
        _ => false,
    }
}

/// The moving piece as it would stand right on top of `target`.
fn simulate_on_top(piece: &Piece, target: &Piece) -> Piece {
    let placement = target
        .placement
        .expect("placed pieces always carry a placement");
    let mut simulated = piece.clone();
    simulated.placement = Some(Placement {
        position: placement.position,
        stack: placement.stack + 1,
    });
    simulated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceId;
    use pretty_assertions::assert_eq;

    fn pos(x: i32, y: i32) -> BoardPosition {
        BoardPosition::new(x, y)
    }

    /// Board builder: places each (id, color, kind, x, y) in order,
    /// stacking where positions repeat.
    fn board_with(pieces: &[(PieceId, Color, PieceType, i32, i32)]) -> Board {
        let mut board = Board::new();
        for &(id, color, kind, x, y) in pieces {
            board.push_piece(Piece::new(id, color, kind), pos(x, y));
        }
        board
    }

    fn moves_of(board: &Board, id: PieceId, color: Color) -> Vec<BoardPosition> {
        let piece = board.piece_by_id(id).unwrap().clone();
        let mut moves = legal_moves(&piece, board, color, color, None, false);
        moves.sort_by_key(|p| (p.x, p.y));
        moves
    }

    use Color::{Black, White};
    use PieceType::*;

    #[test]
    fn test_not_your_turn_yields_nothing() {
        let board = board_with(&[(0, White, Queen, 0, 0), (1, Black, Queen, 1, 0)]);
        let piece = board.piece_by_id(0).unwrap().clone();
        assert!(legal_moves(&piece, &board, White, Black, None, false).is_empty());
    }

    #[test]
    fn test_opening_moves() {
        let board = Board::new();
        let ant = Piece::new(0, White, Ant);
        assert_eq!(
            legal_moves(&ant, &board, White, White, None, false),
            vec![pos(0, 0)]
        );
        assert_eq!(
            legal_moves(&ant, &board, White, White, None, true),
            vec![pos(0, 0)]
        );

        let queen = Piece::new(1, White, Queen);
        assert_eq!(
            legal_moves(&queen, &board, White, White, None, false),
            vec![pos(0, 0)]
        );
        assert!(legal_moves(&queen, &board, White, White, None, true).is_empty());
    }

    #[test]
    fn test_second_placement_surrounds_first() {
        let board = board_with(&[(0, White, Ant, 0, 0)]);
        let queen = Piece::new(1, Black, Queen);
        let mut moves = legal_moves(&queen, &board, Black, Black, None, false);
        moves.sort_by_key(|p| (p.x, p.y));
        let mut expected = pos(0, 0).neighbors().to_vec();
        expected.sort_by_key(|p| (p.x, p.y));
        assert_eq!(moves, expected);

        // Tournament rules still forbid the queen as first placement.
        assert!(legal_moves(&queen, &board, Black, Black, None, true).is_empty());
    }

    #[test]
    fn test_board_pieces_frozen_until_queen_placed() {
        let board = board_with(&[(0, White, Ant, 0, 0), (1, Black, Queen, 1, 0)]);
        assert!(moves_of(&board, 0, White).is_empty());
    }

    #[test]
    fn test_fourth_placement_must_be_queen() {
        let board = board_with(&[
            (0, White, Ant, 0, 0),
            (1, Black, Queen, 1, 0),
            (2, White, Spider, -1, 0),
            (3, Black, Ant, 2, 0),
            (4, White, Grasshopper, -2, 0),
            (5, Black, Ant, 3, 0),
        ]);
        let ant = Piece::new(6, White, Ant);
        assert!(legal_moves(&ant, &board, White, White, None, false).is_empty());

        let queen = Piece::new(7, White, Queen);
        assert!(!legal_moves(&queen, &board, White, White, None, false).is_empty());
    }

    #[test]
    fn test_covered_piece_cannot_move() {
        let board = board_with(&[
            (0, White, Queen, 0, 0),
            (1, Black, Queen, 1, 0),
            (2, Black, Beetle, 0, 0),
        ]);
        assert!(moves_of(&board, 0, White).is_empty());
    }

    #[test]
    fn test_last_moved_piece_is_frozen() {
        let board = board_with(&[(0, White, Queen, 0, 0), (1, Black, Queen, 1, 0)]);
        let queen = board.piece_by_id(0).unwrap().clone();
        let last = Move {
            color: White,
            piece: queen.clone(),
            moved_from: Some(pos(0, 1)),
            moved_to: pos(0, 0),
        };
        assert!(legal_moves(&queen, &board, White, White, Some(&last), false).is_empty());
    }

    #[test]
    fn test_one_hive_rule_pins_cut_pieces() {
        // Middle queen connects the two ants; lifting her splits the
        // hive.
        let board = board_with(&[
            (0, White, Ant, -1, 0),
            (1, White, Queen, 0, 0),
            (2, Black, Queen, 1, 0),
            (3, Black, Ant, 2, 0),
        ]);
        assert!(moves_of(&board, 1, White).is_empty());
        assert!(!moves_of(&board, 0, White).is_empty());
    }

    #[test]
    fn test_placement_avoids_enemy_contact() {
        let board = board_with(&[(0, White, Queen, 0, 0), (1, Black, Queen, 1, 0)]);
        let ant = Piece::new(2, White, Ant);
        let placements = legal_moves(&ant, &board, White, White, None, false);

        assert!(!placements.is_empty());
        for p in &placements {
            assert!(board.top_piece_at(p).is_none());
            assert!(board
                .surrounding_pieces(p)
                .iter()
                .all(|n| n.color == White));
        }
        // Cells adjacent to the black queen are excluded.
        assert!(!placements.contains(&pos(2, 0)));
        assert!(!placements.contains(&pos(1, -1)));
    }

    #[test]
    fn test_queen_moves_one_step() {
        let board = board_with(&[(0, White, Queen, 0, 0), (1, Black, Queen, 1, 0)]);
        // The two cells flanking the black queen; the far side of the
        // board loses hive contact mid-slide.
        assert_eq!(moves_of(&board, 0, White), vec![pos(0, 1), pos(1, -1)]);
    }

    #[test]
    fn test_ant_reaches_whole_perimeter() {
        let board = board_with(&[
            (0, White, Queen, 0, 0),
            (1, Black, Queen, 1, 0),
            (2, White, Ant, -1, 0),
        ]);
        let moves = moves_of(&board, 2, White);
        // The perimeter ring of a two-piece hive has eight cells; the
        // ant reaches all of them except the one it started on.
        assert_eq!(moves.len(), 7);
        assert!(!moves.contains(&pos(-1, 0)));
    }

    #[test]
    fn test_spider_exactly_three_steps() {
        let board = board_with(&[
            (0, White, Queen, 0, 0),
            (1, Black, Queen, 1, 0),
            (2, White, Spider, -1, 0),
        ]);
        let moves = moves_of(&board, 2, White);
        assert_eq!(moves, vec![pos(1, 1), pos(2, -1)]);
    }

    #[test]
    fn test_grasshopper_jumps_lines() {
        let board = board_with(&[
            (0, White, Grasshopper, 0, 0),
            (1, Black, Queen, 1, 0),
            (2, Black, Ant, 2, 0),
            (3, White, Queen, 0, 1),
        ]);
        let mut moves = moves_of(&board, 0, White);
        moves.sort_by_key(|p| (p.x, p.y));
        // One landing per occupied direction, beyond the full line.
        assert_eq!(moves, vec![pos(0, 2), pos(3, 0)]);
    }

    #[test]
    fn test_beetle_climbs_and_steps() {
        let board = board_with(&[(0, White, Queen, 0, 0), (1, Black, Queen, 1, 0)]);
        let mut board = board;
        board.push_piece(Piece::new(2, White, Beetle), pos(0, -1));

        let moves = moves_of(&board, 2, White);
        // Climb onto the white queen, or slide along the hive edge.
        assert!(moves.contains(&pos(0, 0)));
        assert!(moves.contains(&pos(1, -1)));

        // Stacked beetle can drop to any empty neighbor or climb on.
        let mut stacked = board_with(&[(0, White, Queen, 0, 0), (1, Black, Queen, 1, 0)]);
        stacked.push_piece(Piece::new(2, White, Beetle), pos(0, 0));
        let moves = moves_of(&stacked, 2, White);
        assert!(moves.contains(&pos(1, 0))); // climb across
        assert!(moves.contains(&pos(0, -1))); // drop
        assert!(moves.contains(&pos(-1, 0))); // drop
    }

    #[test]
    fn test_ladybug_two_climbs_one_drop() {
        let board = board_with(&[
            (0, White, Queen, 0, 0),
            (1, Black, Queen, 1, 0),
            (2, White, Ladybug, -1, 0),
        ]);
        let moves = moves_of(&board, 2, White);

        // Over the white queen then the black queen, down to any
        // empty cell touching the black queen.
        assert!(moves.contains(&pos(2, 0)));
        assert!(moves.contains(&pos(1, -1)));
        assert!(moves.contains(&pos(0, 1)));
        // Never its own cell, never an occupied cell.
        assert!(!moves.contains(&pos(-1, 0)));
        assert!(!moves.contains(&pos(0, 0)));
        assert!(!moves.contains(&pos(1, 0)));
    }

    #[test]
    fn test_mosquito_copies_neighbors() {
        let board = board_with(&[
            (0, White, Queen, 0, 0),
            (1, Black, Queen, 1, 0),
            (2, White, Mosquito, -1, 0),
        ]);
        // Touching only a queen: moves exactly like a queen.
        let queen_like = moves_of(&board, 2, White);
        let queen_board = board_with(&[
            (0, White, Queen, 0, 0),
            (1, Black, Queen, 1, 0),
            (2, White, Queen, -1, 0),
        ]);
        assert_eq!(queen_like, moves_of(&queen_board, 2, White));
    }

    #[test]
    fn test_mosquito_ignores_mosquito_neighbor() {
        let board = board_with(&[
            (0, White, Mosquito, 0, 0),
            (1, Black, Mosquito, 1, 0),
            (2, White, Queen, 1, -1),
            (3, Black, Queen, 2, 0),
        ]);
        // Copies queen movement from its queen neighbor only; the
        // mosquito neighbor contributes nothing, so every move is a
        // single step.
        let moves = moves_of(&board, 0, White);
        assert!(!moves.is_empty());
        for m in &moves {
            assert!(pos(0, 0).is_adjacent_to(m));
        }
    }

    #[test]
    fn test_pillbug_moves_like_queen() {
        let board = board_with(&[
            (0, White, Pillbug, 0, 0),
            (1, Black, Queen, 1, 0),
            (2, White, Queen, 1, -1),
        ]);
        let moves = moves_of(&board, 0, White);
        for m in &moves {
            assert!(pos(0, 0).is_adjacent_to(m));
        }
        assert!(!moves.is_empty());
    }

    #[test]
    fn test_pillbug_relocates_enemy_piece() {
        let board = board_with(&[
            (0, White, Queen, -1, 0),
            (1, White, Pillbug, 0, 0),
            (2, Black, Queen, 1, 0),
            (3, Black, Ant, 1, -1),
        ]);
        // White acts on the black queen: no direct moves (wrong
        // color), but the adjacent white pillbug may relocate it to
        // its own free neighbors.
        let black_queen = board.piece_by_id(2).unwrap().clone();
        let moves = legal_moves(&black_queen, &board, White, White, None, false);

        assert!(!moves.is_empty());
        for m in &moves {
            assert!(pos(0, 0).is_adjacent_to(m), "{m:?} not beside the pillbug");
            assert!(board.top_piece_at(m).is_none());
        }
    }

    #[test]
    fn test_pillbug_ability_blocked_for_last_moved_carrier() {
        let board = board_with(&[
            (0, White, Queen, -1, 0),
            (1, White, Pillbug, 0, 0),
            (2, Black, Queen, 1, 0),
            (3, Black, Ant, 1, -1),
        ]);
        let pillbug = board.piece_by_id(1).unwrap().clone();
        let last = Move {
            color: White,
            piece: pillbug,
            moved_from: Some(pos(0, 1)),
            moved_to: pos(0, 0),
        };
        let black_queen = board.piece_by_id(2).unwrap().clone();
        let moves = legal_moves(&black_queen, &board, White, White, Some(&last), false);
        assert!(moves.is_empty());
    }

    #[test]
    fn test_player_has_moves_counts_placements() {
        let board = board_with(&[(0, White, Queen, 0, 0), (1, Black, Queen, 1, 0)]);
        let unplayed = vec![Piece::new(2, White, Ant)];
        assert!(player_has_moves(&board, White, &unplayed, None));
        assert!(player_has_moves(&board, Black, &[], None));
    }
}
