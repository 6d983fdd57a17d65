//! Game lifecycle and the action surface.
//!
//! This module contains:
//! - `GameState`, the authoritative state for one game
//! - the five player actions: create, set up, join, select, move
//! - `game_status`, the lazily derived win/draw evaluation
//! - `PlayerView`, the per-player projection sent to clients
//!
//! A game runs through three phases. A freshly created game is
//! `NotStarted` and accepts only `setup_game` and `play_game`. Once a
//! second player joins, white moves first and the game stays
//! `InProgress` until a queen is fully surrounded or neither player
//! can move. Failed actions return an error and leave the state
//! untouched.

use crate::board::Board;
use crate::hex::BoardPosition;
use crate::moves::{legal_moves, player_has_moves, Move};
use crate::piece::{Color, Piece, PieceId, PieceType};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Why an action was rejected. The state is unchanged whenever one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The action does not apply to the game's current phase
    #[error("invalid game state: {0}")]
    InvalidState(String),
    /// The acting player may not perform this action
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("it is not your turn")]
    TurnViolation,
    #[error("you can only use pieces of your own color")]
    ColorViolation,
    #[error("this is not a valid move")]
    InvalidMove,
}

/// Derived game phase and outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    NotStarted,
    InProgress,
    Draw,
    WhiteWon,
    BlackWon,
}

/// Options chosen by the creator during setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupOptions {
    /// Piece types white starts with
    pub white_pieces: Vec<PieceType>,
    /// Piece types black starts with
    pub black_pieces: Vec<PieceType>,
    /// Color the creator wants to play, or `None` for a coin flip
    pub creator_color: Option<Color>,
    /// Tournament opening rule: neither queen may be placed first
    pub tournament: bool,
}

impl Default for SetupOptions {
    fn default() -> Self {
        Self {
            white_pieces: standard_set(),
            black_pieces: standard_set(),
            creator_color: None,
            tournament: false,
        }
    }
}

/// The full standard piece set including the three expansion bugs.
pub fn standard_set() -> Vec<PieceType> {
    use PieceType::*;
    vec![
        Queen,
        Spider,
        Spider,
        Beetle,
        Beetle,
        Grasshopper,
        Grasshopper,
        Grasshopper,
        Ant,
        Ant,
        Ant,
        Ladybug,
        Mosquito,
        Pillbug,
    ]
}

/// Authoritative state for a single game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Name of the player who created the game
    pub creator: String,
    /// Color the creator asked for during setup, if any
    pub creator_color: Option<Color>,
    /// Player names in join order, creator first
    pub players: Vec<String>,
    /// Color assignment per player name, filled when the game starts
    pub colors: HashMap<String, Color>,
    /// Whose turn it is; `None` until the game starts
    pub current_turn: Option<Color>,
    /// Pieces not yet placed on the board
    pub unplayed_pieces: Vec<Piece>,
    pub board: Board,
    /// Piece currently highlighted by the player on turn
    pub selected_piece: Option<PieceId>,
    /// The most recent successful move
    pub last_move: Option<Move>,
    pub tournament: bool,
}

impl GameState {
    /// Create a new, empty game owned by `creator`.
    pub fn new(creator: impl Into<String>) -> Self {
        Self {
            creator: creator.into(),
            creator_color: None,
            players: Vec::new(),
            colors: HashMap::new(),
            current_turn: None,
            unplayed_pieces: Vec::new(),
            board: Board::new(),
            selected_piece: None,
            last_move: None,
            tournament: false,
        }
    }

    /// Configure the piece sets and options. Only the creator may set
    /// up, and only before the game has started. Piece ids are
    /// assigned sequentially, white pieces before black.
    pub fn setup_game(&mut self, player: &str, options: SetupOptions) -> Result<(), GameError> {
        if self.game_status() != GameStatus::NotStarted {
            return Err(GameError::InvalidState(
                "game has already been started".into(),
            ));
        }
        if player != self.creator {
            return Err(GameError::PermissionDenied(
                "only the creator can set up the game".into(),
            ));
        }

        self.players = vec![self.creator.clone()];
        self.creator_color = options.creator_color;
        self.tournament = options.tournament;

        let mut pieces = Vec::with_capacity(
            options.white_pieces.len() + options.black_pieces.len(),
        );
        for (colored, color) in [
            (&options.white_pieces, Color::White),
            (&options.black_pieces, Color::Black),
        ] {
            for &kind in colored {
                pieces.push(Piece::new(pieces.len() as PieceId, color, kind));
            }
        }
        self.unplayed_pieces = pieces;
        Ok(())
    }

    /// Join as the second player and start the game. Colors are
    /// assigned here: the creator gets their requested color, or a
    /// coin flip decides, and the joiner gets the other one. White
    /// always moves first.
    pub fn play_game(&mut self, player: &str, rng: &mut impl Rng) -> Result<(), GameError> {
        if self.game_status() != GameStatus::NotStarted {
            return Err(GameError::InvalidState(
                "game has already been started".into(),
            ));
        }
        if player == self.creator {
            return Err(GameError::PermissionDenied(
                "waiting for another player to start playing the game".into(),
            ));
        }
        if self.players.is_empty() {
            return Err(GameError::InvalidState(format!(
                "{} must set up the game before it can be started",
                self.creator
            )));
        }

        self.players.push(player.to_string());

        let creator_color = self
            .creator_color
            .unwrap_or_else(|| if rng.gen::<f64>() < 0.5 { Color::White } else { Color::Black });
        self.colors.insert(self.creator.clone(), creator_color);
        self.colors.insert(player.to_string(), creator_color.opposite());
        self.current_turn = Some(Color::White);
        Ok(())
    }

    /// Select or deselect a piece for the player on turn. Passing
    /// `None`, or an id that matches no piece, clears the selection.
    /// A placed opponent piece may be selected, since a pillbug can
    /// move it; an unplayed opponent piece may not.
    pub fn select_piece(
        &mut self,
        player: &str,
        piece_id: Option<PieceId>,
    ) -> Result<(), GameError> {
        if self.game_status() != GameStatus::InProgress {
            return Err(GameError::InvalidState("game is not in progress".into()));
        }
        let color = self.require_color(player)?;
        let turn = self
            .current_turn
            .expect("in-progress games always have a current turn");
        let piece = piece_id.and_then(|id| self.find_piece(id));

        if can_select(color, turn, piece.as_ref()) {
            self.selected_piece = piece.map(|p| p.id);
            Ok(())
        } else if color != turn {
            Err(GameError::TurnViolation)
        } else {
            Err(GameError::ColorViolation)
        }
    }

    /// Move or place a piece. The destination must be one of the
    /// piece's legal moves for the acting player. On success the
    /// selection is cleared, the move is recorded, and the turn
    /// passes; if the next player has no legal move at all, the turn
    /// passes straight back.
    ///
    /// # Panics
    ///
    /// Panics if `piece_id` does not belong to any piece in this game.
    pub fn move_piece(
        &mut self,
        player: &str,
        piece_id: PieceId,
        position: BoardPosition,
    ) -> Result<(), GameError> {
        if self.game_status() != GameStatus::InProgress {
            return Err(GameError::InvalidState("game is not in progress".into()));
        }
        let color = self.require_color(player)?;
        let turn = self
            .current_turn
            .expect("in-progress games always have a current turn");
        let piece = self
            .find_piece(piece_id)
            .expect("piece id belongs to this game");

        if !can_select(color, turn, Some(&piece)) {
            if color != turn {
                return Err(GameError::TurnViolation);
            }
            return Err(GameError::ColorViolation);
        }
        if !legal_moves(
            &piece,
            &self.board,
            color,
            turn,
            self.last_move.as_ref(),
            self.tournament,
        )
        .contains(&position)
        {
            return Err(GameError::InvalidMove);
        }

        let moved_from = piece.position();
        let lifted = if piece.is_placed() {
            self.board
                .remove_piece(piece.id)
                .expect("piece id belongs to this game")
        } else {
            let index = self
                .unplayed_pieces
                .iter()
                .position(|p| p.id == piece.id)
                .expect("piece id belongs to this game");
            self.unplayed_pieces.remove(index)
        };
        self.board.push_piece(lifted, position);

        let placed = self
            .board
            .top_piece_at(&position)
            .expect("piece was just pushed")
            .clone();
        self.last_move = Some(Move {
            color,
            piece: placed,
            moved_from,
            moved_to: position,
        });
        self.selected_piece = None;

        // Pass the turn, skipping a player with no legal moves.
        let mut next = turn.opposite();
        if !player_has_moves(
            &self.board,
            next,
            &self.unplayed_pieces,
            self.last_move.as_ref(),
        ) {
            next = next.opposite();
        }
        self.current_turn = Some(next);
        Ok(())
    }

    /// Derive the game's phase and outcome from the current state.
    /// A game is won when the opposing queen is fully surrounded,
    /// drawn when both queens are surrounded at once or when neither
    /// player can move.
    pub fn game_status(&self) -> GameStatus {
        let turn = match self.current_turn {
            Some(turn) => turn,
            None => return GameStatus::NotStarted,
        };

        let surrounded = |color: Color| {
            self.board
                .pieces()
                .into_iter()
                .find(|p| p.kind == PieceType::Queen && p.color == color)
                .is_some_and(|queen| self.board.is_surrounded(queen))
        };
        let white_lost = surrounded(Color::White);
        let black_lost = surrounded(Color::Black);

        if (white_lost && black_lost)
            || !player_has_moves(
                &self.board,
                turn,
                &self.unplayed_pieces,
                self.last_move.as_ref(),
            )
        {
            GameStatus::Draw
        } else if white_lost {
            GameStatus::BlackWon
        } else if black_lost {
            GameStatus::WhiteWon
        } else {
            GameStatus::InProgress
        }
    }

    /// The color a player is playing, if the game has started.
    pub fn player_color(&self, player: &str) -> Option<Color> {
        self.colors.get(player).copied()
    }

    /// Project the state as seen by one player. The selection and its
    /// legal moves are only shown to the player whose turn it is.
    pub fn user_state(&self, player: &str) -> PlayerView {
        let color = self.player_color(player);
        let turn = self.current_turn.unwrap_or(Color::White);

        let selected = self
            .selected_piece
            .and_then(|id| self.find_piece(id))
            .filter(|piece| match color {
                Some(c) => can_select(c, turn, Some(piece)),
                None => false,
            });
        let valid_moves = match (&selected, color) {
            (Some(piece), Some(color)) => legal_moves(
                piece,
                &self.board,
                color,
                turn,
                self.last_move.as_ref(),
                self.tournament,
            ),
            _ => Vec::new(),
        };

        PlayerView {
            is_creator: player == self.creator,
            creator_color: self.creator_color,
            tournament: self.tournament,
            color,
            current_player_turn: turn,
            players: self.players.clone(),
            status: self.game_status(),
            selected_piece: selected,
            last_move: self.last_move.clone(),
            valid_moves,
            unplayed_pieces: self.unplayed_pieces.clone(),
            board_pieces: self.board.pieces().into_iter().cloned().collect(),
        }
    }

    fn require_color(&self, player: &str) -> Result<Color, GameError> {
        self.player_color(player).ok_or_else(|| {
            GameError::PermissionDenied("you are not a player in this game".into())
        })
    }

    /// Look up a piece anywhere: the unplayed pool or the board.
    fn find_piece(&self, id: PieceId) -> Option<Piece> {
        self.unplayed_pieces
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .or_else(|| self.board.piece_by_id(id).cloned())
    }
}

/// Whether a player of `color` may take hold of `piece` while it is
/// `turn`'s move. Everything is selectable on your own turn except an
/// opponent's unplayed piece.
fn can_select(color: Color, turn: Color, piece: Option<&Piece>) -> bool {
    color == turn && !piece.is_some_and(|p| !p.is_placed() && p.color != color)
}

/// One player's projection of the game, safe to send to that player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub is_creator: bool,
    pub creator_color: Option<Color>,
    pub tournament: bool,
    /// The receiving player's color; `None` for spectators or before
    /// the game starts
    pub color: Option<Color>,
    /// Defaults to white before the first turn
    pub current_player_turn: Color,
    pub players: Vec<String>,
    pub status: GameStatus,
    pub selected_piece: Option<Piece>,
    pub last_move: Option<Move>,
    /// Legal destinations of the selected piece, empty when nothing
    /// is selected
    pub valid_moves: Vec<BoardPosition>,
    pub unplayed_pieces: Vec<Piece>,
    pub board_pieces: Vec<Piece>,
}
