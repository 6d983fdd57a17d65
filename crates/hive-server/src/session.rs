//! Game session management.
//!
//! A session pairs one [`GameState`] with the connections playing it.
//! Connections are identified by `Uuid`; the core engine only knows
//! player names, so the session keeps the mapping and translates on
//! every call.

use hive_core::{BoardPosition, GameError, GameState, PieceId, PlayerView, SetupOptions};
use rand::Rng;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::protocol::GameInfo;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("You are not in this game")]
    NotInGame,

    #[error("No piece with that id exists in this game")]
    UnknownPiece,

    #[error(transparent)]
    Game(#[from] GameError),
}

/// One running game and the connections attached to it.
pub struct GameSession {
    pub id: Uuid,
    pub game: GameState,
    /// Connection id to player name
    pub players: HashMap<Uuid, String>,
}

impl GameSession {
    pub fn new(id: Uuid, creator_id: Uuid, creator_name: String) -> Self {
        let mut players = HashMap::new();
        players.insert(creator_id, creator_name.clone());

        Self {
            id,
            game: GameState::new(creator_name),
            players,
        }
    }

    pub fn player_name(&self, player_id: Uuid) -> Result<&str, SessionError> {
        self.players
            .get(&player_id)
            .map(String::as_str)
            .ok_or(SessionError::NotInGame)
    }

    pub fn setup(&mut self, player_id: Uuid, options: SetupOptions) -> Result<(), SessionError> {
        let name = self.player_name(player_id)?.to_string();
        self.game.setup_game(&name, options)?;
        Ok(())
    }

    /// Join as the second player and start the game.
    pub fn join(
        &mut self,
        player_id: Uuid,
        name: String,
        rng: &mut impl Rng,
    ) -> Result<(), SessionError> {
        self.game.play_game(&name, rng)?;
        self.players.insert(player_id, name);
        Ok(())
    }

    pub fn select(
        &mut self,
        player_id: Uuid,
        piece_id: Option<PieceId>,
    ) -> Result<(), SessionError> {
        let name = self.player_name(player_id)?.to_string();
        self.game.select_piece(&name, piece_id)?;
        Ok(())
    }

    pub fn move_piece(
        &mut self,
        player_id: Uuid,
        piece_id: PieceId,
        position: BoardPosition,
    ) -> Result<(), SessionError> {
        let name = self.player_name(player_id)?.to_string();
        // The core panics on unknown ids, so reject them here.
        let known = self.game.unplayed_pieces.iter().any(|p| p.id == piece_id)
            || self.game.board.piece_by_id(piece_id).is_some();
        if !known {
            return Err(SessionError::UnknownPiece);
        }
        self.game.move_piece(&name, piece_id, position)?;
        Ok(())
    }

    /// The view to push to one connection.
    pub fn view_for(&self, player_id: Uuid) -> Option<PlayerView> {
        self.players
            .get(&player_id)
            .map(|name| self.game.user_state(name))
    }

    /// Whether the game is still waiting for an opponent.
    pub fn is_open(&self) -> bool {
        self.players.len() < 2
    }

    pub fn to_info(&self) -> GameInfo {
        GameInfo {
            id: self.id,
            creator: self.game.creator.clone(),
            players: self.game.players.clone(),
            status: self.game.game_status(),
        }
    }
}
