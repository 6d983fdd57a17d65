//! WebSocket protocol messages for multiplayer games.

use hive_core::{BoardPosition, Color, GameStatus, PieceId, PieceType, PlayerView};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    /// Create a new game
    CreateGame { player_name: String },

    /// Configure the piece sets and options (creator only)
    SetupGame {
        white_pieces: Vec<PieceType>,
        black_pieces: Vec<PieceType>,
        creator_color: Option<Color>,
        tournament: bool,
    },

    /// Join an existing game as the second player and start it
    JoinGame { game_id: Uuid, player_name: String },

    /// Select a piece, or deselect with `None`
    SelectPiece { piece_id: Option<PieceId> },

    /// Move or place a piece
    MovePiece {
        piece_id: PieceId,
        position: BoardPosition,
    },

    /// Request the list of games waiting for an opponent
    ListGames,

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    /// Welcome message with assigned player ID
    Welcome { player_id: Uuid },

    /// Game created successfully
    GameCreated { game_id: Uuid },

    /// The receiving player's view of the game, pushed after every
    /// state change
    PlayerState { state: PlayerView },

    /// List of games waiting for an opponent
    GameList { games: Vec<GameInfo> },

    /// Error occurred
    Error { message: String },

    /// Pong response
    Pong,
}

/// Game information for the lobby list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: Uuid,
    pub creator: String,
    pub players: Vec<String>,
    pub status: GameStatus,
}
