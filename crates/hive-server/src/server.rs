//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::session::GameSession;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use hive_core::SetupOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Server state shared across all connections.
pub struct ServerState {
    /// All active game sessions
    pub games: DashMap<Uuid, GameSession>,
    /// Mapping from player ID to the game they are in
    pub player_games: DashMap<Uuid, Uuid>,
    /// Mapping from player ID to their message sender
    pub player_senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            games: DashMap::new(),
            player_games: DashMap::new(),
            player_senders: DashMap::new(),
        }
    }

    /// Send a message to a specific player.
    pub fn send_to_player(&self, player_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.player_senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    /// Push every player in a game their own projection of the state.
    pub fn broadcast_views(&self, game_id: Uuid) {
        let views: Vec<(Uuid, ServerMessage)> = match self.games.get(&game_id) {
            Some(session) => session
                .players
                .keys()
                .filter_map(|&player_id| {
                    session
                        .view_for(player_id)
                        .map(|state| (player_id, ServerMessage::PlayerState { state }))
                })
                .collect(),
            None => return,
        };
        for (player_id, msg) in views {
            self.send_to_player(player_id, msg);
        }
    }

    /// Get the list of games waiting for an opponent.
    pub fn get_open_games(&self) -> Vec<crate::protocol::GameInfo> {
        self.games
            .iter()
            .filter(|s| s.is_open())
            .map(|s| s.to_info())
            .collect()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Hive server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Each connection gets a fresh player id for its lifetime.
    let player_id = Uuid::new_v4();

    // Channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.player_senders.insert(player_id, tx);

    let welcome = ServerMessage::Welcome { player_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text.into())).await?;

    // Forward queued messages from the channel to the socket.
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) {
                    handle_message(player_id, client_msg, &state);
                } else {
                    warn!("Invalid message from {}: {}", player_id, text);
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", player_id);
                break;
            }
            Ok(Message::Ping(data)) => {
                state.send_to_player(player_id, ServerMessage::Pong);
                let _ = data; // Just consume it
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", player_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    handle_disconnect(player_id, &state);
    state.player_senders.remove(&player_id);
    send_task.abort();

    info!("Connection closed for {}", player_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(player_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateGame { player_name } => {
            let game_id = Uuid::new_v4();
            let session = GameSession::new(game_id, player_id, player_name);

            state.games.insert(game_id, session);
            state.player_games.insert(player_id, game_id);

            state.send_to_player(player_id, ServerMessage::GameCreated { game_id });
            state.broadcast_views(game_id);
        }

        ClientMessage::SetupGame {
            white_pieces,
            black_pieces,
            creator_color,
            tournament,
        } => {
            if let Some(&game_id) = state.player_games.get(&player_id).as_deref() {
                let result = match state.games.get_mut(&game_id) {
                    Some(mut session) => session.setup(
                        player_id,
                        SetupOptions {
                            white_pieces,
                            black_pieces,
                            creator_color,
                            tournament,
                        },
                    ),
                    None => return,
                };
                match result {
                    Ok(()) => state.broadcast_views(game_id),
                    Err(e) => state.send_to_player(
                        player_id,
                        ServerMessage::Error {
                            message: e.to_string(),
                        },
                    ),
                }
            }
        }

        ClientMessage::JoinGame {
            game_id,
            player_name,
        } => {
            if let Some(mut session) = state.games.get_mut(&game_id) {
                match session.join(player_id, player_name, &mut rand::thread_rng()) {
                    Ok(()) => {
                        drop(session); // Release lock before broadcasting
                        state.player_games.insert(player_id, game_id);
                        state.broadcast_views(game_id);
                    }
                    Err(e) => {
                        state.send_to_player(
                            player_id,
                            ServerMessage::Error {
                                message: e.to_string(),
                            },
                        );
                    }
                }
            } else {
                state.send_to_player(
                    player_id,
                    ServerMessage::Error {
                        message: "Game not found".to_string(),
                    },
                );
            }
        }

        ClientMessage::SelectPiece { piece_id } => {
            if let Some(&game_id) = state.player_games.get(&player_id).as_deref() {
                let result = match state.games.get_mut(&game_id) {
                    Some(mut session) => session.select(player_id, piece_id),
                    None => return,
                };
                match result {
                    Ok(()) => state.broadcast_views(game_id),
                    Err(e) => state.send_to_player(
                        player_id,
                        ServerMessage::Error {
                            message: e.to_string(),
                        },
                    ),
                }
            }
        }

        ClientMessage::MovePiece { piece_id, position } => {
            if let Some(&game_id) = state.player_games.get(&player_id).as_deref() {
                let result = match state.games.get_mut(&game_id) {
                    Some(mut session) => session.move_piece(player_id, piece_id, position),
                    None => return,
                };
                match result {
                    Ok(()) => state.broadcast_views(game_id),
                    Err(e) => state.send_to_player(
                        player_id,
                        ServerMessage::Error {
                            message: e.to_string(),
                        },
                    ),
                }
            }
        }

        ClientMessage::ListGames => {
            let games = state.get_open_games();
            state.send_to_player(player_id, ServerMessage::GameList { games });
        }

        ClientMessage::Ping => {
            state.send_to_player(player_id, ServerMessage::Pong);
        }
    }
}

/// Handle player disconnect.
fn handle_disconnect(player_id: Uuid, state: &Arc<ServerState>) {
    if let Some((_, game_id)) = state.player_games.remove(&player_id) {
        let remove_game = match state.games.get(&game_id) {
            Some(session) => {
                // Drop the session once nobody in it is connected.
                session
                    .players
                    .keys()
                    .all(|id| *id == player_id || !state.player_senders.contains_key(id))
            }
            None => false,
        };
        if remove_game {
            state.games.remove(&game_id);
            info!("Removed abandoned game {}", game_id);
        }
    }
}
