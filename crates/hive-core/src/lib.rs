//! Core rules engine for a Hive-style hexagonal tile game.
//!
//! This crate provides the full game logic, including:
//! - Hex coordinate system for the unbounded board
//! - Sparse board representation with piece stacking
//! - Legal move generation for all eight bug types
//! - Game state machine with full rule enforcement
//!
//! # Architecture
//!
//! The engine is platform-agnostic and has no I/O of its own. A host
//! (such as the companion WebSocket server) owns a [`GameState`] per
//! game, drives it through the action methods, and sends each player
//! the [`PlayerView`] projection after every change.
//!
//! # Modules
//!
//! - [`hex`]: Axial coordinates and neighbor geometry
//! - [`piece`]: Piece identity, colors, and the eight bug types
//! - [`board`]: Stack storage, connectivity, and the gate rule
//! - [`moves`]: The legal move pipeline and per-bug generators
//! - [`game`]: Lifecycle, actions, and per-player views

pub mod board;
pub mod game;
pub mod hex;
pub mod moves;
pub mod piece;

// Re-export commonly used types
pub use board::Board;
pub use game::{standard_set, GameError, GameState, GameStatus, PlayerView, SetupOptions};
pub use hex::BoardPosition;
pub use moves::{legal_moves, player_has_moves, Move};
pub use piece::{Color, Piece, PieceId, PieceType, Placement};
