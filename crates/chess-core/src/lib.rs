//! Core pipeline for chat-driven chess: board state, piece reference
//! extraction, the move-proposer boundary contract, and the turn-resolution
//! loop that turns free-text move suggestions into a consistent, legal
//! position.
//!
//! The core is stateless between calls: it receives a position and a message,
//! and returns a new position plus per-piece outcomes. Rules validity and FEN
//! handling are delegated to `shakmaty`.

pub mod board;
pub mod proposer;
pub mod references;
pub mod resolve;

pub use shakmaty;
