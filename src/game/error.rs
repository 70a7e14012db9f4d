//! Error types for game orchestration
//!
//! Every fallible arbitration entry point returns one of these as a value;
//! nothing on a recoverable path panics. The variants the UI must be able
//! to distinguish are `IllegalMove` ("try a different move") and
//! `EngineUnavailable` ("the opponent cannot respond, resign or reset").

use thiserror::Error;

/// Errors that can occur in game orchestration
#[derive(Error, Debug)]
pub enum GameError {
    /// The attempted move is not legal in the current position.
    /// Recoverable: the board is unchanged and the actor may try again.
    #[error("illegal move: {uci}")]
    IllegalMove { uci: String },

    /// A move or request arrived while a turn is already in flight.
    /// Recoverable: the submission is rejected, never queued.
    #[error("turn already in flight: {context}")]
    DoubleSubmission { context: String },

    /// The game has ended; no further moves are accepted from either actor
    #[error("game is over: {reason}")]
    GameOver { reason: String },

    /// The opponent engine cannot respond for this turn (channel busy,
    /// terminated, timed out, or its reply was unusable). Recoverable at
    /// the turn level: the caller may retry the turn, resign, or reset.
    #[error("opponent unavailable: {message}")]
    EngineUnavailable { message: String },

    /// Operation invoked from a turn state that does not permit it
    #[error("operation {operation} not valid while {state}")]
    InvalidState { state: String, operation: String },

    /// The session event loop has shut down
    #[error("game session has shut down")]
    SessionClosed,
}

/// Result type alias for game operations
pub type GameResult<T> = Result<T, GameError>;
