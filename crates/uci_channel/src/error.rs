//! Error types for the engine channel
//!
//! Provides custom error types for engine process communication including
//! handshake failures, capacity violations, and protocol parse problems.

use thiserror::Error;

/// Errors that can occur while talking to the engine process
#[derive(Error, Debug)]
pub enum ChannelError {
    /// A search is already outstanding; the channel holds exactly one
    /// pending resolver and never queues a second request
    #[error("engine channel is busy with an outstanding search")]
    Busy,

    /// The channel was terminated; no further submissions are accepted
    #[error("engine channel has been terminated")]
    Terminated,

    /// The engine did not complete the uci/isready handshake
    #[error("engine handshake failed: {message}")]
    Handshake { message: String },

    /// The engine produced a line the protocol layer could not interpret
    #[error("unparseable engine response: {line}")]
    Protocol { line: String },

    /// Pipe-level failure talking to the engine process
    #[error("engine process io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;
