//! Engine process link for UCI-speaking search engines
//!
//! This crate owns everything about talking to the external engine: the
//! protocol vocabulary, the process transport, and the channel state
//! machine enforcing the one-outstanding-search discipline. It knows
//! nothing about boards, books, or turn order; the orchestration layer
//! above supplies a FEN and search directives and gets back a best move.
//!
//! # Module Responsibilities
//!
//! - `protocol` - typed commands/events and line parsing
//! - `transport` - reader/writer seam, process-backed and scripted
//! - `channel` - handshake, single-slot pending resolver, teardown
//! - `error` - channel error taxonomy

pub mod channel;
pub mod error;
pub mod protocol;
pub mod transport;

pub use channel::{ChannelState, EngineChannel, SearchOutcome};
pub use error::{ChannelError, ChannelResult};
pub use protocol::{GuiCommand, SearchRequest};
pub use transport::{ProcessTransport, TransportReader, TransportWriter};
