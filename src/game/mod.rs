//! Move arbitration and engine orchestration
//!
//! One authoritative board, one opponent personality, at most one search
//! in flight. The human's moves and the engine's replies are reconciled by
//! a small state machine; everything the opponent does differently between
//! personalities (book lines, search depth, pacing) flows from immutable
//! configuration.
//!
//! # Module Organization
//!
//! - `arbiter` - the authoritative turn-state machine and its snapshot
//! - `session` - the event-loop task wrapping arbiter + engine channel
//! - `book` - weighted opening book lookup and selection
//! - `phase` - game-phase classification and adaptive depth policy
//! - `personality` - opponent configuration bundles and the built-in roster
//! - `rules` - adapter over the external rule engine (single apply path)
//! - `history` / `captured` - per-move and per-game bookkeeping
//! - `status` - game status and end reasons
//! - `error` - the orchestration error taxonomy
//! - `chess_serde` - serde adapters for rule-engine types

pub mod arbiter;
pub mod book;
pub mod captured;
pub mod chess_serde;
pub mod error;
pub mod history;
pub mod personality;
pub mod phase;
pub mod rules;
pub mod session;
pub mod status;

pub use arbiter::{Arbiter, LastMove, MoveOutcome, OpponentPlan, Snapshot, TurnState};
pub use error::{GameError, GameResult};
pub use personality::Personality;
pub use session::{GameSession, SessionHandle};
pub use status::{EndReason, GameStatus};
