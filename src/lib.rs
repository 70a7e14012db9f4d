//! persona-chess - play chess against configurable engine personalities
//!
//! The library half of the crate: the arbitration core, the personality
//! roster, and the session event loop. The binary in `main.rs` is a thin
//! terminal front end over [`game::SessionHandle`]; any other front end
//! talks to the same surface.

pub mod game;

pub use game::{GameSession, Personality, SessionHandle};
