//! UCI protocol vocabulary
//!
//! Typed representations of the line-oriented text protocol spoken with the
//! engine process: the commands the GUI side sends and the events the engine
//! side answers with. Only the subset the orchestration core needs is
//! modeled (`uci`, `isready`, `setoption`, `position fen`, `go depth`,
//! `quit` outbound; `uciok`, `readyok`, `bestmove` inbound). Everything else
//! the engine prints (`id`, `option`, `info` chatter) is carried through as
//! an opaque line and ignored upstream.

use serde::{Deserialize, Serialize};

/// One search dispatched to the engine
///
/// Carries the position snapshot plus the per-personality search directives.
/// The channel forwards `skill_level` and `contempt` as UCI options before
/// issuing `go depth`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Position to search, as the rule engine's FEN
    pub fen: String,
    /// Fixed search depth in plies
    pub depth: u8,
    /// Value forwarded as `setoption name Skill Level`
    pub skill_level: u8,
    /// Value forwarded as `setoption name Contempt`
    pub contempt: i32,
}

/// Commands the GUI side writes to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiCommand {
    Uci,
    IsReady,
    SetOption { name: String, value: String },
    PositionFen(String),
    GoDepth(u8),
    Quit,
}

impl GuiCommand {
    /// Render the command as a single protocol line (without terminator)
    pub fn as_line(&self) -> String {
        match self {
            GuiCommand::Uci => "uci".to_string(),
            GuiCommand::IsReady => "isready".to_string(),
            GuiCommand::SetOption { name, value } => {
                format!("setoption name {name} value {value}")
            }
            GuiCommand::PositionFen(fen) => format!("position fen {fen}"),
            GuiCommand::GoDepth(depth) => format!("go depth {depth}"),
            GuiCommand::Quit => "quit".to_string(),
        }
    }
}

/// Events parsed from the engine's output lines
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// `uciok` - handshake acknowledgment
    UciOk,
    /// `readyok` - readiness probe acknowledgment
    ReadyOk,
    /// `bestmove <move>` or `bestmove (none)`; `None` means the engine has
    /// no move available, which is distinct from a parse failure
    BestMove(Option<String>),
    /// A `bestmove` line missing its operand - a protocol violation
    Malformed(String),
    /// Search chatter (`info ...`), identification (`id ...`), option
    /// advertisements and anything else we deliberately ignore
    Chatter(String),
}

/// Parse one engine output line into a typed event
///
/// A trailing `ponder <move>` on a `bestmove` line is accepted and dropped;
/// the orchestration core never ponders.
pub fn parse_engine_line(line: &str) -> EngineEvent {
    let trimmed = line.trim();
    match trimmed {
        "uciok" => return EngineEvent::UciOk,
        "readyok" => return EngineEvent::ReadyOk,
        _ => {}
    }

    if let Some(rest) = trimmed.strip_prefix("bestmove") {
        return match rest.split_whitespace().next() {
            Some("(none)") => EngineEvent::BestMove(None),
            Some(mv) => EngineEvent::BestMove(Some(mv.to_string())),
            None => EngineEvent::Malformed(trimmed.to_string()),
        };
    }

    EngineEvent::Chatter(trimmed.to_string())
}
