//! Move history tracking
//!
//! Maintains the chronological record of all moves made during the game,
//! one entry per ply. The snapshot layer reads the tail of this record to
//! report the last move; a front end can read the whole of it for a move
//! list or export.

use shakmaty::{Color, Role, Square};

use super::rules::AppliedMove;

/// One recorded half-move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    /// Ply number this move completed (1 = White's first move)
    pub ply: u32,
    pub color: Color,
    pub role: Role,
    pub from: Option<Square>,
    pub to: Square,
    pub capture: Option<Role>,
    pub promotion: Option<Role>,
    pub is_castle: bool,
    pub is_en_passant: bool,
    pub is_check: bool,
    pub is_checkmate: bool,
    /// Canonical UCI rendering
    pub uci: String,
}

impl MoveRecord {
    /// Build a record from the rule engine's application report
    pub fn from_applied(ply: u32, applied: &AppliedMove) -> Self {
        Self {
            ply,
            color: applied.color,
            role: applied.role,
            from: applied.from,
            to: applied.to,
            capture: applied.capture,
            promotion: applied.promotion,
            is_castle: applied.is_castle,
            is_en_passant: applied.is_en_passant,
            is_check: applied.is_check,
            is_checkmate: applied.is_checkmate,
            uci: applied.uci.clone(),
        }
    }
}

/// The complete move record for the current game
#[derive(Debug, Default)]
pub struct MoveHistory {
    moves: Vec<MoveRecord>,
}

impl MoveHistory {
    /// Append a move; called after validation succeeds, never before
    pub fn add_move(&mut self, record: MoveRecord) {
        self.moves.push(record);
    }

    /// The most recent move, if any
    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.moves.last()
    }

    /// Number of half-moves recorded
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Clear all history for a new game
    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// Iterate moves in chronological order
    pub fn iter(&self) -> std::slice::Iter<'_, MoveRecord> {
        self.moves.iter()
    }
}
