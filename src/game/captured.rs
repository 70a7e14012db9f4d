//! Captured pieces tracking
//!
//! Tracks pieces captured by each side and the running material advantage,
//! for snapshot display. Standard piece values; the king carries none.

use shakmaty::{Color, Role};

/// Captured pieces for both sides
#[derive(Debug, Default, Clone)]
pub struct CapturedPieces {
    /// Black pieces White has taken
    pub by_white: Vec<Role>,
    /// White pieces Black has taken
    pub by_black: Vec<Role>,
}

impl CapturedPieces {
    /// Record a capture
    ///
    /// `victim_color` is the color of the piece that was taken; credit goes
    /// to the other side.
    pub fn add_capture(&mut self, victim_color: Color, role: Role) {
        match victim_color {
            Color::White => self.by_black.push(role),
            Color::Black => self.by_white.push(role),
        }
    }

    /// Material advantage in pawn units; positive favors White
    pub fn material_advantage(&self) -> i32 {
        let white: i32 = self.by_white.iter().map(|r| piece_value(*r)).sum();
        let black: i32 = self.by_black.iter().map(|r| piece_value(*r)).sum();
        white - black
    }

    /// Clear for a new game
    pub fn clear(&mut self) {
        self.by_white.clear();
        self.by_black.clear();
    }
}

fn piece_value(role: Role) -> i32 {
    match role {
        Role::Pawn => 1,
        Role::Knight => 3,
        Role::Bishop => 3,
        Role::Rook => 5,
        Role::Queen => 9,
        Role::King => 0,
    }
}
