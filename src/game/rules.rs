//! Rule-engine collaborator adapter
//!
//! The arbitration core never generates or validates moves itself; all
//! legality, mutation and terminal detection is delegated to the external
//! rule engine. This module wraps it behind the narrow surface the
//! arbitrator needs and hosts the *single* shared application path
//! ([`RuleBoard::apply_uci`]) used for player moves, book moves and engine
//! replies alike, so an illegal move from any source is stopped in one
//! place.

use shakmaty::{
    fen::Fen, uci::Uci, CastlingMode, Chess, Color, EnPassantMode, Position, Role, Square,
};

use super::error::{GameError, GameResult};

/// Everything bookkeeping needs to know about one applied move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    /// Side that made the move
    pub color: Color,
    /// Piece that moved
    pub role: Role,
    pub from: Option<Square>,
    pub to: Square,
    /// Role captured, if any (en passant reports a pawn)
    pub capture: Option<Role>,
    pub promotion: Option<Role>,
    pub is_castle: bool,
    pub is_en_passant: bool,
    /// Position after the move gives check
    pub is_check: bool,
    /// Position after the move is checkmate
    pub is_checkmate: bool,
    /// Canonical UCI rendering of the move
    pub uci: String,
}

/// The authoritative board, owned exclusively by the arbitrator
///
/// Created at game start, replaced wholesale on reset, mutated only
/// through [`RuleBoard::apply_uci`].
#[derive(Debug, Clone)]
pub struct RuleBoard {
    board: Chess,
}

impl Default for RuleBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBoard {
    /// Standard starting position
    pub fn new() -> Self {
        Self {
            board: Chess::new(),
        }
    }

    /// Serialized position in FEN
    pub fn fen(&self) -> String {
        Fen::from_position(self.board.clone(), EnPassantMode::Legal).to_string()
    }

    /// Side to move
    pub fn turn(&self) -> Color {
        self.board.turn()
    }

    /// Is the side to move in check
    pub fn is_check(&self) -> bool {
        self.board.is_check()
    }

    /// Has the game reached a terminal position
    pub fn is_game_over(&self) -> bool {
        self.board.is_game_over()
    }

    /// Is the terminal position specifically a stalemate
    pub fn is_stalemate(&self) -> bool {
        self.board.is_stalemate()
    }

    /// The rule engine's verdict on a finished game
    pub fn outcome(&self) -> Option<shakmaty::Outcome> {
        self.board.outcome()
    }

    /// Legal destination squares for the piece on `from`
    ///
    /// Promotion variants collapse to one destination entry. Delegated
    /// straight to the rule engine; an empty square yields an empty list.
    pub fn legal_destinations(&self, from: Square) -> Vec<Square> {
        let mut destinations = Vec::new();
        for mv in self.board.legal_moves() {
            if mv.from() == Some(from) {
                let to = mv.to();
                if !destinations.contains(&to) {
                    destinations.push(to);
                }
            }
        }
        destinations
    }

    /// Probe whether a UCI move is legal without mutating anything
    pub fn is_legal(&self, uci: &Uci) -> bool {
        uci.to_move(&self.board).is_ok()
    }

    /// The shared application path
    ///
    /// Converts the UCI move against the current position (which is where
    /// legality is enforced, regardless of whether the move came from the
    /// player, the opening book, or the engine), plays it, and reports the
    /// bookkeeping facts. On error the board is untouched.
    pub fn apply_uci(&mut self, uci: &Uci) -> GameResult<AppliedMove> {
        let mv = uci.to_move(&self.board).map_err(|_| GameError::IllegalMove {
            uci: uci.to_string(),
        })?;

        let color = self.board.turn();
        let next = self
            .board
            .clone()
            .play(&mv)
            .map_err(|_| GameError::IllegalMove {
                uci: uci.to_string(),
            })?;

        let applied = AppliedMove {
            color,
            role: mv.role(),
            from: mv.from(),
            to: mv.to(),
            capture: mv.capture(),
            promotion: mv.promotion(),
            is_castle: mv.is_castle(),
            is_en_passant: mv.is_en_passant(),
            is_check: next.is_check(),
            is_checkmate: next.is_checkmate(),
            uci: mv.to_uci(CastlingMode::Standard).to_string(),
        };
        self.board = next;
        Ok(applied)
    }

    /// Build a [`Uci`] from UI coordinates
    pub fn uci_from_coords(from: &str, to: &str, promotion: Option<char>) -> GameResult<Uci> {
        let from_sq = parse_square(from)?;
        let to_sq = parse_square(to)?;
        let promotion_role = match promotion {
            Some(c) => Some(Role::from_char(c.to_ascii_lowercase()).ok_or_else(|| {
                GameError::IllegalMove {
                    uci: format!("{from}{to}{c}"),
                }
            })?),
            None => None,
        };
        Ok(Uci::Normal {
            from: from_sq,
            to: to_sq,
            promotion: promotion_role,
        })
    }
}

fn parse_square(s: &str) -> GameResult<Square> {
    Square::from_ascii(s.as_bytes()).map_err(|_| GameError::IllegalMove {
        uci: s.to_string(),
    })
}
