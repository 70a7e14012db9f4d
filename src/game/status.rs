//! Game status tracking and result reporting
//!
//! Tracks end-game conditions (checkmate, stalemate, draw, resignation)
//! and provides methods for determining the outcome and describing it.
//! Once the status leaves `Playing` it is terminal: the arbitrator accepts
//! no further moves from either actor.

use serde::{Deserialize, Serialize};
use shakmaty::{Color, Outcome};

use super::chess_serde::color_serde;

/// Why a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// A king is mated; the winner is recorded
    Checkmate {
        #[serde(with = "color_serde")]
        winner: Color,
    },
    /// The side to move has no legal moves but is not in check
    Stalemate,
    /// Any other draw the rule engine detects (insufficient material,
    /// repetition, fifty-move rule)
    Draw,
    /// The human resigned; the opponent personality wins
    Resignation {
        #[serde(with = "color_serde")]
        winner: Color,
    },
}

/// Whether the game is live or finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStatus {
    /// Moves are being accepted
    #[default]
    Playing,
    /// Terminal; carries the reason the game ended
    Ended(EndReason),
}

impl GameStatus {
    /// Check if the game has ended
    pub fn is_over(&self) -> bool {
        !matches!(self, GameStatus::Playing)
    }

    /// The winning color, if the result was decisive
    pub fn winner(&self) -> Option<Color> {
        match self {
            GameStatus::Ended(EndReason::Checkmate { winner })
            | GameStatus::Ended(EndReason::Resignation { winner }) => Some(*winner),
            _ => None,
        }
    }

    /// Human-readable result message for the UI
    pub fn message(&self) -> String {
        match self {
            GameStatus::Playing => "Game in progress".to_string(),
            GameStatus::Ended(EndReason::Checkmate { winner }) => {
                format!("{winner:?} wins by checkmate")
            }
            GameStatus::Ended(EndReason::Stalemate) => "Draw by stalemate".to_string(),
            GameStatus::Ended(EndReason::Draw) => "Draw".to_string(),
            GameStatus::Ended(EndReason::Resignation { winner }) => {
                format!("{winner:?} wins by resignation")
            }
        }
    }

    /// Map the rule engine's terminal verdict onto a status
    ///
    /// Stalemate is distinguished from other draws because the two read
    /// differently to the player even though both score the same.
    pub fn from_outcome(outcome: Outcome, stalemate: bool) -> Self {
        match outcome {
            Outcome::Decisive { winner } => GameStatus::Ended(EndReason::Checkmate { winner }),
            Outcome::Draw if stalemate => GameStatus::Ended(EndReason::Stalemate),
            Outcome::Draw => GameStatus::Ended(EndReason::Draw),
        }
    }
}
