//! The move arbitrator - the authoritative game state machine
//!
//! Owns the canonical board, the ply counter and the bookkeeping, decides
//! book-versus-search for every opponent turn, and exposes the only
//! mutation entry points. Player moves and opponent replies both flow
//! through the rule engine's single application path, so legality is
//! enforced in one place regardless of where a move came from.
//!
//! # Turn state machine
//!
//! ```text
//! AwaitingPlayerMove -> AwaitingOpponentReply -> AwaitingPlayerMove
//!          |                     |
//!          +-----> GameEnded <---+
//! ```
//!
//! The two mutators (`submit_player_move`, `apply_opponent_reply`) can
//! never both be live: the reply path is only reachable after a player
//! move committed, and new player moves are rejected until the reply path
//! completes. That discipline, not request ids, is what matches engine
//! responses to requests.

use std::time::Duration;

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shakmaty::{uci::Uci, Color};
use std::str::FromStr;
use uci_channel::SearchRequest;

use super::book;
use super::captured::CapturedPieces;
use super::chess_serde::color_serde;
use super::error::{GameError, GameResult};
use super::history::{MoveHistory, MoveRecord};
use super::personality::Personality;
use super::phase;
use super::rules::{AppliedMove, RuleBoard};
use super::status::{EndReason, GameStatus};

/// Where we are within the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    /// Waiting for the human to move
    AwaitingPlayerMove,
    /// A player move committed; the opponent reply (book or search) is due
    AwaitingOpponentReply,
    /// Terminal
    GameEnded,
}

impl TurnState {
    /// Does this state accept human input
    pub fn accepts_player_input(&self) -> bool {
        matches!(self, TurnState::AwaitingPlayerMove)
    }

    /// Is the opponent side "thinking"
    pub fn is_thinking(&self) -> bool {
        matches!(self, TurnState::AwaitingOpponentReply)
    }

    fn name(&self) -> &'static str {
        match self {
            TurnState::AwaitingPlayerMove => "awaiting player move",
            TurnState::AwaitingOpponentReply => "awaiting opponent reply",
            TurnState::GameEnded => "game ended",
        }
    }
}

/// The last move in UI coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMove {
    pub from: String,
    pub to: String,
    pub uci: String,
}

impl LastMove {
    fn from_record(record: &MoveRecord) -> Self {
        let uci = record.uci.clone();
        Self {
            from: uci.get(0..2).unwrap_or("").to_string(),
            to: uci.get(2..4).unwrap_or("").to_string(),
            uci,
        }
    }
}

/// Read-only state published to the UI collaborator after every transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub fen: String,
    #[serde(with = "color_serde")]
    pub turn: Color,
    pub status: GameStatus,
    pub last_move: Option<LastMove>,
    /// True while the opponent reply is outstanding
    pub is_thinking: bool,
    pub ply: u32,
    /// Positive favors White
    pub material_advantage: i32,
    pub personality: String,
}

/// What a committed move led to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Game continues; the opponent owes a reply
    OpponentToReply,
    /// Game continues; the human is to move
    PlayerToMove,
    /// The move ended the game
    GameEnded,
}

/// How the opponent's turn will be answered
#[derive(Debug, Clone, PartialEq)]
pub enum OpponentPlan {
    /// Serve a book move after a cosmetic thinking delay
    Book { uci: Uci, delay: Duration },
    /// Dispatch a search to the engine channel
    Search { request: SearchRequest },
}

/// The authoritative state machine
pub struct Arbiter {
    board: RuleBoard,
    personality: Personality,
    human_color: Color,
    turn_state: TurnState,
    status: GameStatus,
    ply: u32,
    history: MoveHistory,
    captured: CapturedPieces,
}

impl Arbiter {
    /// Start a fresh game against `personality`, human playing
    /// `human_color`
    ///
    /// When the human plays Black the arbiter starts in
    /// `AwaitingOpponentReply`: the caller must immediately drive the
    /// opponent's first move.
    pub fn new(personality: Personality, human_color: Color) -> Self {
        let mut arbiter = Self {
            board: RuleBoard::new(),
            personality,
            human_color,
            turn_state: TurnState::AwaitingPlayerMove,
            status: GameStatus::Playing,
            ply: 0,
            history: MoveHistory::default(),
            captured: CapturedPieces::default(),
        };
        arbiter.reset();
        arbiter
    }

    /// Re-initialize to the starting position; permitted from any state
    pub fn reset(&mut self) {
        self.board = RuleBoard::new();
        self.ply = 0;
        self.status = GameStatus::Playing;
        self.history.clear();
        self.captured.clear();
        self.turn_state = if self.human_color == Color::White {
            TurnState::AwaitingPlayerMove
        } else {
            TurnState::AwaitingOpponentReply
        };
        info!(
            "[ARBITER] new game: {} as {:?} vs {:?} human",
            self.personality.id,
            self.human_color.other(),
            self.human_color
        );
    }

    pub fn turn_state(&self) -> TurnState {
        self.turn_state
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn fen(&self) -> String {
        self.board.fen()
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn human_color(&self) -> Color {
        self.human_color
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn captured(&self) -> &CapturedPieces {
        &self.captured
    }

    fn opponent_color(&self) -> Color {
        self.human_color.other()
    }

    /// Legal destination squares for the piece on `from`, for the UI
    pub fn legal_destinations(&self, from: &str) -> GameResult<Vec<String>> {
        let square = shakmaty::Square::from_ascii(from.as_bytes()).map_err(|_| {
            GameError::IllegalMove {
                uci: from.to_string(),
            }
        })?;
        Ok(self
            .board
            .legal_destinations(square)
            .into_iter()
            .map(|sq| sq.to_string())
            .collect())
    }

    /// Submit the human's move
    ///
    /// Rejected when a turn is already in flight or when it is not
    /// actually the human's side to move (a stale drag-drop fired after
    /// the opponent already replied). An illegal move reports
    /// `IllegalMove` and leaves every piece of state untouched.
    pub fn submit_player_move(
        &mut self,
        from: &str,
        to: &str,
        promotion: Option<char>,
    ) -> GameResult<MoveOutcome> {
        if self.status.is_over() {
            return Err(GameError::GameOver {
                reason: self.status.message(),
            });
        }
        if !self.turn_state.accepts_player_input() {
            return Err(GameError::DoubleSubmission {
                context: self.turn_state.name().to_string(),
            });
        }
        if self.board.turn() != self.human_color {
            return Err(GameError::DoubleSubmission {
                context: "not the player's side to move".to_string(),
            });
        }

        let uci = RuleBoard::uci_from_coords(from, to, promotion)?;
        let applied = self.board.apply_uci(&uci)?;
        info!("[ARBITER] player move {} accepted", applied.uci);

        Ok(self.finish_move(applied, TurnState::AwaitingOpponentReply))
    }

    /// Decide how the opponent answers this turn
    ///
    /// While inside the personality's book window, a legal book suggestion
    /// becomes a paced book reply; an illegal or unparseable suggestion is
    /// silently downgraded to a search (it must never reach the board).
    /// Outside the window, or with no suggestion, the Phase & Depth Policy
    /// sizes a search request.
    pub fn plan_opponent_reply<R: Rng>(&mut self, rng: &mut R) -> GameResult<OpponentPlan> {
        if self.status.is_over() {
            return Err(GameError::GameOver {
                reason: self.status.message(),
            });
        }
        if self.turn_state != TurnState::AwaitingOpponentReply {
            return Err(GameError::InvalidState {
                state: self.turn_state.name().to_string(),
                operation: "plan_opponent_reply".to_string(),
            });
        }

        let fen = self.board.fen();
        if self.ply <= self.personality.book_depth {
            if let Some(suggestion) =
                book::select_book_move(&fen, self.board.turn(), &self.personality, rng)
            {
                match Uci::from_str(&suggestion) {
                    Ok(uci) if self.board.is_legal(&uci) => {
                        let delay = self.personality.draw_thinking_delay(rng);
                        debug!(
                            "[BOOK] {} plays {} from book (delay {:?})",
                            self.personality.id, suggestion, delay
                        );
                        return Ok(OpponentPlan::Book { uci, delay });
                    }
                    _ => {
                        // stale or mistyped book entry; never surfaced
                        debug!(
                            "[BOOK] suggestion {} is not legal here, falling back to search",
                            suggestion
                        );
                    }
                }
            }
        }

        let depth = phase::pick_depth(&fen, self.ply, self.board.is_check(), &self.personality);
        debug!(
            "[ARBITER] search planned at depth {depth} (ply {}, {:?})",
            self.ply,
            phase::classify_phase(&fen, self.ply)
        );
        Ok(OpponentPlan::Search {
            request: SearchRequest {
                fen,
                depth,
                skill_level: self.personality.skill_level,
                contempt: self.personality.contempt,
            },
        })
    }

    /// Apply the opponent's reply (book move or engine best move)
    ///
    /// Shares the application path with player moves. A reply the rule
    /// engine rejects means the engine (or a corrupted book) produced an
    /// unusable move; the turn fails with `EngineUnavailable` and the
    /// arbiter stays in `AwaitingOpponentReply` so the caller can retry or
    /// resign.
    pub fn apply_opponent_reply(&mut self, uci_str: &str) -> GameResult<MoveOutcome> {
        if self.status.is_over() {
            return Err(GameError::GameOver {
                reason: self.status.message(),
            });
        }
        if self.turn_state != TurnState::AwaitingOpponentReply {
            return Err(GameError::InvalidState {
                state: self.turn_state.name().to_string(),
                operation: "apply_opponent_reply".to_string(),
            });
        }

        let uci = Uci::from_str(uci_str).map_err(|_| GameError::EngineUnavailable {
            message: format!("unparseable reply {uci_str:?}"),
        })?;
        let applied = self
            .board
            .apply_uci(&uci)
            .map_err(|_| GameError::EngineUnavailable {
                message: format!("reply {uci_str} is not legal in this position"),
            })?;
        info!(
            "[ARBITER] {} replies {}",
            self.personality.id, applied.uci
        );

        Ok(self.finish_move(applied, TurnState::AwaitingPlayerMove))
    }

    /// The human resigns; the personality wins regardless of the board
    pub fn resign(&mut self) -> GameResult<()> {
        match self.turn_state {
            TurnState::AwaitingPlayerMove | TurnState::AwaitingOpponentReply => {
                self.status = GameStatus::Ended(EndReason::Resignation {
                    winner: self.opponent_color(),
                });
                self.turn_state = TurnState::GameEnded;
                info!("[ARBITER] player resigned, {}", self.status.message());
                Ok(())
            }
            TurnState::GameEnded => Err(GameError::GameOver {
                reason: self.status.message(),
            }),
        }
    }

    /// Published view of the current state
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            fen: self.board.fen(),
            turn: self.board.turn(),
            status: self.status,
            last_move: self.history.last_move().map(LastMove::from_record),
            is_thinking: self.turn_state.is_thinking(),
            ply: self.ply,
            material_advantage: self.captured.material_advantage(),
            personality: self.personality.id.clone(),
        }
    }

    /// Shared post-application bookkeeping for both mutators
    fn finish_move(&mut self, applied: AppliedMove, next: TurnState) -> MoveOutcome {
        self.ply += 1;
        if let Some(role) = applied.capture {
            self.captured.add_capture(applied.color.other(), role);
        }
        self.history
            .add_move(MoveRecord::from_applied(self.ply, &applied));

        if self.board.is_game_over() {
            if let Some(outcome) = self.board.outcome() {
                self.status = GameStatus::from_outcome(outcome, self.board.is_stalemate());
            }
            self.turn_state = TurnState::GameEnded;
            info!("[ARBITER] {}", self.status.message());
            return MoveOutcome::GameEnded;
        }

        self.turn_state = next;
        match next {
            TurnState::AwaitingOpponentReply => MoveOutcome::OpponentToReply,
            _ => MoveOutcome::PlayerToMove,
        }
    }
}
