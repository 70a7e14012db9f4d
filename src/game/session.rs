//! The game session - the cooperative event loop around the arbitrator
//!
//! Runs the arbitrator and the engine channel inside one owned task. UI
//! collaborators talk to it through a [`SessionHandle`]: four mutating
//! entry points plus a legal-destination query, each answered over a
//! oneshot, and a `watch` feed publishing a fresh [`Snapshot`] after every
//! transition.
//!
//! The opponent's turn is a *pending* future (a cosmetic book delay, or an
//! engine round trip bounded by a response timeout) polled concurrently
//! with the command stream, so the UI stays responsive while the opponent
//! "thinks" and a second submission during that window is answered with
//! `DoubleSubmission` instead of being queued.
//!
//! Every pending continuation carries the epoch it was scheduled under;
//! `reset` bumps the epoch and drops the pending future, so a thinking
//! delay or search reply scheduled against the previous game can never
//! mutate the fresh board. The arbitration context (personality, colors,
//! status) is looked up from the arbitrator at application time, never
//! captured at request time.
//!
//! One deliberate rough edge: a reset issued mid-search leaves the engine
//! finishing its stale search; an immediately following search submission
//! can be rejected as busy until the stale reply drains, surfacing as
//! `EngineUnavailable` with `retry_opponent` as the recovery path.

use std::pin::Pin;
use std::time::Duration;

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shakmaty::Color;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use uci_channel::{EngineChannel, SearchOutcome};

use super::arbiter::{Arbiter, MoveOutcome, OpponentPlan, Snapshot};
use super::error::{GameError, GameResult};
use super::personality::Personality;

/// Base of the engine response timeout; the personality's maximum
/// thinking time is added on top
const SEARCH_TIMEOUT_BASE_SECS: f32 = 10.0;

type ReplySender = oneshot::Sender<GameResult<Snapshot>>;

enum Command {
    SubmitMove {
        from: String,
        to: String,
        promotion: Option<char>,
        reply: ReplySender,
    },
    RetryOpponent {
        reply: ReplySender,
    },
    Reset {
        reply: ReplySender,
    },
    Resign {
        reply: ReplySender,
    },
    LegalMoves {
        from: String,
        reply: oneshot::Sender<GameResult<Vec<String>>>,
    },
}

/// The deferred remainder of an opponent turn
enum Pending {
    Book {
        epoch: u64,
        uci: String,
        sleep: Pin<Box<tokio::time::Sleep>>,
        reply: Option<ReplySender>,
    },
    Search {
        epoch: u64,
        rx: oneshot::Receiver<SearchOutcome>,
        deadline: Pin<Box<tokio::time::Sleep>>,
        reply: Option<ReplySender>,
    },
}

enum Waited {
    BookElapsed,
    SearchResolved(Result<SearchOutcome, oneshot::error::RecvError>),
    SearchTimedOut,
}

enum Event {
    Cmd(Option<Command>),
    Waited(Waited),
}

/// Client handle to a running session
///
/// Cheap operations all round-trip through the session task, so ordering
/// between callers is exactly the arrival order of their commands.
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    /// Submit the human's move and await the completed turn
    ///
    /// Resolves once the opponent's reply has been applied (or the move
    /// itself ended the game). Errors out early with `IllegalMove`,
    /// `DoubleSubmission`, `GameOver` or `EngineUnavailable`.
    pub async fn submit_player_move(
        &self,
        from: &str,
        to: &str,
        promotion: Option<char>,
    ) -> GameResult<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::SubmitMove {
            from: from.to_string(),
            to: to.to_string(),
            promotion,
            reply: tx,
        })
        .await?;
        rx.await.map_err(|_| GameError::SessionClosed)?
    }

    /// Re-attempt a failed opponent turn (after `EngineUnavailable`)
    pub async fn retry_opponent(&self) -> GameResult<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::RetryOpponent { reply: tx }).await?;
        rx.await.map_err(|_| GameError::SessionClosed)?
    }

    /// Start a fresh game; cancels any opponent turn in flight
    pub async fn reset(&self) -> GameResult<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Reset { reply: tx }).await?;
        rx.await.map_err(|_| GameError::SessionClosed)?
    }

    /// Resign the game in the opponent's favor
    pub async fn resign(&self) -> GameResult<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Resign { reply: tx }).await?;
        rx.await.map_err(|_| GameError::SessionClosed)?
    }

    /// Legal destination squares for the piece on `from`
    pub async fn legal_destinations(&self, from: &str) -> GameResult<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::LegalMoves {
            from: from.to_string(),
            reply: tx,
        })
        .await?;
        rx.await.map_err(|_| GameError::SessionClosed)?
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    /// Subscribe to snapshot updates
    pub fn snapshots(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Stop the session task and tear the engine channel down
    pub async fn shutdown(self) {
        drop(self.cmd_tx);
        let _ = self.task.await;
    }

    async fn send(&self, command: Command) -> GameResult<()> {
        self.cmd_tx
            .send(command)
            .await
            .map_err(|_| GameError::SessionClosed)
    }
}

/// The session task state
pub struct GameSession {
    arbiter: Arbiter,
    channel: EngineChannel,
    rng: StdRng,
    epoch: u64,
    pending: Option<Pending>,
    cmd_rx: mpsc::Receiver<Command>,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl GameSession {
    /// Spawn a session for one game
    ///
    /// The channel must already be connected; the session takes ownership
    /// and terminates it on shutdown. If the human plays Black the
    /// opponent's first move is driven immediately.
    pub fn spawn(
        personality: Personality,
        human_color: Color,
        channel: EngineChannel,
    ) -> SessionHandle {
        Self::spawn_with_rng(personality, human_color, channel, StdRng::from_os_rng())
    }

    /// Spawn with a fixed seed, for reproducible games and tests
    pub fn spawn_seeded(
        personality: Personality,
        human_color: Color,
        channel: EngineChannel,
        seed: u64,
    ) -> SessionHandle {
        Self::spawn_with_rng(personality, human_color, channel, StdRng::seed_from_u64(seed))
    }

    fn spawn_with_rng(
        personality: Personality,
        human_color: Color,
        channel: EngineChannel,
        rng: StdRng,
    ) -> SessionHandle {
        let arbiter = Arbiter::new(personality, human_color);
        let (snapshot_tx, snapshots) = watch::channel(arbiter.snapshot());
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let session = GameSession {
            arbiter,
            channel,
            rng,
            epoch: 0,
            pending: None,
            cmd_rx,
            snapshot_tx,
        };
        let task = tokio::spawn(session.run());
        SessionHandle {
            cmd_tx,
            snapshots,
            task,
        }
    }

    async fn run(mut self) {
        if self.arbiter.turn_state().is_thinking() {
            self.drive_opponent(None).await;
        }

        loop {
            let event = if let Some(pending) = self.pending.as_mut() {
                tokio::select! {
                    biased;
                    cmd = self.cmd_rx.recv() => Event::Cmd(cmd),
                    waited = wait_pending(pending) => Event::Waited(waited),
                }
            } else {
                Event::Cmd(self.cmd_rx.recv().await)
            };

            match event {
                Event::Cmd(Some(command)) => self.handle_command(command).await,
                Event::Cmd(None) => break,
                Event::Waited(waited) => self.settle_pending(waited),
            }
        }

        self.channel.terminate().await;
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::SubmitMove {
                from,
                to,
                promotion,
                reply,
            } => {
                if self.pending.is_some() {
                    let _ = reply.send(Err(GameError::DoubleSubmission {
                        context: "opponent reply pending".to_string(),
                    }));
                    return;
                }
                match self.arbiter.submit_player_move(&from, &to, promotion) {
                    Ok(MoveOutcome::OpponentToReply) => {
                        self.publish();
                        self.drive_opponent(Some(reply)).await;
                    }
                    Ok(_) => {
                        self.publish();
                        let _ = reply.send(Ok(self.arbiter.snapshot()));
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            Command::RetryOpponent { reply } => {
                if self.pending.is_some() {
                    let _ = reply.send(Err(GameError::DoubleSubmission {
                        context: "opponent reply pending".to_string(),
                    }));
                } else if self.arbiter.turn_state().is_thinking() {
                    self.drive_opponent(Some(reply)).await;
                } else {
                    let _ = reply.send(Err(GameError::InvalidState {
                        state: "no opponent turn open".to_string(),
                        operation: "retry_opponent".to_string(),
                    }));
                }
            }
            Command::Reset { reply } => {
                self.cancel_pending();
                self.arbiter.reset();
                self.publish();
                let _ = reply.send(Ok(self.arbiter.snapshot()));
                if self.arbiter.turn_state().is_thinking() {
                    self.drive_opponent(None).await;
                }
            }
            Command::Resign { reply } => {
                self.cancel_pending();
                let result = self.arbiter.resign().map(|_| self.arbiter.snapshot());
                self.publish();
                let _ = reply.send(result);
            }
            Command::LegalMoves { from, reply } => {
                let _ = reply.send(self.arbiter.legal_destinations(&from));
            }
        }
    }

    /// Invalidate any deferred opponent work before a reset or resignation
    fn cancel_pending(&mut self) {
        self.epoch += 1;
        if matches!(self.pending, Some(Pending::Search { .. })) {
            self.channel.abandon_pending();
        }
        if let Some(pending) = self.pending.take() {
            let (Pending::Book { reply, .. } | Pending::Search { reply, .. }) = pending;
            respond(
                reply,
                Err(GameError::InvalidState {
                    state: "game was reset".to_string(),
                    operation: "opponent reply".to_string(),
                }),
            );
            debug!("[SESSION] cancelled pending opponent turn at epoch bump");
        }
    }

    /// Plan and start the opponent's turn
    async fn drive_opponent(&mut self, reply: Option<ReplySender>) {
        match self.arbiter.plan_opponent_reply(&mut self.rng) {
            Ok(OpponentPlan::Book { uci, delay }) => {
                self.pending = Some(Pending::Book {
                    epoch: self.epoch,
                    uci: uci.to_string(),
                    sleep: Box::pin(tokio::time::sleep(delay)),
                    reply,
                });
            }
            Ok(OpponentPlan::Search { request }) => {
                let limit = self.search_timeout();
                match self.channel.submit(&request).await {
                    Ok(rx) => {
                        self.pending = Some(Pending::Search {
                            epoch: self.epoch,
                            rx,
                            deadline: Box::pin(tokio::time::sleep(limit)),
                            reply,
                        });
                    }
                    Err(e) => {
                        respond(
                            reply,
                            Err(GameError::EngineUnavailable {
                                message: e.to_string(),
                            }),
                        );
                    }
                }
            }
            Err(e) => respond(reply, Err(e)),
        }
    }

    /// Apply (or fail) the opponent turn whose pending future resolved
    fn settle_pending(&mut self, waited: Waited) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        match pending {
            Pending::Book { epoch, uci, reply, .. } => {
                if epoch != self.epoch {
                    debug!("[SESSION] dropping book move scheduled before reset");
                    return;
                }
                let result = self
                    .arbiter
                    .apply_opponent_reply(&uci)
                    .map(|_| self.arbiter.snapshot());
                self.publish();
                respond(reply, result);
            }
            Pending::Search { epoch, reply, .. } => {
                if epoch != self.epoch {
                    debug!("[SESSION] dropping search reply scheduled before reset");
                    return;
                }
                let result = match waited {
                    Waited::SearchResolved(Ok(Some(mv))) => self
                        .arbiter
                        .apply_opponent_reply(&mv)
                        .map(|_| self.arbiter.snapshot()),
                    Waited::SearchResolved(Ok(None)) => Err(GameError::EngineUnavailable {
                        message: "engine reported no legal move".to_string(),
                    }),
                    Waited::SearchResolved(Err(_)) => Err(GameError::EngineUnavailable {
                        message: "engine terminated before replying".to_string(),
                    }),
                    Waited::SearchTimedOut => {
                        self.channel.abandon_pending();
                        Err(GameError::EngineUnavailable {
                            message: "engine did not reply within the time limit".to_string(),
                        })
                    }
                    Waited::BookElapsed => return,
                };
                self.publish();
                respond(reply, result);
            }
        }
    }

    fn search_timeout(&self) -> Duration {
        Duration::from_secs_f32(
            SEARCH_TIMEOUT_BASE_SECS + self.arbiter.personality().think_time_max,
        )
    }

    fn publish(&self) {
        let _ = self.snapshot_tx.send(self.arbiter.snapshot());
    }
}

fn respond(reply: Option<ReplySender>, result: GameResult<Snapshot>) {
    match reply {
        Some(tx) => {
            let _ = tx.send(result);
        }
        None => {
            if let Err(e) = result {
                warn!("[SESSION] opponent turn failed: {e}");
            }
        }
    }
}

async fn wait_pending(pending: &mut Pending) -> Waited {
    match pending {
        Pending::Book { sleep, .. } => {
            sleep.as_mut().await;
            Waited::BookElapsed
        }
        Pending::Search { rx, deadline, .. } => tokio::select! {
            res = rx => Waited::SearchResolved(res),
            _ = deadline.as_mut() => Waited::SearchTimedOut,
        },
    }
}
