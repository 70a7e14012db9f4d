//! The engine channel state machine
//!
//! Owns the single communication link to the external search process and
//! translates its line protocol into typed request/response pairs. The
//! channel enforces the one-outstanding-search discipline the orchestration
//! layer relies on: exactly one pending resolver is buffered, a second
//! submission fails loudly instead of overwriting it, and a terminal
//! response resolves the resolver exactly once.
//!
//! # State machine
//!
//! ```text
//! Uninitialized -> AwaitingHandshake -> Ready <-> Busy
//!                                         |        |
//!                                         +--> Terminated <--+
//! ```
//!
//! `connect` walks the handshake (`uci`/`uciok`, then `isready`/`readyok`)
//! and only hands back a channel already in `Ready`. A background pump task
//! then parses every engine line; `bestmove` resolves the pending search
//! and returns the channel to `Ready`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::error::{ChannelError, ChannelResult};
use crate::protocol::{parse_engine_line, EngineEvent, GuiCommand, SearchRequest};
use crate::transport::{TransportReader, TransportWriter};

/// Lifecycle states of the engine link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// No process attached yet
    Uninitialized,
    /// Handshake commands sent, acknowledgment outstanding
    AwaitingHandshake,
    /// Idle and able to accept a search
    Ready,
    /// Exactly one search outstanding
    Busy,
    /// Torn down; every further submit is rejected
    Terminated,
}

/// What a resolved search yields: the best move, or `None` when the engine
/// reported `(none)` (no legal moves in the searched position)
pub type SearchOutcome = Option<String>;

struct Shared {
    state: ChannelState,
    pending: Option<oneshot::Sender<SearchOutcome>>,
    /// Set when a pending search was abandoned (timeout); the next
    /// `bestmove` is drained instead of resolved
    discard_next: bool,
}

/// The owned engine link
///
/// Constructed via [`EngineChannel::connect`], torn down via
/// [`EngineChannel::terminate`] (also invoked on drop as a backstop). Never
/// a global: the session owns exactly one and replaces it wholesale when
/// the engine is swapped.
pub struct EngineChannel {
    shared: Arc<Mutex<Shared>>,
    writer: Box<dyn TransportWriter>,
    pump: Option<JoinHandle<()>>,
}

impl EngineChannel {
    /// Perform the UCI handshake over the given transport and return a
    /// channel in `Ready`
    ///
    /// Each handshake stage is bounded by `handshake_timeout`; a silent or
    /// garbled engine yields [`ChannelError::Handshake`] rather than a hang.
    pub async fn connect(
        mut reader: Box<dyn TransportReader>,
        mut writer: Box<dyn TransportWriter>,
        handshake_timeout: Duration,
    ) -> ChannelResult<Self> {
        debug!("[UCI] handshake: sending uci");
        writer.send_line(&GuiCommand::Uci.as_line()).await?;
        wait_for(&mut *reader, handshake_timeout, EngineEvent::UciOk).await?;

        debug!("[UCI] handshake: sending isready");
        writer.send_line(&GuiCommand::IsReady.as_line()).await?;
        wait_for(&mut *reader, handshake_timeout, EngineEvent::ReadyOk).await?;

        info!("[UCI] engine handshake complete, channel ready");

        let shared = Arc::new(Mutex::new(Shared {
            state: ChannelState::Ready,
            pending: None,
            discard_next: false,
        }));
        let pump = tokio::spawn(pump_loop(reader, Arc::clone(&shared)));

        Ok(Self {
            shared,
            writer,
            pump: Some(pump),
        })
    }

    /// Current lifecycle state
    pub fn state(&self) -> ChannelState {
        self.lock_shared().state
    }

    /// Dispatch one search
    ///
    /// Rejected with [`ChannelError::Busy`] while a search is outstanding
    /// and with [`ChannelError::Terminated`] after teardown; accepted
    /// searches store the single pending resolver and forward the position
    /// and search directives to the process. The returned receiver resolves
    /// with the engine's best move (`None` for `bestmove (none)`); a
    /// dropped receiver-side error means the engine died mid-search.
    pub async fn submit(
        &mut self,
        request: &SearchRequest,
    ) -> ChannelResult<oneshot::Receiver<SearchOutcome>> {
        let (tx, rx) = oneshot::channel();
        {
            let mut shared = self.lock_shared();
            match shared.state {
                ChannelState::Ready => {
                    shared.state = ChannelState::Busy;
                    shared.pending = Some(tx);
                }
                ChannelState::Terminated => return Err(ChannelError::Terminated),
                _ => return Err(ChannelError::Busy),
            }
        }

        debug!(
            "[UCI] submitting search: depth {} skill {} contempt {}",
            request.depth, request.skill_level, request.contempt
        );
        let lines = [
            GuiCommand::SetOption {
                name: "Skill Level".to_string(),
                value: request.skill_level.to_string(),
            },
            GuiCommand::SetOption {
                name: "Contempt".to_string(),
                value: request.contempt.to_string(),
            },
            GuiCommand::PositionFen(request.fen.clone()),
            GuiCommand::GoDepth(request.depth),
        ];
        for command in &lines {
            if let Err(e) = self.writer.send_line(&command.as_line()).await {
                error!("[UCI] write failed, terminating channel: {e}");
                let mut shared = self.lock_shared();
                shared.state = ChannelState::Terminated;
                shared.pending = None;
                return Err(e.into());
            }
        }
        Ok(rx)
    }

    /// Abandon the outstanding search after a caller-side timeout
    ///
    /// The resolver is dropped (its receiver observes the cancellation) and
    /// the next `bestmove` the engine eventually prints is drained so a
    /// stale reply can never be mistaken for a fresh one.
    pub fn abandon_pending(&mut self) {
        let mut shared = self.lock_shared();
        if shared.pending.take().is_some() {
            shared.discard_next = true;
            warn!("[UCI] abandoned outstanding search; next bestmove will be drained");
        }
    }

    /// Tear the channel down; idempotent
    ///
    /// Sends `quit` best-effort, stops the pump, and puts the channel in
    /// `Terminated` so any later submit returns a rejection, not a hang.
    pub async fn terminate(&mut self) {
        {
            let mut shared = self.lock_shared();
            if shared.state == ChannelState::Terminated {
                return;
            }
            shared.state = ChannelState::Terminated;
            shared.pending = None;
        }
        info!("[UCI] terminating engine channel");
        let _ = self.writer.send_line(&GuiCommand::Quit.as_line()).await;
        self.writer.shutdown();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }

    fn lock_shared(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().expect("engine channel state lock poisoned")
    }
}

impl Drop for EngineChannel {
    fn drop(&mut self) {
        self.writer.shutdown();
        if let Some(pump) = self.pump.take() {
            pump.abort();
        }
    }
}

/// Wait for one specific acknowledgment event, skipping chatter
async fn wait_for(
    reader: &mut dyn TransportReader,
    limit: Duration,
    want: EngineEvent,
) -> ChannelResult<()> {
    let wanted = want.clone();
    let outcome = timeout(limit, async move {
        loop {
            match reader.recv_line().await? {
                Some(line) => match parse_engine_line(&line) {
                    ev if ev == wanted => return Ok(()),
                    EngineEvent::Chatter(_) => continue,
                    other => {
                        debug!("[UCI] ignoring {other:?} during handshake");
                        continue;
                    }
                },
                None => {
                    return Err(ChannelError::Handshake {
                        message: "engine closed the pipe during handshake".to_string(),
                    })
                }
            }
        }
    })
    .await;

    match outcome {
        Ok(result) => result,
        Err(_) => Err(ChannelError::Handshake {
            message: format!("timed out waiting for {want:?}"),
        }),
    }
}

/// Background task parsing every engine line after the handshake
async fn pump_loop(mut reader: Box<dyn TransportReader>, shared: Arc<Mutex<Shared>>) {
    loop {
        let line = match reader.recv_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("[UCI] engine closed its output, channel terminated");
                let mut sh = shared.lock().expect("engine channel state lock poisoned");
                sh.state = ChannelState::Terminated;
                sh.pending = None;
                return;
            }
            Err(e) => {
                error!("[UCI] read failed, channel terminated: {e}");
                let mut sh = shared.lock().expect("engine channel state lock poisoned");
                sh.state = ChannelState::Terminated;
                sh.pending = None;
                return;
            }
        };

        match parse_engine_line(&line) {
            EngineEvent::BestMove(best) => {
                let mut sh = shared.lock().expect("engine channel state lock poisoned");
                if sh.discard_next {
                    sh.discard_next = false;
                    warn!("[UCI] drained bestmove for an abandoned search");
                } else if let Some(tx) = sh.pending.take() {
                    // send fails only if the caller stopped listening
                    let _ = tx.send(best);
                } else {
                    warn!("[UCI] bestmove with no pending search: {line}");
                }
                if sh.state == ChannelState::Busy {
                    sh.state = ChannelState::Ready;
                }
            }
            EngineEvent::Malformed(raw) => {
                // drop the resolver: the receiver observes a failed search
                warn!("[UCI] protocol violation from engine: {raw}");
                let mut sh = shared.lock().expect("engine channel state lock poisoned");
                sh.pending = None;
                if sh.state == ChannelState::Busy {
                    sh.state = ChannelState::Ready;
                }
            }
            EngineEvent::Chatter(raw) => debug!("[UCI] {raw}"),
            other => debug!("[UCI] unexpected {other:?} outside handshake"),
        }
    }
}
