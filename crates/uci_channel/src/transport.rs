//! Transport seam between the channel state machine and the engine process
//!
//! The channel itself only needs two capabilities: write one line, read one
//! line. Keeping those behind traits lets the production transport run over
//! a spawned child process while tests script both sides of the
//! conversation in memory, so no test ever depends on an engine binary
//! being installed.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Read half of the engine conversation
#[async_trait]
pub trait TransportReader: Send {
    /// Receive the next line, or `None` once the engine closes its side
    async fn recv_line(&mut self) -> io::Result<Option<String>>;
}

/// Write half of the engine conversation
#[async_trait]
pub trait TransportWriter: Send {
    /// Send one line, terminator included by the transport
    async fn send_line(&mut self, line: &str) -> io::Result<()>;

    /// Tear the underlying resource down; best-effort and idempotent
    fn shutdown(&mut self) {}
}

/// Spawns the engine binary and exposes its stdio as a transport pair
pub struct ProcessTransport;

impl ProcessTransport {
    /// Launch `program` with piped stdio
    ///
    /// The child is killed on drop as a backstop; orderly teardown still
    /// goes through `quit` + [`TransportWriter::shutdown`].
    pub fn spawn(program: &str) -> io::Result<(ProcessReader, ProcessWriter)> {
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child.stdin.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "engine process has no stdin handle")
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "engine process has no stdout handle")
        })?;

        let reader = ProcessReader {
            lines: BufReader::new(stdout).lines(),
        };
        let writer = ProcessWriter { stdin, child };
        Ok((reader, writer))
    }
}

/// Line reader over the engine's stdout
pub struct ProcessReader {
    lines: Lines<BufReader<ChildStdout>>,
}

#[async_trait]
impl TransportReader for ProcessReader {
    async fn recv_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

/// Line writer over the engine's stdin, owning the child handle
pub struct ProcessWriter {
    stdin: ChildStdin,
    child: Child,
}

#[async_trait]
impl TransportWriter for ProcessWriter {
    async fn send_line(&mut self, line: &str) -> io::Result<()> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await
    }

    fn shutdown(&mut self) {
        // kill_on_drop would catch it eventually; this makes teardown prompt
        let _ = self.child.start_kill();
    }
}

/// In-memory transports for exercising the channel without a process
pub mod testing {
    use super::*;
    use tokio::sync::mpsc;

    /// Reader fed by a test harness
    pub struct ScriptedReader {
        rx: mpsc::UnboundedReceiver<String>,
    }

    /// Writer observed by a test harness
    pub struct ScriptedWriter {
        tx: mpsc::UnboundedSender<String>,
    }

    /// The harness side of a scripted conversation
    pub struct Harness {
        /// Lines the channel wrote, in order
        pub from_channel: mpsc::UnboundedReceiver<String>,
        /// Inject engine output lines here
        pub to_channel: mpsc::UnboundedSender<String>,
    }

    /// Build a scripted transport pair plus its controlling harness
    pub fn scripted_pair() -> (ScriptedReader, ScriptedWriter, Harness) {
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let (gui_tx, gui_rx) = mpsc::unbounded_channel();
        (
            ScriptedReader { rx: engine_rx },
            ScriptedWriter { tx: gui_tx },
            Harness {
                from_channel: gui_rx,
                to_channel: engine_tx,
            },
        )
    }

    #[async_trait]
    impl TransportReader for ScriptedReader {
        async fn recv_line(&mut self) -> io::Result<Option<String>> {
            Ok(self.rx.recv().await)
        }
    }

    #[async_trait]
    impl TransportWriter for ScriptedWriter {
        async fn send_line(&mut self, line: &str) -> io::Result<()> {
            self.tx
                .send(line.to_string())
                .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "harness hung up"))
        }
    }
}
