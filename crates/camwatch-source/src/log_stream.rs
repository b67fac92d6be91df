//! System log stream source (macOS).
//!
//! Spawns `log stream` filtered to capture-session notifications. Both
//! stdout and stderr are drained by dedicated reader tasks into a bounded
//! channel, so the monitor can wait on the next line and on shutdown at
//! the same time. When both pipes close the channel closes too, which the
//! monitor treats as the stream having exited.

use std::process::Stdio;

use camwatch_core::normalize::{START_MARKER, STOP_MARKER};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::SourceError;

/// Lines buffered between the reader tasks and the monitor.
pub const LINE_CHANNEL_CAPACITY: usize = 64;

/// `log` predicate matching the two capture-session lifecycle messages.
pub fn capture_predicate() -> String {
    format!(
        r#"eventMessage CONTAINS "{START_MARKER}" OR eventMessage CONTAINS "{STOP_MARKER}""#
    )
}

/// Program + arguments for the streaming child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStreamCommand {
    program: String,
    args: Vec<String>,
}

impl LogStreamCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Default for LogStreamCommand {
    /// `log stream --predicate <capture predicate>`.
    fn default() -> Self {
        Self::new(
            "log",
            vec![
                "stream".to_string(),
                "--predicate".to_string(),
                capture_predicate(),
            ],
        )
    }
}

/// A running log-stream child process.
pub struct LogStream {
    child: Child,
    lines: mpsc::Receiver<String>,
    readers: Vec<JoinHandle<()>>,
}

impl LogStream {
    /// Launch the child process. Must be called inside a tokio runtime.
    pub fn spawn(command: &LogStreamCommand) -> Result<Self, SourceError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SourceError::Launch {
                program: command.program.clone(),
                source,
            })?;

        let (tx, lines) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(tokio::spawn(forward_lines(stdout, tx.clone())));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(forward_lines(stderr, tx)));
        }

        tracing::info!(program = %command.program, pid = ?child.id(), "log stream started");

        Ok(Self {
            child,
            lines,
            readers,
        })
    }

    /// Next line from the child, `None` once both of its pipes have closed.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Exit status of a child whose output has closed, as display text.
    pub async fn exit_status(&mut self) -> String {
        match self.child.wait().await {
            Ok(status) => status.to_string(),
            Err(e) => format!("wait failed: {e}"),
        }
    }

    /// Kill and reap the child process.
    pub async fn terminate(&mut self) -> Result<(), SourceError> {
        for reader in &self.readers {
            reader.abort();
        }
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }
        self.child.start_kill()?;
        let status = self.child.wait().await?;
        tracing::info!(%status, "log stream terminated");
        Ok(())
    }
}

async fn forward_lines<R>(reader: R, tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!("log stream read failed: {e}");
                break;
            }
        }
    }
}
