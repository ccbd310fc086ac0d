//! Supervised execution of one external command.
//!
//! The child's stdout and stderr are read by two forwarding tasks into a single
//! channel (the merged stream). The supervisor drains that channel into the
//! caller's sink and then collects the exit status. A watchdog sleep races the
//! supervisor in one `select!`; whichever finishes first decides the outcome and
//! the other future is dropped.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::error::ProcessError;
use super::filter::OutputFilter;
use super::invocation::Invocation;
use crate::ui::prelude::*;

/// How long output is still read after the process has exited.
const OUTPUT_GRACE: Duration = Duration::from_millis(500);

/// Receiver for filtered output lines.
pub trait LineSink: Send {
    fn line(&mut self, line: &str);
}

impl<F> LineSink for F
where
    F: FnMut(&str) + Send,
{
    fn line(&mut self, line: &str) {
        self(line)
    }
}

/// Echoes child output through the ui layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl LineSink for ConsoleSink {
    fn line(&mut self, line: &str) {
        emit(Level::Info, "process.output", line, None);
    }
}

/// Terminal state of a supervised run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Succeeded,
    Failed(i32),
    Terminated,
    TimedOut,
}

impl RunOutcome {
    fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => RunOutcome::Succeeded,
            Some(code) => RunOutcome::Failed(code),
            None => RunOutcome::Terminated,
        }
    }

    pub fn into_result(self, invocation: &Invocation) -> Result<(), ProcessError> {
        let program = invocation.program_name();
        match self {
            RunOutcome::Succeeded => Ok(()),
            RunOutcome::Failed(code) => Err(ProcessError::NonZeroExit { program, code }),
            RunOutcome::Terminated => Err(ProcessError::Terminated { program }),
            RunOutcome::TimedOut => Err(ProcessError::TimedOut {
                program,
                timeout: invocation.timeout(),
            }),
        }
    }
}

/// Something that can execute invocations. The pipeline only talks to this.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        invocation: &Invocation,
        sink: &mut dyn LineSink,
    ) -> Result<(), ProcessError>;
}

/// Runs real processes on the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(
        &self,
        invocation: &Invocation,
        sink: &mut dyn LineSink,
    ) -> Result<(), ProcessError> {
        run(invocation, sink).await
    }
}

/// Run to completion or timeout; any outcome but success is an error.
pub async fn run(invocation: &Invocation, sink: &mut dyn LineSink) -> Result<(), ProcessError> {
    supervise(invocation, sink).await?.into_result(invocation)
}

/// Run to completion or timeout and report how the process ended.
///
/// Errors here mean the process could not be started or supervised; a process
/// that ran and failed is reported through the returned [`RunOutcome`].
pub async fn supervise(
    invocation: &Invocation,
    sink: &mut dyn LineSink,
) -> Result<RunOutcome, ProcessError> {
    let program = invocation.program_name();
    if invocation.timeout().is_zero() {
        return Err(ProcessError::InvalidTimeout { program });
    }

    let mut command = Command::new(invocation.program());
    command
        .args(invocation.arguments())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = invocation.working_dir() {
        command.current_dir(dir);
    }

    emit(
        Level::Debug,
        "process.spawn",
        &format!("$ {}", invocation.command_line()),
        None,
    );

    let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut readers: Vec<JoinHandle<io::Result<()>>> = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(tokio::spawn(forward_lines(stdout, tx.clone())));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(tokio::spawn(forward_lines(stderr, tx.clone())));
    }
    // Channel closes once both forwarders are done
    drop(tx);

    let filter = invocation.output_filter();
    let deadline = tokio::time::sleep(invocation.timeout());
    tokio::pin!(deadline);
    let mut stream_open = true;

    // The watchdog guards the process itself, not its pipes
    let finished = loop {
        tokio::select! {
            biased;
            status = child.wait() => break Some(status),
            _ = &mut deadline => break None,
            line = rx.recv(), if stream_open => match line {
                Some(line) => deliver(&line, filter, sink),
                None => stream_open = false,
            },
        }
    };

    let Some(status) = finished else {
        emit(
            Level::Warn,
            "process.timeout",
            &format!(
                "{} did not finish within {}s, killing it",
                program,
                invocation.timeout().as_secs()
            ),
            None,
        );
        for reader in &readers {
            reader.abort();
        }
        // Reap the child so nothing outlives the invocation
        child
            .kill()
            .await
            .map_err(|source| ProcessError::Io { program, source })?;
        return Ok(RunOutcome::TimedOut);
    };

    let status = status.map_err(|source| ProcessError::Io {
        program: program.clone(),
        source,
    })?;

    // A background process started by the child can keep the pipes open long
    // after the child itself exited
    let drained = tokio::time::timeout(OUTPUT_GRACE, async {
        while let Some(line) = rx.recv().await {
            deliver(&line, filter, sink);
        }
    })
    .await
    .is_ok();

    if drained {
        for reader in readers {
            match reader.await {
                Ok(Ok(())) => {}
                Ok(Err(source)) => {
                    return Err(ProcessError::Io {
                        program: program.clone(),
                        source,
                    });
                }
                Err(join_err) => {
                    return Err(ProcessError::Io {
                        program: program.clone(),
                        source: io::Error::other(join_err),
                    });
                }
            }
        }
    } else {
        emit(
            Level::Debug,
            "process.output_open",
            &format!(
                "{} exited but its output is still open; no longer reading it",
                program
            ),
            None,
        );
        for reader in &readers {
            reader.abort();
        }
    }

    let outcome = RunOutcome::from_status(status);
    emit(
        Level::Debug,
        "process.exit",
        &format!("{} finished: {:?}", program, outcome),
        None,
    );
    Ok(outcome)
}

fn deliver(line: &str, filter: &OutputFilter, sink: &mut dyn LineSink) {
    if filter.passes(line) {
        sink.line(line);
    }
}

async fn forward_lines<R>(mut reader: R, tx: UnboundedSender<String>) -> io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buffer = [0u8; 4096];
    let mut splitter = LineSplitter::default();

    loop {
        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        for line in splitter.push(&buffer[..bytes_read]) {
            // Receiver only goes away when the run is abandoned
            if tx.send(line).is_err() {
                return Ok(());
            }
        }
    }

    if let Some(line) = splitter.finish() {
        let _ = tx.send(line);
    }
    Ok(())
}

/// Splits a byte stream on `\n` and `\r`.
///
/// Bytes are buffered until a delimiter arrives so multi-byte characters split
/// across reads decode correctly. Empty and whitespace-only lines are dropped.
#[derive(Debug, Default)]
struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self
            .pending
            .iter()
            .position(|b| *b == b'\n' || *b == b'\r')
        {
            let raw: Vec<u8> = self.pending.drain(..=pos).collect();
            if let Some(line) = decode_line(&raw[..pos]) {
                lines.push(line);
            }
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        decode_line(&rest)
    }
}

fn decode_line(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_end();
    if text.trim_start().is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
