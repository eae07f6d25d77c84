//! Subprocess execution with live output streaming
//!
//! Output is forwarded to the [`LogSink`] line by line while the process runs,
//! so a long scan shows progress instead of one dump at the end. stdout and
//! stderr are read concurrently; each stream keeps its own order, their
//! interleaving is whatever the scheduler observes.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};

use crate::error::ScanError;
use crate::sink::LogSink;

/// Exit code reported when no code is available (launch failure, signal)
pub const NO_EXIT_CODE: i32 = -1;

/// Outcome of one subprocess run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub exit_code: i32,
    /// False when the process could not be started at all
    pub reached_subprocess: bool,
}

impl ExecutionResult {
    pub fn completed(exit_code: i32) -> Self {
        Self {
            exit_code,
            reached_subprocess: true,
        }
    }

    pub fn not_launched() -> Self {
        Self {
            exit_code: NO_EXIT_CODE,
            reached_subprocess: false,
        }
    }

    pub fn success(&self) -> bool {
        self.reached_subprocess && self.exit_code == 0
    }
}

#[derive(Debug, Clone)]
pub struct ProcessRunner {
    working_dir: PathBuf,
}

impl ProcessRunner {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// Run `argv` to completion. A launch failure is reported to the sink and
    /// returned as `reached_subprocess == false` instead of an error.
    pub async fn run(&self, argv: &[String], sink: &dyn LogSink) -> ExecutionResult {
        match self.execute(argv, sink).await {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!("{err}");
                sink.write_line(&err.to_string());
                ExecutionResult::not_launched()
            }
        }
    }

    /// Run `argv` to completion, failing with [`ScanError::ProcessLaunch`] when
    /// the program cannot be started.
    ///
    /// The child is killed if the returned future is dropped before it exits.
    pub async fn execute(
        &self,
        argv: &[String],
        sink: &dyn LogSink,
    ) -> Result<ExecutionResult, ScanError> {
        let (program, args) = argv.split_first().ok_or_else(|| ScanError::ProcessLaunch {
            program: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command line"),
        })?;

        tracing::debug!("Running: {}", argv.join(" "));

        let mut command = Command::new(program);
        command
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = spawn(&mut command)
            .await
            .map_err(|source| ScanError::ProcessLaunch {
                program: program.clone(),
                source,
            })?;

        stream_output(
            child.stdout.take(),
            child.stderr.take(),
            |line| sink.write_line(&line),
            |line| sink.write_line(&line),
        )
        .await;

        let exit_code = match child.wait().await {
            Ok(status) => status.code().unwrap_or(NO_EXIT_CODE),
            Err(err) => {
                tracing::warn!("Failed to wait for '{program}': {err}");
                NO_EXIT_CODE
            }
        };

        tracing::debug!("'{program}' exited with code {exit_code}");
        Ok(ExecutionResult::completed(exit_code))
    }
}

/// Spawn `command`, retrying briefly on ETXTBSY: a binary written moments
/// ago can still be held open by a process another thread is forking.
pub(crate) async fn spawn(command: &mut Command) -> std::io::Result<Child> {
    const ETXTBSY: i32 = 26;
    let mut attempts = 0;
    loop {
        match command.spawn() {
            Err(err) if cfg!(unix) && err.raw_os_error() == Some(ETXTBSY) && attempts < 5 => {
                attempts += 1;
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            result => return result,
        }
    }
}

/// Read both pipes line by line until both are closed
pub(crate) async fn stream_output<O, E>(
    stdout: Option<O>,
    stderr: Option<E>,
    mut on_stdout: impl FnMut(String),
    mut on_stderr: impl FnMut(String),
) where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut stdout = stdout.map(LossyLines::new);
    let mut stderr = stderr.map(LossyLines::new);

    loop {
        tokio::select! {
            line = next_line(&mut stdout), if stdout.is_some() => match line {
                Some(line) => on_stdout(line),
                None => stdout = None,
            },
            line = next_line(&mut stderr), if stderr.is_some() => match line {
                Some(line) => on_stderr(line),
                None => stderr = None,
            },
            else => break,
        }
    }
}

async fn next_line<R: AsyncRead + Unpin>(lines: &mut Option<LossyLines<R>>) -> Option<String> {
    match lines {
        Some(lines) => lines.next_line().await,
        None => None,
    }
}

/// Line reader that tolerates non UTF-8 output.
///
/// `read_until` keeps partially read bytes in `buf`, so a cancelled read in
/// `select!` loses nothing.
struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::new(),
        }
    }

    async fn next_line(&mut self) -> Option<String> {
        let read = self.reader.read_until(b'\n', &mut self.buf).await;
        if self.buf.is_empty() {
            return None;
        }
        if let Err(err) = read {
            tracing::debug!("Output stream closed with error: {err}");
        }

        let line = String::from_utf8_lossy(&self.buf)
            .trim_end_matches(['\n', '\r'])
            .to_string();
        self.buf.clear();
        Some(line)
    }
}
