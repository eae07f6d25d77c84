//! Line oriented JSON protocol spoken between a dispatcher and a worker
//!
//! The dispatcher writes one [`ScanRequest`] as a single JSON line to the
//! worker's stdin. The worker answers on stdout with [`WorkerEvent`] lines:
//! any number of `log` events followed by exactly one `result` or `error`.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use super::Executor;
use crate::error::ScanError;
use crate::process::ExecutionResult;
use crate::scan::ScanRequest;
use crate::sink::LogSink;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkerEvent {
    Log {
        line: String,
    },
    #[serde(rename = "result")]
    Finished {
        exit_code: i32,
        reached_subprocess: bool,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl WorkerEvent {
    pub fn finished(result: ExecutionResult) -> Self {
        WorkerEvent::Finished {
            exit_code: result.exit_code,
            reached_subprocess: result.reached_subprocess,
        }
    }

    pub fn error(err: &ScanError) -> Self {
        WorkerEvent::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    /// Parse one protocol line, `None` if it is not an event
    pub fn parse(line: &str) -> Option<Self> {
        serde_json::from_str(line.trim()).ok()
    }

    /// The outcome carried by a final event, `None` for log events
    pub fn into_outcome(self) -> Option<Result<ExecutionResult, ScanError>> {
        match self {
            WorkerEvent::Log { .. } => None,
            WorkerEvent::Finished {
                exit_code,
                reached_subprocess,
            } => Some(Ok(ExecutionResult {
                exit_code,
                reached_subprocess,
            })),
            WorkerEvent::Error { kind, message } => Some(Err(ScanError::Remote {
                message: format!("worker reported {kind}: {message}"),
            })),
        }
    }
}

/// Writes events as JSON lines; as a [`LogSink`] every line becomes a `log` event
pub struct EventWriter<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> EventWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn emit(&self, event: &WorkerEvent) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');

        let mut out = self
            .out
            .lock()
            .map_err(|_| std::io::Error::other("event writer poisoned"))?;
        out.write_all(&line)?;
        out.flush()
    }
}

impl<W: Write + Send> LogSink for EventWriter<W> {
    fn write_line(&self, line: &str) {
        let event = WorkerEvent::Log {
            line: line.to_string(),
        };
        if let Err(err) = self.emit(&event) {
            tracing::warn!("Failed to forward log line to dispatcher: {err}");
        }
    }
}

/// Worker side: read one request from `input`, run it with `executor` and
/// report the outcome to `output`.
///
/// Only failures to talk to the dispatcher are returned as errors; failures
/// of the scan itself travel as `error` events.
pub async fn serve<E, R, W>(executor: &E, input: R, output: W) -> std::io::Result<()>
where
    E: Executor,
    R: AsyncRead + Unpin,
    W: Write + Send,
{
    let events = EventWriter::new(output);

    let mut line = String::new();
    BufReader::new(input).read_line(&mut line).await?;

    let request: ScanRequest = match serde_json::from_str(line.trim()) {
        Ok(request) => request,
        Err(err) => {
            tracing::warn!("Rejected malformed scan request: {err}");
            return events.emit(&WorkerEvent::Error {
                kind: "invalid_request".to_string(),
                message: format!("Malformed scan request: {err}"),
            });
        }
    };

    tracing::info!(
        "Worker executing scan of {} in {}",
        request.options.target,
        request.workspace.display()
    );

    let event = match executor.provision_and_run(&request, &events).await {
        Ok(result) => WorkerEvent::finished(result),
        Err(err) => WorkerEvent::error(&err),
    };
    events.emit(&event)
}
