use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::Executor;
use super::protocol::WorkerEvent;
use crate::error::ScanError;
use crate::process::{self, ExecutionResult};
use crate::scan::ScanRequest;
use crate::sink::LogSink;
use crate::workspace::RemoteChannel;

/// Forwards requests to a worker started through a [`RemoteChannel`]
#[derive(Debug, Clone)]
pub struct RemoteExecutor {
    channel: RemoteChannel,
}

impl RemoteExecutor {
    pub fn new(channel: RemoteChannel) -> Self {
        Self { channel }
    }
}

impl Executor for RemoteExecutor {
    async fn provision_and_run(
        &self,
        request: &ScanRequest,
        sink: &dyn LogSink,
    ) -> Result<ExecutionResult, ScanError> {
        let mut payload = serde_json::to_vec(request).map_err(|e| ScanError::Remote {
            message: format!("Failed to encode scan request: {e}"),
        })?;
        payload.push(b'\n');

        tracing::info!("Dispatching scan to remote worker via '{}'", self.channel.describe());

        let mut command = Command::new(&self.channel.program);
        command
            .args(&self.channel.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = process::spawn(&mut command).await.map_err(|e| ScanError::Remote {
            message: format!("Failed to start remote channel '{}': {e}", self.channel.describe()),
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A worker that exits early still gets to report why on stdout
            let sent = async {
                stdin.write_all(&payload).await?;
                stdin.shutdown().await
            };
            if let Err(err) = sent.await {
                tracing::debug!("Remote channel closed its input early: {err}");
            }
        }

        let mut outcome = None;
        process::stream_output(
            child.stdout.take(),
            child.stderr.take(),
            |line| match WorkerEvent::parse(&line) {
                Some(WorkerEvent::Log { line }) => sink.write_line(&line),
                Some(event) => {
                    if outcome.is_none() {
                        outcome = event.into_outcome();
                    }
                }
                None => sink.write_line(&line),
            },
            |line| sink.write_line(&line),
        )
        .await;

        let status = child.wait().await;
        tracing::debug!("Remote channel exited: {status:?}");

        match outcome {
            Some(outcome) => outcome,
            None => {
                let code = status
                    .ok()
                    .and_then(|s| s.code())
                    .unwrap_or(process::NO_EXIT_CODE);
                Err(ScanError::Remote {
                    message: format!("Worker exited with code {code} without reporting a result"),
                })
            }
        }
    }
}
