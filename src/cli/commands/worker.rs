use anyhow::{Context, Result};
use clap::Args;

use crate::config::StepConfig;
use crate::executor::{LocalExecutor, serve};
use crate::provision::HttpFetcher;

#[derive(Args)]
pub struct WorkerArgs {}

/// Serve a single request. Scan failures are reported on the protocol, so
/// the worker itself only fails when it cannot talk to the dispatcher.
pub async fn execute(_args: WorkerArgs, config: &StepConfig) -> Result<i32> {
    let executor = LocalExecutor::new(HttpFetcher::new(config.connect_timeout())?);

    serve(&executor, tokio::io::stdin(), std::io::stdout())
        .await
        .context("Lost connection to the dispatcher")?;
    Ok(0)
}
