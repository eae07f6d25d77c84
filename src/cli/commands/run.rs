use anyhow::{Context, Result, bail};
use clap::Args;
use std::path::PathBuf;

use super::{HostArgs, local_workspace_root};
use crate::cli::Output;
use crate::config::StepConfig;
use crate::platform::HostInfo;
use crate::process::NO_EXIT_CODE;
use crate::provision::HttpFetcher;
use crate::scan::{Orchestrator, ScanOptions};
use crate::workspace::Workspace;

#[derive(Args)]
pub struct RunArgs {
    /// URL to scan
    #[arg(short, long, env = "NUCLEI_STEP_TARGET")]
    pub target: String,

    /// Additional scanner flags, split on whitespace
    #[arg(long, allow_hyphen_values = true)]
    pub flags: Option<String>,

    /// Reporting/issue tracker configuration file passed to the scanner
    #[arg(long, value_name = "FILE", conflicts_with = "report_config_text")]
    pub report_config: Option<PathBuf>,

    /// Reporting/issue tracker configuration given inline
    #[arg(long, value_name = "YAML")]
    pub report_config_text: Option<String>,

    /// Workspace directory, on the remote host with --remote
    #[arg(short, long, default_value = ".")]
    pub workspace: PathBuf,

    /// Pipeline run identifier used in the output file name (random if omitted)
    #[arg(long, env = "NUCLEI_STEP_RUN_ID")]
    pub run_id: Option<String>,

    /// Run on the worker reached through the configured remote channel
    #[arg(long)]
    pub remote: bool,

    #[command(flatten)]
    pub host: HostArgs,
}

pub async fn execute(args: RunArgs, config: &StepConfig, output: &Output) -> Result<i32> {
    config.validate()?;

    let reporting_config = match (&args.report_config, args.report_config_text) {
        (Some(path), _) => Some(std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read reporting configuration '{}'", path.display())
        })?),
        (None, text) => text,
    };

    let local = HostInfo::current();
    let (workspace, host) = if args.remote {
        let Some(channel) = config.remote_channel() else {
            bail!("--remote needs a remote channel: set remote.program in the configuration");
        };
        output.verbose(&format!("Remote channel: {}", channel.describe()));
        (
            Workspace::remote(&args.workspace, channel),
            args.host.apply(config.remote_host(&local)),
        )
    } else {
        (
            Workspace::local(local_workspace_root(&args.workspace)?),
            args.host.apply(local),
        )
    };

    let run_id = args.run_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let mut options = ScanOptions::new(args.target, run_id);
    options.extra_flags = args.flags;
    options.reporting_config = reporting_config;

    let fetcher = HttpFetcher::new(config.connect_timeout())?;
    let orchestrator = Orchestrator::new(config.scan_settings(), host, fetcher);

    output.step(&format!(
        "Scanning {} in {}",
        options.target,
        workspace.root().display()
    ));

    // Dropping the scan future kills the scanner or the remote channel
    let result = tokio::select! {
        result = orchestrator.execute(options, &workspace, output) => {
            result.context("Scan failed")?
        }
        _ = tokio::signal::ctrl_c() => bail!("Interrupted, scan aborted"),
    };

    if result.exit_code == NO_EXIT_CODE {
        output.error("The scanner was terminated before reporting an exit code");
        return Ok(1);
    }

    if result.success() {
        output.success("Scan completed");
    } else {
        output.warning(&format!("Scanner exited with code {}", result.exit_code));
    }
    Ok(result.exit_code)
}
