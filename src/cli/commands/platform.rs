use anyhow::Result;
use clap::Args;

use super::HostArgs;
use crate::cli::Output;
use crate::config::StepConfig;
use crate::platform::HostInfo;

#[derive(Args)]
pub struct PlatformArgs {
    #[command(flatten)]
    pub host: HostArgs,
}

pub async fn execute(args: PlatformArgs, config: &StepConfig, output: &Output) -> Result<i32> {
    let host = args.host.apply(HostInfo::current());
    let platform = host.resolve()?;

    output.key_value("Host:", &format!("{} {}", host.os, host.arch), false);
    output.key_value("Platform:", &platform.to_string(), true);
    output.key_value("Binary:", platform.binary_name(), false);
    output.key_value("Archive:", &config.scanner.archive_url(platform), false);
    Ok(0)
}
