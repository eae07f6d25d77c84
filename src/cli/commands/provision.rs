use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use super::{HostArgs, local_workspace_root};
use crate::cli::Output;
use crate::config::StepConfig;
use crate::platform::HostInfo;
use crate::provision::{BinaryProvisioner, HttpFetcher, TemplateProvisioner};
use crate::workspace::Workspace;

#[derive(Args)]
pub struct ProvisionArgs {
    /// Workspace directory to provision into
    #[arg(short, long, default_value = ".")]
    pub workspace: PathBuf,

    /// Only install the binary, leave templates alone
    #[arg(long)]
    pub skip_templates: bool,

    #[command(flatten)]
    pub host: HostArgs,
}

pub async fn execute(args: ProvisionArgs, config: &StepConfig, output: &Output) -> Result<i32> {
    config.validate()?;

    let workspace = Workspace::local(local_workspace_root(&args.workspace)?);
    let platform = args.host.apply(HostInfo::current()).resolve()?;
    output.step(&format!("Provisioning nuclei v{} for {platform}", config.scanner.version));

    let fetcher = HttpFetcher::new(config.connect_timeout())?;
    let binary = BinaryProvisioner::new(config.scanner.clone(), fetcher)
        .ensure(&workspace, platform)
        .await
        .context("Provisioning failed")?;
    output.key_value("Binary:", &binary.path.display().to_string(), true);

    if !args.skip_templates {
        let templates = TemplateProvisioner::new(config.templates.clone())
            .refresh(&binary, &workspace, output)
            .await;
        output.key_value("Templates:", &templates.display().to_string(), false);
    }

    output.success("Scanner ready");
    Ok(0)
}
