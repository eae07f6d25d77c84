use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::Output;
use crate::config::{ConfigFormat, StepConfig};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Display current merged configuration
    Show {
        /// Output format: json, toml, yaml
        #[arg(short, long, default_value = "toml")]
        format: String,
    },
    /// Validate the merged configuration
    Validate,
}

pub async fn execute(args: ConfigArgs, config: &StepConfig, output: &Output) -> Result<i32> {
    match args.command {
        ConfigCommand::Show { format } => {
            let format: ConfigFormat = format.parse()?;
            println!("{}", config.export(format)?);
        }
        ConfigCommand::Validate => {
            config.validate()?;
            output.success("Configuration is valid");
            output.key_value("Scanner:", &format!("nuclei v{}", config.scanner.version), false);
            let remote = config
                .remote_channel()
                .map(|channel| channel.describe())
                .unwrap_or_else(|| "not configured".to_string());
            output.key_value("Remote:", &remote, false);
        }
    }

    Ok(0)
}
