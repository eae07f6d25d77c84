use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::StepConfig;
use crate::platform::HostInfo;

use super::Output;

pub mod config;
pub mod platform;
pub mod provision;
pub mod run;
pub mod version;
pub mod worker;

#[derive(Parser)]
#[command(
    name = "nuclei-step",
    version = env!("CARGO_PKG_VERSION"),
    about = "Provision and run the nuclei vulnerability scanner from a build pipeline",
    long_about = "nuclei-step downloads a pinned nuclei release for the host platform, keeps its \
                  templates current and runs a scan against a target, either in a local workspace \
                  or on a remote worker reached through a configured channel."
)]
pub struct Cli {
    /// Run as if started in <DIR> instead of current working directory
    #[arg(short = 'C', long = "directory", global = true)]
    pub directory: Option<String>,

    /// Increase verbosity (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Use custom configuration file
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision the scanner and scan a target
    Run(run::RunArgs),
    /// Download the scanner binary and templates without scanning
    Provision(provision::ProvisionArgs),
    /// Show the resolved platform and its release archive
    Platform(platform::PlatformArgs),
    /// Serve one scan request from stdin (remote side of a channel)
    Worker(worker::WorkerArgs),
    /// Configuration management
    Config(config::ConfigArgs),
    /// Show version information
    Version(version::VersionArgs),
}

/// `--os`/`--arch` overrides of the detected host
#[derive(Args, Debug, Clone, Default)]
pub struct HostArgs {
    /// Operating system to provision for, instead of the detected one
    #[arg(long)]
    pub os: Option<String>,

    /// CPU architecture to provision for, instead of the detected one
    #[arg(long)]
    pub arch: Option<String>,
}

impl HostArgs {
    pub fn apply(&self, base: HostInfo) -> HostInfo {
        HostInfo::new(
            self.os.clone().unwrap_or(base.os),
            self.arch.clone().unwrap_or(base.arch),
        )
    }
}

impl Cli {
    /// Run the selected command and return the process exit code
    pub async fn run(self) -> Result<i32> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)
                .with_context(|| format!("Failed to change directory to '{dir}'"))?;
        }

        setup_logging(self.verbose, self.quiet);
        let output = Output::new(self.verbose > 0, self.quiet);

        let Some(command) = self.command else {
            Cli::command().print_help()?;
            return Ok(0);
        };

        let load_config = || StepConfig::load(self.config.as_deref().map(Path::new));

        match command {
            Commands::Run(args) => run::execute(args, &load_config()?, &output).await,
            Commands::Provision(args) => provision::execute(args, &load_config()?, &output).await,
            Commands::Platform(args) => platform::execute(args, &load_config()?, &output).await,
            Commands::Worker(args) => worker::execute(args, &load_config()?).await,
            Commands::Config(args) => config::execute(args, &load_config()?, &output).await,
            Commands::Version(args) => version::execute(args).await,
        }
    }
}

/// Create `path` if needed and return it as an absolute path
pub(crate) fn local_workspace_root(path: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create workspace '{}'", path.display()))?;
    path.canonicalize()
        .with_context(|| format!("Failed to resolve workspace '{}'", path.display()))
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,hyper_util=warn,reqwest=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,hyper_util=info,rustls=info"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    // stdout carries the pipeline log and the worker protocol
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
