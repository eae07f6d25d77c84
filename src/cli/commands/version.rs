use anyhow::Result;
use clap::Args;

use crate::provision::binary::DEFAULT_VERSION;

#[derive(Args)]
pub struct VersionArgs {
    /// Show detailed version information
    #[arg(long)]
    pub detailed: bool,
}

pub async fn execute(args: VersionArgs) -> Result<i32> {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    if args.detailed {
        println!("Default nuclei release: v{DEFAULT_VERSION}");
        println!("Rust Edition: 2024");
        println!("Target: {}-{}", std::env::consts::OS, std::env::consts::ARCH);
        println!("Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
        println!("Description: {}", env!("CARGO_PKG_DESCRIPTION"));
    }
    Ok(0)
}
