//! # nuclei-step
//!
//! Runs the [nuclei](https://github.com/projectdiscovery/nuclei) vulnerability
//! scanner as a build pipeline step.
//!
//! For one target and workspace the step resolves the host platform, installs
//! a pinned scanner release into the workspace, refreshes the scan templates,
//! writes an optional reporting configuration, assembles the command line and
//! streams the scanner's output into the pipeline log. The same sequence can
//! be shipped to a remote worker, which runs it with this crate and streams
//! the log and result back.
//!
//! ## Quick Start
//!
//! ```bash
//! # Scan in the current directory
//! nuclei-step run --target https://example.com --flags "-severity critical,high"
//!
//! # Scan on a build agent reached over ssh (remote.program = "ssh" in nuclei-step.toml)
//! nuclei-step run --remote --workspace /builds/job --target https://example.com
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod platform;
pub mod process;
pub mod provision;
pub mod scan;
pub mod sink;
pub mod workspace;

#[cfg(test)]
mod test_support;

pub use cli::{Cli, Output};
pub use config::StepConfig;
pub use error::ScanError;
pub use scan::{Orchestrator, ScanOptions};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
