//! Scan job description, command line assembly and orchestration

pub mod args;
pub mod orchestrator;
pub mod report;
pub mod request;

pub use orchestrator::{Orchestrator, ScanSettings};
pub use report::REPORT_CONFIG_FILE;
pub use request::{DEFAULT_OUTPUT_PATTERN, ScanOptions, ScanRequest};
