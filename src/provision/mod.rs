//! Scanner provisioning
//!
//! Places the scanner binary and its templates inside a workspace before a
//! scan. Everything provisioned stays on disk as a cache for later runs.

pub mod binary;
pub mod fetch;
pub mod templates;

pub use binary::{BinaryHandle, BinaryProvisioner, ScannerSettings};
pub use fetch::{Fetch, HttpFetcher};
pub use templates::{TemplateProvisioner, TemplateSettings};
