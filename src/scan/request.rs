use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::platform::Platform;
use crate::provision::{ScannerSettings, TemplateSettings};

pub const DEFAULT_OUTPUT_PATTERN: &str = "nucleiOutput-{run_id}.txt";

/// Caller supplied options for one scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub target: String,
    /// Whitespace separated flags appended to the scanner command line
    pub extra_flags: Option<String>,
    /// Reporting/issue tracker configuration written to `reporting_config.yml`
    pub reporting_config: Option<String>,
    /// Identifies the pipeline run, used in the output file name
    pub run_id: String,
}

impl ScanOptions {
    pub fn new(target: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            run_id: run_id.into(),
            ..Self::default()
        }
    }

    pub fn with_extra_flags(mut self, flags: impl Into<String>) -> Self {
        self.extra_flags = Some(flags.into());
        self
    }

    pub fn with_reporting_config(mut self, config: impl Into<String>) -> Self {
        self.reporting_config = Some(config.into());
        self
    }
}

/// Self-contained description of a provision-and-scan job.
///
/// This is what travels over a remote channel; the receiving side needs
/// nothing else to reproduce the execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub platform: Platform,
    /// Workspace root on the executing machine
    pub workspace: PathBuf,
    #[serde(flatten)]
    pub options: ScanOptions,
    pub scanner: ScannerSettings,
    pub templates: TemplateSettings,
    pub output_pattern: String,
}

impl ScanRequest {
    /// Output file name with the run id substituted
    pub fn output_file_name(&self) -> String {
        self.output_pattern.replace("{run_id}", &self.options.run_id)
    }
}
