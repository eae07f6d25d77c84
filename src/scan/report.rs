use std::path::PathBuf;

use crate::error::ScanError;
use crate::workspace::Workspace;

pub const REPORT_CONFIG_FILE: &str = "reporting_config.yml";

/// Write the reporting/issue tracker configuration into the workspace.
///
/// Returns `None` when there is nothing to write. Existing files are
/// overwritten; a failed write is fatal.
pub fn write(workspace: &Workspace, content: Option<&str>) -> Result<Option<PathBuf>, ScanError> {
    match content {
        Some(content) if !content.is_empty() => {
            let path = workspace.write(REPORT_CONFIG_FILE, content.as_bytes())?;
            tracing::debug!("Wrote reporting configuration to {}", path.display());
            Ok(Some(path))
        }
        _ => Ok(None),
    }
}

/// The `-report-config <path>` argument pair
pub fn arguments(path: &std::path::Path) -> [String; 2] {
    ["-report-config".to_string(), path.display().to_string()]
}
