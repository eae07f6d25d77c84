use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::binary::BinaryHandle;
use crate::process::ProcessRunner;
use crate::sink::LogSink;
use crate::workspace::Workspace;

pub const DEFAULT_TEMPLATES_DIR: &str = "nuclei-templates";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSettings {
    /// Templates directory relative to the workspace root
    pub directory: String,
    /// Run the scanner's self-update before scanning
    pub update: bool,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            directory: DEFAULT_TEMPLATES_DIR.to_string(),
            update: true,
        }
    }
}

/// Keeps the scan templates in the workspace current
pub struct TemplateProvisioner {
    settings: TemplateSettings,
}

impl TemplateProvisioner {
    pub fn new(settings: TemplateSettings) -> Self {
        Self { settings }
    }

    /// Scanner invocation that updates templates into `directory`
    pub fn update_arguments(binary: &BinaryHandle, directory: &Path) -> Vec<String> {
        vec![
            binary.path.display().to_string(),
            "-update-directory".to_string(),
            directory.display().to_string(),
            "-update-templates".to_string(),
            "-no-color".to_string(),
        ]
    }

    /// Refresh the templates directory and return its path.
    ///
    /// A failed update only produces a warning: previously downloaded
    /// templates remain usable and the scan goes ahead with them.
    pub async fn refresh(
        &self,
        binary: &BinaryHandle,
        workspace: &Workspace,
        sink: &dyn LogSink,
    ) -> PathBuf {
        let directory = workspace.resolve(&self.settings.directory);

        if !self.settings.update {
            tracing::debug!("Template update disabled, using {}", directory.display());
            return directory;
        }

        tracing::info!("Updating templates in {}", directory.display());
        let argv = Self::update_arguments(binary, &directory);
        let result = ProcessRunner::new(workspace.root()).run(&argv, sink).await;

        if !result.success() {
            let warning = format!(
                "Warning: template update failed (exit code {}), continuing with existing templates",
                result.exit_code
            );
            tracing::warn!("{warning}");
            sink.write_line(&warning);
        } else if is_empty_dir(&directory) {
            let warning = format!(
                "Warning: templates directory {} is empty after update",
                directory.display()
            );
            tracing::warn!("{warning}");
            sink.write_line(&warning);
        }

        directory
    }
}

fn is_empty_dir(path: &Path) -> bool {
    std::fs::read_dir(path).map_or(true, |mut entries| entries.next().is_none())
}
