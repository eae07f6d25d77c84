use std::path::{Path, PathBuf};

use super::Executor;
use crate::error::ScanError;
use crate::process::{ExecutionResult, ProcessRunner};
use crate::provision::{BinaryProvisioner, Fetch, TemplateProvisioner};
use crate::scan::{ScanRequest, args, report};
use crate::sink::LogSink;
use crate::workspace::Workspace;

/// Runs the whole provision-and-scan sequence on this machine
#[derive(Debug, Clone)]
pub struct LocalExecutor<F> {
    fetcher: F,
}

impl<F: Fetch> LocalExecutor<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetch> Executor for LocalExecutor<F> {
    async fn provision_and_run(
        &self,
        request: &ScanRequest,
        sink: &dyn LogSink,
    ) -> Result<ExecutionResult, ScanError> {
        let workspace = Workspace::local(resolve_root(&request.workspace)?);

        let provisioner = BinaryProvisioner::new(request.scanner.clone(), self.fetcher.clone());
        let binary = provisioner.ensure(&workspace, request.platform).await?;
        sink.write_line(&format!("Using nuclei binary: {}", binary.path.display()));

        let templates = TemplateProvisioner::new(request.templates.clone())
            .refresh(&binary, &workspace, sink)
            .await;

        let output = workspace.resolve(request.output_file_name());
        let mut arguments =
            args::mandatory(&binary.path, &templates, &request.options.target, &output);

        let reporting_config = request.options.reporting_config.as_deref();
        if let Some(path) = report::write(&workspace, reporting_config)? {
            arguments.extend(report::arguments(&path));
        }

        let arguments = args::build(arguments, request.options.extra_flags.as_deref());

        tracing::info!("Scanning {} with: {}", request.options.target, arguments.join(" "));
        ProcessRunner::new(workspace.root()).execute(&arguments, sink).await
    }
}

/// Create the workspace and make its root absolute, so paths handed to the
/// scanner do not depend on its working directory
fn resolve_root(path: &Path) -> Result<PathBuf, ScanError> {
    std::fs::create_dir_all(path)
        .and_then(|_| path.canonicalize())
        .map_err(|e| {
            let message = format!("Failed to prepare workspace '{}'", path.display());
            ScanError::provisioning_with(message, e)
        })
}
