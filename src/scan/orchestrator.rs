use serde::{Deserialize, Serialize};

use super::request::{DEFAULT_OUTPUT_PATTERN, ScanOptions, ScanRequest};
use crate::error::ScanError;
use crate::executor::{Executor, LocalExecutor, RemoteExecutor};
use crate::platform::{HostInfo, Platform};
use crate::process::ExecutionResult;
use crate::provision::{Fetch, ScannerSettings, TemplateSettings};
use crate::sink::LogSink;
use crate::workspace::Workspace;

/// Settings every request built by the orchestrator carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSettings {
    pub scanner: ScannerSettings,
    pub templates: TemplateSettings,
    pub output_pattern: String,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            scanner: ScannerSettings::default(),
            templates: TemplateSettings::default(),
            output_pattern: DEFAULT_OUTPUT_PATTERN.to_string(),
        }
    }
}

/// Entry point for one pipeline step execution.
///
/// Resolves the platform of the machine that will run the scan, packages the
/// job as a [`ScanRequest`] and hands it to the local or remote executor
/// depending on the workspace.
pub struct Orchestrator<F> {
    settings: ScanSettings,
    host: HostInfo,
    local: LocalExecutor<F>,
}

impl<F: Fetch> Orchestrator<F> {
    /// `host` describes the machine the workspace lives on, which for a
    /// remote workspace is the worker rather than this process.
    pub fn new(settings: ScanSettings, host: HostInfo, fetcher: F) -> Self {
        Self {
            settings,
            host,
            local: LocalExecutor::new(fetcher),
        }
    }

    pub fn settings(&self) -> &ScanSettings {
        &self.settings
    }

    pub fn platform(&self) -> Result<Platform, ScanError> {
        self.host.resolve()
    }

    pub fn request(
        &self,
        options: ScanOptions,
        workspace: &Workspace,
        platform: Platform,
    ) -> ScanRequest {
        ScanRequest {
            platform,
            workspace: workspace.root().to_path_buf(),
            options,
            scanner: self.settings.scanner.clone(),
            templates: self.settings.templates.clone(),
            output_pattern: self.settings.output_pattern.clone(),
        }
    }

    /// Provision the scanner and run it against `options.target`.
    ///
    /// Returns the scanner's exit status; a non-zero code is not an error.
    pub async fn execute(
        &self,
        options: ScanOptions,
        workspace: &Workspace,
        sink: &dyn LogSink,
    ) -> Result<ExecutionResult, ScanError> {
        if options.target.trim().is_empty() {
            return Err(ScanError::MissingTarget);
        }

        let platform = self.platform()?;
        sink.write_line(&format!("Retrieved operating system: {platform}"));

        let request = self.request(options, workspace, platform);

        match workspace.remote_channel() {
            Some(channel) => {
                RemoteExecutor::new(channel.clone())
                    .provision_and_run(&request, sink)
                    .await
            }
            None => self.local.provision_and_run(&request, sink).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeFetcher, MemorySink};
    use tempfile::TempDir;

    fn orchestrator(os: &str, arch: &str, fetcher: FakeFetcher) -> Orchestrator<FakeFetcher> {
        let mut settings = ScanSettings::default();
        settings.scanner.verify_checksum = false;
        Orchestrator::new(settings, HostInfo::new(os, arch), fetcher)
    }

    #[tokio::test]
    async fn test_empty_target_is_rejected() {
        let temp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new();
        let sink = MemorySink::new();

        let err = orchestrator("linux", "x86_64", fetcher.clone())
            .execute(ScanOptions::new("  ", "1"), &Workspace::local(temp.path()), &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::MissingTarget));
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_platform_fails_before_provisioning() {
        let temp = TempDir::new().unwrap();
        let fetcher = FakeFetcher::new();
        let sink = MemorySink::new();

        let options = ScanOptions::new("https://example.com", "1");
        let err = orchestrator("SunOS", "sparc", fetcher.clone())
            .execute(options, &Workspace::local(temp.path()), &sink)
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::UnsupportedPlatform { .. }));
        assert_eq!(fetcher.request_count(), 0);
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_request_carries_settings_and_workspace() {
        let orchestrator = orchestrator("windows", "amd64", FakeFetcher::new());
        let ws = Workspace::local("/builds/job");

        let options = ScanOptions::new("https://example.com", "5");
        let request = orchestrator.request(options, &ws, Platform::WindowsAmd64);

        assert_eq!(request.workspace, std::path::PathBuf::from("/builds/job"));
        assert_eq!(request.platform, Platform::WindowsAmd64);
        assert!(!request.scanner.verify_checksum);
        assert_eq!(request.output_file_name(), "nucleiOutput-5.txt");
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use crate::test_support::{fake_scanner, zip_with};
        use crate::workspace::RemoteChannel;

        #[tokio::test]
        async fn test_local_workspace_runs_locally() {
            let temp = TempDir::new().unwrap();
            let fetcher = FakeFetcher::new();
            let orchestrator = orchestrator("Linux", "amd64", fetcher.clone());
            fetcher.serve(
                &orchestrator.settings().scanner.archive_url(Platform::LinuxAmd64),
                zip_with(&[("nuclei", &fake_scanner(0))]),
            );
            let sink = MemorySink::new();

            let options = ScanOptions::new("https://example.com", "1");
            let result = orchestrator
                .execute(options, &Workspace::local(temp.path()), &sink)
                .await
                .unwrap();

            assert_eq!(result, ExecutionResult::completed(0));
            assert_eq!(sink.lines()[0], "Retrieved operating system: linux/amd64");
            assert!(temp.path().join("argv.txt").exists());
        }

        #[tokio::test]
        async fn test_remote_workspace_dispatches_to_channel() {
            let temp = TempDir::new().unwrap();
            let fetcher = FakeFetcher::new();
            let channel = RemoteChannel::new(
                "sh",
                vec![
                    "-c".to_string(),
                    concat!(
                        "read request; ",
                        r#"echo '{"event":"log","line":"remote says hi"}'; "#,
                        r#"echo '{"event":"result","exit_code":2,"reached_subprocess":true}'"#,
                    )
                    .to_string(),
                ],
            );
            let ws = Workspace::remote(temp.path(), channel);
            let sink = MemorySink::new();

            let result = orchestrator("darwin", "arm64", fetcher.clone())
                .execute(ScanOptions::new("https://example.com", "1"), &ws, &sink)
                .await
                .unwrap();

            assert_eq!(result, ExecutionResult::completed(2));
            assert_eq!(
                sink.lines(),
                ["Retrieved operating system: macOS/arm64", "remote says hi"]
            );
            assert_eq!(fetcher.request_count(), 0, "remote runs never download locally");
        }
    }
}
