use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::smart_load;
use crate::platform::HostInfo;
use crate::provision::{ScannerSettings, TemplateSettings};
use crate::scan::{DEFAULT_OUTPUT_PATTERN, ScanSettings};
use crate::workspace::RemoteChannel;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("default-config.toml");

pub const APP_NAME: &str = "nuclei-step";
pub const ENV_PREFIX: &str = "NUCLEI_STEP_";

/// Merged configuration of the step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepConfig {
    pub scanner: ScannerSettings,
    pub templates: TemplateSettings,
    pub scan: ScanConfig,
    pub http: HttpConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Output file name, `{run_id}` is replaced with the run id
    pub output_pattern: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            output_pattern: DEFAULT_OUTPUT_PATTERN.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
        }
    }
}

/// How to reach the worker of a remote workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Program that starts the worker, e.g. `ssh`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    pub args: Vec<String>,
    /// OS of the worker host, defaults to the local one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
}

/// Where configuration is read from, lowest priority first
#[derive(Debug, Clone)]
pub struct ConfigSources {
    /// Directory holding the user's `config.{toml,json,yaml,yml}`
    pub user_dir: Option<PathBuf>,
    /// Directory holding the repository's `nuclei-step.{toml,json,yaml,yml}`
    pub repo_dir: PathBuf,
    /// Explicit file; replaces the user and repository files
    pub custom: Option<PathBuf>,
    pub env_prefix: String,
}

impl ConfigSources {
    pub fn discover(custom: Option<&Path>) -> Result<Self> {
        Ok(Self {
            user_dir: dirs::config_dir().map(|dir| dir.join(APP_NAME)),
            repo_dir: std::env::current_dir().context("Failed to determine current directory")?,
            custom: custom.map(Path::to_path_buf),
            env_prefix: ENV_PREFIX.to_string(),
        })
    }

    pub fn figment(&self) -> Result<Figment> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(custom) = &self.custom {
            if !custom.is_file() {
                bail!("Configuration file not found: {}", custom.display());
            }
            tracing::debug!("Loading configuration from {}", custom.display());
            figment = figment.merge(smart_load::auto(custom));
        } else {
            let user = self.user_dir.as_ref().and_then(|dir| smart_load::find(&dir.join("config")));
            let repo = smart_load::find(&self.repo_dir.join(APP_NAME));
            for path in user.into_iter().chain(repo) {
                tracing::debug!("Loading configuration from {}", path.display());
                figment = figment.merge(smart_load::auto(path));
            }
        }

        // Environment variables always have highest priority
        Ok(figment.merge(Env::prefixed(&self.env_prefix).split("__")))
    }
}

impl StepConfig {
    pub fn load(custom_config: Option<&Path>) -> Result<Self> {
        Self::load_from(&ConfigSources::discover(custom_config)?)
    }

    pub fn load_from(sources: &ConfigSources) -> Result<Self> {
        let config: StepConfig = sources
            .figment()?
            .extract()
            .context("Failed to parse configuration")?;
        tracing::trace!("Loaded configuration: {config:?}");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scanner.version.trim().is_empty() {
            bail!("scanner.version cannot be empty");
        }
        if self.scanner.download_base_url.trim().is_empty() {
            bail!("scanner.download_base_url cannot be empty");
        }
        if !self.scan.output_pattern.contains("{run_id}") {
            bail!(
                "scan.output_pattern '{}' must contain {{run_id}}",
                self.scan.output_pattern
            );
        }
        if self.http.connect_timeout_secs == 0 {
            bail!("http.connect_timeout_secs cannot be 0");
        }
        if self.remote.program.as_deref().is_some_and(|p| p.trim().is_empty()) {
            bail!("remote.program cannot be empty");
        }
        Ok(())
    }

    pub fn scan_settings(&self) -> ScanSettings {
        ScanSettings {
            scanner: self.scanner.clone(),
            templates: self.templates.clone(),
            output_pattern: self.scan.output_pattern.clone(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.http.connect_timeout_secs)
    }

    pub fn remote_channel(&self) -> Option<RemoteChannel> {
        self.remote
            .program
            .as_ref()
            .map(|program| RemoteChannel::new(program.clone(), self.remote.args.clone()))
    }

    /// Platform strings of the worker host, each falling back to `local`
    pub fn remote_host(&self, local: &HostInfo) -> HostInfo {
        HostInfo::new(
            self.remote.os.clone().unwrap_or_else(|| local.os.clone()),
            self.remote.arch.clone().unwrap_or_else(|| local.arch.clone()),
        )
    }
}
