use anyhow::{Result, bail};
use std::str::FromStr;

use super::core::StepConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    Yaml,
}

impl FromStr for ConfigFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ConfigFormat::Json),
            "toml" => Ok(ConfigFormat::Toml),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            _ => bail!("Unsupported format: {s}. Use json, toml, or yaml"),
        }
    }
}

impl StepConfig {
    /// Render the configuration in `format`
    pub fn export(&self, format: ConfigFormat) -> Result<String> {
        let output = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
            ConfigFormat::Yaml => serde_yml::to_string(self)?,
        };
        Ok(output)
    }
}
