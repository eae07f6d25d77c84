//! Error taxonomy for a scan execution
//!
//! Every variant is fatal for the execution it occurs in. Template refresh
//! failures and non-zero scanner exit codes are deliberately not errors: the
//! former is logged as a warning, the latter is returned in
//! [`ExecutionResult`](crate::process::ExecutionResult).

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    /// The host OS/architecture pair has no scanner release
    #[error("Unsupported platform: os '{os}', arch '{arch}'")]
    UnsupportedPlatform { os: String, arch: String },

    /// The scan target was empty
    #[error("A target URL is required")]
    MissingTarget,

    /// Download, checksum, extraction or permission failure while placing the binary
    #[error("Failed to provision scanner binary: {message}")]
    Provisioning {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The reporting/issue tracker configuration could not be written
    #[error("Error while writing the reporting/issue tracking configuration to '{}'", path.display())]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scanner process could not be started
    #[error("Failed to launch '{program}': {source}")]
    ProcessLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The remote channel failed or the worker reported a failure
    #[error("Remote execution failed: {message}")]
    Remote { message: String },
}

impl ScanError {
    pub fn provisioning(message: impl Into<String>) -> Self {
        ScanError::Provisioning {
            message: message.into(),
            source: None,
        }
    }

    pub fn provisioning_with<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ScanError::Provisioning {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Short machine-readable kind, used by the worker protocol
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::UnsupportedPlatform { .. } => "unsupported_platform",
            ScanError::MissingTarget => "missing_target",
            ScanError::Provisioning { .. } => "provisioning",
            ScanError::ConfigWrite { .. } => "config_write",
            ScanError::ProcessLaunch { .. } => "process_launch",
            ScanError::Remote { .. } => "remote",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provisioning_message_includes_reason() {
        let err = ScanError::provisioning("checksum mismatch");
        assert_eq!(
            err.to_string(),
            "Failed to provision scanner binary: checksum mismatch"
        );
        assert_eq!(err.kind(), "provisioning");
    }

    #[test]
    fn test_config_write_names_the_path() {
        let err = ScanError::ConfigWrite {
            path: PathBuf::from("/ws/reporting_config.yml"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/ws/reporting_config.yml"));
    }
}
