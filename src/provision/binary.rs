//! Scanner binary provisioning
//!
//! The binary is cached under a version and platform scoped directory inside
//! the workspace:
//!
//! ```text
//! <workspace>/.nuclei/<version>/<os>-<arch>/nuclei[.exe]
//! ```
//!
//! so a changed pinned version is a plain cache miss. New binaries are staged
//! in temporary files next to their final location and renamed into place,
//! which keeps an interrupted download from ever looking like a valid binary.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::fetch::Fetch;
use crate::error::ScanError;
use crate::platform::Platform;
use crate::workspace::Workspace;

pub const DEFAULT_VERSION: &str = "3.3.7";
pub const DEFAULT_DOWNLOAD_BASE_URL: &str =
    "https://github.com/projectdiscovery/nuclei/releases/download";
pub const DEFAULT_INSTALL_DIR: &str = ".nuclei";

/// Which scanner release to provision and from where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// Pinned release, without the leading `v`
    pub version: String,
    pub download_base_url: String,
    pub verify_checksum: bool,
    /// Cache directory relative to the workspace root
    pub install_dir: String,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_string(),
            verify_checksum: true,
            install_dir: DEFAULT_INSTALL_DIR.to_string(),
        }
    }
}

impl ScannerSettings {
    fn release_url(&self, file_name: &str) -> String {
        format!(
            "{}/v{}/{}",
            self.download_base_url.trim_end_matches('/'),
            self.version,
            file_name
        )
    }

    pub fn archive_url(&self, platform: Platform) -> String {
        self.release_url(&platform.archive_name(&self.version))
    }

    pub fn checksums_url(&self) -> String {
        self.release_url(&format!("nuclei_{}_checksums.txt", self.version))
    }
}

/// An executable scanner inside a workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryHandle {
    pub path: PathBuf,
    pub platform: Platform,
}

pub struct BinaryProvisioner<F> {
    settings: ScannerSettings,
    fetcher: F,
}

impl<F: Fetch> BinaryProvisioner<F> {
    pub fn new(settings: ScannerSettings, fetcher: F) -> Self {
        Self { settings, fetcher }
    }

    pub fn settings(&self) -> &ScannerSettings {
        &self.settings
    }

    /// Where the binary for `platform` lives inside `workspace`
    pub fn binary_path(&self, workspace: &Workspace, platform: Platform) -> PathBuf {
        workspace
            .resolve(&self.settings.install_dir)
            .join(&self.settings.version)
            .join(format!("{}-{}", platform.asset_os().to_ascii_lowercase(), platform.asset_arch()))
            .join(platform.binary_name())
    }

    /// Return the cached binary, downloading and installing it first if it is
    /// missing or not executable.
    pub async fn ensure(
        &self,
        workspace: &Workspace,
        platform: Platform,
    ) -> Result<BinaryHandle, ScanError> {
        let path = self.binary_path(workspace, platform);

        if is_executable(&path) {
            tracing::debug!("Using cached scanner binary at {}", path.display());
            return Ok(BinaryHandle { path, platform });
        }

        let url = self.settings.archive_url(platform);
        tracing::info!(
            "Downloading nuclei v{} for {} from {}",
            self.settings.version,
            platform,
            url
        );
        let archive = self.fetcher.fetch(&url).await?;

        let archive_name = platform.archive_name(&self.settings.version);
        if self.settings.verify_checksum {
            let checksums = self.fetcher.fetch(&self.settings.checksums_url()).await?;
            verify_checksum(&archive, &String::from_utf8_lossy(&checksums), &archive_name)?;
        }

        let destination = path.clone();
        let binary_name = platform.binary_name();
        tokio::task::spawn_blocking(move || {
            install_from_archive(&archive, binary_name, &destination)
        })
        .await
        .map_err(|e| ScanError::provisioning_with("Binary installation task failed", e))??;

        tracing::info!("Installed scanner binary at {}", path.display());
        Ok(BinaryHandle { path, platform })
    }
}

/// Compare the archive digest with its entry in a `sha256sum` style listing
fn verify_checksum(archive: &[u8], checksums: &str, archive_name: &str) -> Result<(), ScanError> {
    let expected = checksums
        .lines()
        .filter_map(|line| line.split_once(char::is_whitespace))
        .find(|(_, name)| name.trim().trim_start_matches('*') == archive_name)
        .map(|(digest, _)| digest.to_ascii_lowercase())
        .ok_or_else(|| {
            ScanError::provisioning(format!("No checksum listed for '{archive_name}'"))
        })?;

    let actual = hex::encode(Sha256::digest(archive));
    if actual != expected {
        return Err(ScanError::provisioning(format!(
            "Checksum mismatch for '{archive_name}': expected {expected}, got {actual}"
        )));
    }

    tracing::debug!("Checksum verified for {archive_name}");
    Ok(())
}

/// Extract `binary_name` from the zip `archive` and atomically place it at `destination`
fn install_from_archive(
    archive: &[u8],
    binary_name: &str,
    destination: &Path,
) -> Result<(), ScanError> {
    let dir = destination.parent().ok_or_else(|| {
        ScanError::provisioning(format!("Invalid binary path '{}'", destination.display()))
    })?;
    std::fs::create_dir_all(dir).map_err(|e| {
        ScanError::provisioning_with(format!("Failed to create '{}'", dir.display()), e)
    })?;

    let io_error = |what: &str, e: std::io::Error| {
        ScanError::provisioning_with(format!("Failed to {what} in '{}'", dir.display()), e)
    };

    // Both temporary files are removed on drop unless persisted
    let mut download = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".zip")
        .tempfile_in(dir)
        .map_err(|e| io_error("create download file", e))?;
    download
        .write_all(archive)
        .and_then(|_| download.flush())
        .and_then(|_| download.seek(SeekFrom::Start(0)).map(|_| ()))
        .map_err(|e| io_error("write archive", e))?;

    let mut zip = zip::ZipArchive::new(download.as_file()).map_err(|e| {
        ScanError::provisioning_with("Downloaded archive is not a valid zip file", e)
    })?;

    let entry_name = zip
        .file_names()
        .find(|name| Path::new(name).file_name().is_some_and(|n| n == binary_name))
        .map(str::to_string)
        .ok_or_else(|| {
            ScanError::provisioning(format!("Archive does not contain '{binary_name}'"))
        })?;

    let mut entry = zip.by_name(&entry_name).map_err(|e| {
        ScanError::provisioning_with(format!("Failed to read '{entry_name}' from archive"), e)
    })?;

    let mut staged = tempfile::Builder::new()
        .prefix(".nuclei-")
        .tempfile_in(dir)
        .map_err(|e| io_error("create staging file", e))?;
    std::io::copy(&mut entry, &mut staged).map_err(|e| io_error("extract binary", e))?;
    staged.flush().map_err(|e| io_error("extract binary", e))?;
    make_executable(staged.as_file()).map_err(|e| io_error("set permissions", e))?;

    let file = staged
        .persist(destination)
        .map_err(|e| io_error("move binary into place", e.error))?;
    drop(file);

    Ok(())
}

#[cfg(unix)]
fn make_executable(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_executable(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
