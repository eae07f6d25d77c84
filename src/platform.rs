//! Host platform resolution
//!
//! Maps raw OS and architecture identifiers onto the platforms the scanner is
//! released for. Nothing here reads ambient process state; callers capture the
//! host once with [`HostInfo::current`] and pass the strings in explicitly.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ScanError;

/// Platforms with a published scanner release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    LinuxAmd64,
    LinuxArm64,
    Linux386,
    DarwinAmd64,
    DarwinArm64,
    WindowsAmd64,
    Windows386,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Os {
    Linux,
    Darwin,
    Windows,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arch {
    Amd64,
    Arm64,
    X86,
}

/// Raw OS/arch strings of a machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub os: String,
    pub arch: String,
}

impl HostInfo {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The machine this process runs on
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    pub fn resolve(&self) -> Result<Platform, ScanError> {
        Platform::resolve(&self.os, &self.arch)
    }
}

impl Platform {
    /// Resolve a platform from raw identifiers such as `"Linux"`/`"amd64"`,
    /// `"Mac OS X"`/`"aarch64"` or `"Windows 10"`/`"x86_64"`.
    pub fn resolve(os: &str, arch: &str) -> Result<Self, ScanError> {
        let unsupported = || ScanError::UnsupportedPlatform {
            os: os.to_string(),
            arch: arch.to_string(),
        };

        let parsed_os = parse_os(os).ok_or_else(unsupported)?;
        let parsed_arch = parse_arch(arch).ok_or_else(unsupported)?;

        match (parsed_os, parsed_arch) {
            (Os::Linux, Arch::Amd64) => Ok(Platform::LinuxAmd64),
            (Os::Linux, Arch::Arm64) => Ok(Platform::LinuxArm64),
            (Os::Linux, Arch::X86) => Ok(Platform::Linux386),
            (Os::Darwin, Arch::Amd64) => Ok(Platform::DarwinAmd64),
            (Os::Darwin, Arch::Arm64) => Ok(Platform::DarwinArm64),
            (Os::Windows, Arch::Amd64) => Ok(Platform::WindowsAmd64),
            (Os::Windows, Arch::X86) => Ok(Platform::Windows386),
            // No 32-bit macOS or Windows-on-ARM releases
            _ => Err(unsupported()),
        }
    }

    /// OS segment of the release asset name
    pub fn asset_os(&self) -> &'static str {
        match self {
            Platform::LinuxAmd64 | Platform::LinuxArm64 | Platform::Linux386 => "linux",
            Platform::DarwinAmd64 | Platform::DarwinArm64 => "macOS",
            Platform::WindowsAmd64 | Platform::Windows386 => "windows",
        }
    }

    /// Architecture segment of the release asset name
    pub fn asset_arch(&self) -> &'static str {
        match self {
            Platform::LinuxAmd64 | Platform::DarwinAmd64 | Platform::WindowsAmd64 => "amd64",
            Platform::LinuxArm64 | Platform::DarwinArm64 => "arm64",
            Platform::Linux386 | Platform::Windows386 => "386",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::WindowsAmd64 | Platform::Windows386)
    }

    /// File name of the scanner executable inside the release archive
    pub fn binary_name(&self) -> &'static str {
        if self.is_windows() { "nuclei.exe" } else { "nuclei" }
    }

    /// Release archive file name for a scanner version (without leading `v`)
    pub fn archive_name(&self, version: &str) -> String {
        format!(
            "nuclei_{}_{}_{}.zip",
            version,
            self.asset_os(),
            self.asset_arch()
        )
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.asset_os(), self.asset_arch())
    }
}

fn parse_os(raw: &str) -> Option<Os> {
    let os = raw.trim().to_ascii_lowercase();
    if os.starts_with("windows") || os.starts_with("win") {
        Some(Os::Windows)
    } else if os.starts_with("linux") {
        Some(Os::Linux)
    } else if os.starts_with("mac") || os.starts_with("darwin") || os.starts_with("osx") {
        Some(Os::Darwin)
    } else {
        None
    }
}

fn parse_arch(raw: &str) -> Option<Arch> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "x86_64" | "amd64" | "x64" => Some(Arch::Amd64),
        "aarch64" | "arm64" => Some(Arch::Arm64),
        "x86" | "i386" | "i686" | "386" => Some(Arch::X86),
        _ => None,
    }
}
