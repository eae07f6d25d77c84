//! Working directory handle
//!
//! A [`Workspace`] is the root under which one execution creates its
//! artifacts. When it carries a [`RemoteChannel`], the directory lives on a
//! remote worker and every file operation happens there instead.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ScanError;

/// Command that starts a worker on another host, e.g. `ssh agent-1 nuclei-step worker`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteChannel {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl RemoteChannel {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Human readable rendering for logs
    pub fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    channel: Option<RemoteChannel>,
}

impl Workspace {
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            channel: None,
        }
    }

    pub fn remote(root: impl Into<PathBuf>, channel: RemoteChannel) -> Self {
        Self {
            root: root.into(),
            channel: Some(channel),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_remote(&self) -> bool {
        self.channel.is_some()
    }

    pub fn remote_channel(&self) -> Option<&RemoteChannel> {
        self.channel.as_ref()
    }

    /// Path of `name` relative to the workspace root
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self, name: impl AsRef<Path>) -> bool {
        self.resolve(name).exists()
    }

    /// Write `contents` to `name`, creating the root if needed and truncating
    /// any existing file.
    pub fn write(&self, name: impl AsRef<Path>, contents: &[u8]) -> Result<PathBuf, ScanError> {
        let path = self.resolve(name);
        let result =
            std::fs::create_dir_all(&self.root).and_then(|_| std::fs::write(&path, contents));
        match result {
            Ok(()) => Ok(path),
            Err(source) => Err(ScanError::ConfigWrite { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_workspace_is_not_remote() {
        let ws = Workspace::local("/tmp/job");
        assert!(!ws.is_remote());
        assert!(ws.remote_channel().is_none());
        assert_eq!(ws.resolve("a.txt"), PathBuf::from("/tmp/job/a.txt"));
    }

    #[test]
    fn test_remote_workspace_exposes_channel() {
        let channel = RemoteChannel::new(
            "ssh",
            vec!["agent-1".into(), "nuclei-step".into(), "worker".into()],
        );
        let ws = Workspace::remote("/builds/job", channel.clone());
        assert!(ws.is_remote());
        assert_eq!(ws.remote_channel(), Some(&channel));
        assert_eq!(channel.describe(), "ssh agent-1 nuclei-step worker");
    }

    #[test]
    fn test_write_creates_root_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let ws = Workspace::local(temp.path().join("nested"));

        let path = ws.write("file.txt", b"first version").unwrap();
        ws.write("file.txt", b"second").unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
        assert!(ws.exists("file.txt"));
    }
}
