//! Shared fixtures for unit tests

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::ScanError;
use crate::provision::Fetch;
use crate::sink::LogSink;

/// In-memory release server that counts requests
#[derive(Clone, Default)]
pub struct FakeFetcher {
    responses: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    requests: Arc<AtomicUsize>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: Vec<u8>) {
        self.responses.lock().unwrap().insert(url.to_string(), body);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Fetch for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ScanError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| {
                ScanError::provisioning(format!("Failed to download '{url}': 404 Not Found"))
            })
    }
}

/// Build a zip archive from `(name, contents)` pairs
pub fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Stand-in scanner: fails template updates, records its argv to
/// `argv.txt` in the working directory and exits with `scan_exit`.
pub fn fake_scanner(scan_exit: i32) -> Vec<u8> {
    format!(
        "#!/bin/sh\n\
         for arg in \"$@\"; do\n\
           if [ \"$arg\" = \"-update-templates\" ]; then\n\
             echo \"could not reach template server\" >&2\n\
             exit 1\n\
           fi\n\
         done\n\
         printf '%s\\n' \"$@\" > argv.txt\n\
         echo \"[INF] scan finished\"\n\
         exit {scan_exit}\n"
    )
    .into_bytes()
}

/// Collects lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl LogSink for MemorySink {
    fn write_line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

/// Wait up to two seconds for `pid` to go away. A killed process that has
/// not been reaped yet counts as gone.
#[cfg(unix)]
pub async fn wait_for_exit(pid: &str) -> bool {
    for _ in 0..20 {
        let out = std::process::Command::new("ps")
            .args(["-o", "stat=", "-p", pid])
            .output()
            .unwrap();
        let stat = String::from_utf8_lossy(&out.stdout);
        let stat = stat.trim();
        if stat.is_empty() || stat.starts_with('Z') {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }
    false
}
