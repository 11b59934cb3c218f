//! Helpers for updater and installer testing

use hab_update::{DownloadProgress, ProgressObserver, Rename};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Create a fake binary file with the given content
pub fn create_fake_binary(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}

/// Lowercase hex SHA-256 of `content`
pub fn sha256_hex(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// `checksums.txt` body for `(name, content)` pairs
pub fn checksums_manifest(entries: &[(&str, &[u8])]) -> String {
    entries
        .iter()
        .map(|(name, content)| format!("{}  {}\n", sha256_hex(content), name))
        .collect()
}

/// Files in `dir` other than `keep`
pub fn stray_files(dir: &Path, keep: &[&str]) -> Vec<PathBuf> {
    fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    let name = p.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                    !keep.contains(&name)
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Observer that records every event
#[derive(Debug, Default, Clone)]
pub struct RecordingObserver {
    pub started: Arc<Mutex<Vec<(String, u64)>>>,
    pub updates: Arc<Mutex<Vec<u64>>>,
    pub finished: Arc<Mutex<Option<u64>>>,
}

impl ProgressObserver for RecordingObserver {
    fn on_start(&self, name: &str, total_bytes: u64) {
        self.started
            .lock()
            .unwrap()
            .push((name.to_string(), total_bytes));
    }

    fn on_progress(&self, progress: &DownloadProgress) {
        self.updates.lock().unwrap().push(progress.downloaded_bytes);
    }

    fn on_finish(&self, progress: &DownloadProgress) {
        *self.finished.lock().unwrap() = Some(progress.downloaded_bytes);
    }
}

/// Rename that fails on the call with index `fail_on`
#[derive(Debug)]
pub struct FailingRename {
    calls: AtomicUsize,
    fail_on: usize,
}

impl FailingRename {
    /// Fail the first rename
    pub fn move_aside() -> Self {
        Self::on_call(0)
    }

    /// Fail the rename that moves the download into place
    pub fn final_rename() -> Self {
        Self::on_call(1)
    }

    fn on_call(fail_on: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on,
        }
    }
}

impl Rename for FailingRename {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_on {
            return Err(io::Error::other("simulated rename failure"));
        }
        fs::rename(from, to)
    }
}
