//! Download progress reporting

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Download progress information
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    /// Total bytes to download, 0 when unknown
    pub total_bytes: u64,

    /// Bytes downloaded so far
    pub downloaded_bytes: u64,

    /// Progress percentage (0-100)
    pub percentage: f64,
}

impl DownloadProgress {
    /// Create a new progress tracker
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            downloaded_bytes: 0,
            percentage: 0.0,
        }
    }

    /// Record `len` more bytes written
    pub fn advance(&mut self, len: u64) {
        self.downloaded_bytes += len;
        self.percentage = if self.total_bytes > 0 {
            (self.downloaded_bytes as f64 / self.total_bytes as f64 * 100.0).min(100.0)
        } else {
            0.0
        };
    }

    /// Check if download is complete
    pub fn is_complete(&self) -> bool {
        self.total_bytes > 0 && self.downloaded_bytes >= self.total_bytes
    }
}

/// Receives byte-level progress while a file downloads
pub trait ProgressObserver: Send + Sync {
    /// Called once before the first chunk
    fn on_start(&self, _name: &str, _total_bytes: u64) {}

    /// Called after every chunk written
    fn on_progress(&self, progress: &DownloadProgress);

    /// Called once after the last chunk, also when the download failed
    fn on_finish(&self, _progress: &DownloadProgress) {}
}

/// Observer that ignores progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _progress: &DownloadProgress) {}
}

/// Terminal progress bar on stderr
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    /// Progress bar drawn to stderr
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// Progress bar that never draws
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(None, target);
        let style = ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for ProgressBarObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ProgressBarObserver {
    fn on_start(&self, name: &str, total_bytes: u64) {
        if total_bytes > 0 {
            self.bar.set_length(total_bytes);
        }
        self.bar.set_message(format!("Downloading {}", name));
    }

    fn on_progress(&self, progress: &DownloadProgress) {
        self.bar.set_position(progress.downloaded_bytes);
    }

    fn on_finish(&self, progress: &DownloadProgress) {
        self.bar
            .finish_with_message(format!("Downloaded {}", format_size(progress.downloaded_bytes)));
    }
}

/// Convert bytes to human-readable size
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
