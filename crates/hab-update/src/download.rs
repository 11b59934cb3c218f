//! Streaming downloads into temporary files
//!
//! Binaries are streamed chunk by chunk into a [`tempfile::NamedTempFile`] created in the
//! download directory. Any failure drops the temporary file, which deletes it,
//! so a partial download never survives the call.

use futures_util::StreamExt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempPath;
use tracing::{debug, info};

use crate::checksum::Checksums;
use crate::config::UpdaterConfig;
use crate::error::{Error, Result};
use crate::http::{build_client, check_response};
use crate::progress::{format_size, DownloadProgress, ProgressObserver};

/// Prefix for temporary download files
const TEMP_PREFIX: &str = ".hab-download-";

/// A completed download, deleted on drop unless persisted
#[derive(Debug)]
pub struct DownloadedFile {
    path: TempPath,
    size: u64,
}

impl DownloadedFile {
    /// Location of the downloaded file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Take ownership of the temporary path
    pub fn into_temp_path(self) -> TempPath {
        self.path
    }
}

/// HTTP downloader for release assets
pub struct BinaryDownloader {
    /// HTTP client
    client: reqwest::Client,

    /// Where temporary files are created, system temp dir when unset
    temp_dir: Option<PathBuf>,

    /// Timeout for small metadata fetches
    check_timeout: Duration,
}

impl BinaryDownloader {
    /// Create a new downloader
    pub fn new(config: &UpdaterConfig) -> Result<Self> {
        Ok(Self::with_client(build_client(config)?, config))
    }

    /// Create a downloader sharing an existing client
    pub fn with_client(client: reqwest::Client, config: &UpdaterConfig) -> Self {
        Self {
            client,
            temp_dir: config.download_dir.clone(),
            check_timeout: config.check_timeout,
        }
    }

    /// Create temporary files in `dir`
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Directory temporary files go to
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Stream `url` into a temporary file in the configured directory
    ///
    /// When `expected_size` is non-zero the written byte count must match it.
    pub async fn download(
        &self,
        url: &str,
        expected_size: u64,
        timeout: Duration,
        observer: &dyn ProgressObserver,
    ) -> Result<DownloadedFile> {
        let dir = self.temp_dir();
        self.download_in(&dir, url, expected_size, timeout, observer).await
    }

    /// Stream `url` into a temporary file created in `dir`
    pub async fn download_in(
        &self,
        dir: &Path,
        url: &str,
        expected_size: u64,
        timeout: Duration,
        observer: &dyn ProgressObserver,
    ) -> Result<DownloadedFile> {
        let name = url.rsplit('/').next().unwrap_or(url);
        info!("Downloading {} ({})", name, format_size(expected_size));

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Error::from_request(url, timeout, e))?;
        let response = check_response(response)?;

        let total = if expected_size > 0 {
            expected_size
        } else {
            response.content_length().unwrap_or(0)
        };

        let mut file = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dir)
            .map_err(|e| Error::from_fs(dir, "write to", e))?;
        debug!("Writing download to {}", file.path().display());

        let mut progress = DownloadProgress::new(total);
        observer.on_start(name, total);

        let mut stream = response.bytes_stream();
        let streamed = async {
            while let Some(chunk) = stream.next().await {
                let chunk: bytes::Bytes = chunk.map_err(|e| Error::from_request(url, timeout, e))?;
                file.write_all(&chunk)
                    .map_err(|e| Error::from_fs(dir, "write to", e))?;
                progress.advance(chunk.len() as u64);
                observer.on_progress(&progress);
            }
            file.flush()?;
            Ok::<(), Error>(())
        }
        .await;

        observer.on_finish(&progress);
        streamed?;

        let written = progress.downloaded_bytes;
        if expected_size > 0 && written != expected_size {
            return Err(Error::SizeMismatch {
                url: url.to_string(),
                expected: expected_size,
                actual: written,
            });
        }

        debug!("Downloaded {} bytes from {}", written, url);
        Ok(DownloadedFile {
            path: file.into_temp_path(),
            size: written,
        })
    }

    /// Fetch a small text asset under `timeout`
    pub async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String> {
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Error::from_request(url, timeout, e))?;

        check_response(response)?
            .text()
            .await
            .map_err(|e| Error::from_request(url, timeout, e))
    }

    /// Download and parse a checksum manifest
    pub async fn fetch_checksums(&self, url: &str) -> Result<Checksums> {
        let text = self.fetch_text(url, self.check_timeout).await?;
        Checksums::parse(&text)
    }
}
