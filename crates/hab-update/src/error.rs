//! Error types for the update engine
//!
//! [`Error`] carries the condition raised by a component, [`ErrorKind`] is its
//! comparable classification, and [`UpdateError`] is what the [`Updater`]
//! returns: the condition plus the operation, tool and version it hit.
//!
//! [`Updater`]: crate::Updater

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using the engine's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Conditions raised by the update engine
#[derive(Error, Debug)]
pub enum Error {
    /// No release matched the tool
    #[error("no release found")]
    NoRelease,

    /// The requested version is not published for the tool
    #[error("version {version} not found")]
    VersionNotFound { version: String },

    /// The installed version already matches the target
    #[error("already at latest version {version}")]
    AlreadyLatest { version: String },

    /// The host platform has no published build
    #[error("architecture {os}-{arch} is not supported; supported: {}", .supported.join(", "))]
    UnsupportedArchitecture {
        os: String,
        arch: String,
        supported: Vec<String>,
    },

    /// The release has no checksums.txt
    #[error("checksums.txt missing from release {tag}")]
    MissingChecksumManifest { tag: String },

    /// checksums.txt has no line for the platform asset
    #[error("checksum not found for {asset}")]
    MissingChecksumEntry { asset: String },

    /// checksums.txt could not be parsed
    #[error("invalid checksum manifest: {reason}")]
    InvalidChecksumManifest { reason: String },

    /// The release has no binary for this platform
    #[error("asset {asset} not found in release {tag}")]
    AssetNotFound { asset: String, tag: String },

    /// Downloaded content does not hash to the published digest
    #[error("checksum mismatch for {}: expected {expected}, got {actual}", .file.display())]
    ChecksumMismatch {
        expected: String,
        actual: String,
        file: PathBuf,
    },

    /// Non-success HTTP status
    #[error("download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    /// HTTP 404
    #[error("not found: {url} (HTTP {status})")]
    NotFound { url: String, status: u16 },

    /// Written byte count differs from the published asset size
    #[error("download of {url} was truncated: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        url: String,
        expected: u64,
        actual: u64,
    },

    /// Request failed before a status was received
    #[error("download failed for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Request exceeded its timeout
    #[error("network timeout after {}s fetching {url}", .timeout.as_secs())]
    Timeout { url: String, timeout: Duration },

    /// GitHub API rate limit exhausted
    #[error("GitHub API rate limit exceeded{}", .reset.map(|r| format!(", resets at {}", r.to_rfc2822())).unwrap_or_default())]
    RateLimited {
        reset: Option<DateTime<Utc>>,
        remaining: u32,
    },

    /// The executable or its directory cannot be written
    #[error("permission denied: cannot {op} {} (try running with elevated privileges)", .path.display())]
    PermissionDenied { path: PathBuf, op: &'static str },

    /// A response body could not be decoded
    #[error("invalid response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    /// Tag carries no version for the tool
    #[error("could not parse version from tag {tag:?}")]
    InvalidTag { tag: String },

    /// Replacing the executable failed
    #[error("replacing {}: {source}", .path.display())]
    Install {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Comparable classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NoRelease,
    VersionNotFound,
    AlreadyLatest,
    UnsupportedArchitecture,
    MissingChecksumManifest,
    MissingChecksumEntry,
    InvalidChecksumManifest,
    AssetNotFound,
    ChecksumMismatch,
    DownloadFailed,
    NotFound,
    NetworkTimeout,
    RateLimited,
    PermissionDenied,
    InvalidResponse,
    Install,
    Io,
}

impl ErrorKind {
    /// Whether this kind is a failure to fetch something over the network
    pub fn is_download_failure(self) -> bool {
        matches!(
            self,
            ErrorKind::DownloadFailed | ErrorKind::NotFound | ErrorKind::NetworkTimeout
        )
    }
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NoRelease => ErrorKind::NoRelease,
            Error::VersionNotFound { .. } => ErrorKind::VersionNotFound,
            Error::AlreadyLatest { .. } => ErrorKind::AlreadyLatest,
            Error::UnsupportedArchitecture { .. } => ErrorKind::UnsupportedArchitecture,
            Error::MissingChecksumManifest { .. } => ErrorKind::MissingChecksumManifest,
            Error::MissingChecksumEntry { .. } => ErrorKind::MissingChecksumEntry,
            Error::InvalidChecksumManifest { .. } => ErrorKind::InvalidChecksumManifest,
            Error::AssetNotFound { .. } => ErrorKind::AssetNotFound,
            Error::ChecksumMismatch { .. } => ErrorKind::ChecksumMismatch,
            Error::DownloadFailed { .. }
            | Error::SizeMismatch { .. }
            | Error::Transport { .. } => ErrorKind::DownloadFailed,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Timeout { .. } => ErrorKind::NetworkTimeout,
            Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Error::InvalidResponse { .. } | Error::InvalidTag { .. } => ErrorKind::InvalidResponse,
            Error::Install { .. } => ErrorKind::Install,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Create a version not found error
    pub fn version_not_found(version: impl Into<String>) -> Self {
        Self::VersionNotFound {
            version: version.into(),
        }
    }

    /// Create a download failure for a non-success status
    pub fn download_failed(url: impl Into<String>, status: u16) -> Self {
        Self::DownloadFailed {
            url: url.into(),
            status,
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidResponse {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an invalid checksum manifest error for a line
    pub fn invalid_manifest_line(line: usize, reason: impl fmt::Display) -> Self {
        Self::InvalidChecksumManifest {
            reason: format!("line {}: {}", line, reason),
        }
    }

    /// Convert a reqwest error, separating timeouts from other transport failures
    pub fn from_request(url: impl Into<String>, timeout: Duration, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url, timeout }
        } else {
            Self::Transport { url, source }
        }
    }

    /// Map an IO error on `path` to a permission error when the OS refused access
    pub fn from_fs(path: impl Into<PathBuf>, op: &'static str, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::PermissionDenied { path, op }
        } else {
            Self::Install { path, source }
        }
    }
}

/// Step of an update workflow an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Check,
    Download,
    Verify,
    Replace,
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Check => "check",
            Operation::Download => "download",
            Operation::Verify => "verify",
            Operation::Replace => "replace",
            Operation::List => "list",
        };
        f.write_str(name)
    }
}

/// An engine error annotated with where in the workflow it happened
///
/// Displays as `download ha-ws-client v1.6.0: <cause>`.
#[derive(Error, Debug)]
#[error("{op} {tool}{}: {source}", .version.as_ref().map(|v| format!(" v{}", v)).unwrap_or_default())]
pub struct UpdateError {
    /// Operation that failed
    pub op: Operation,

    /// Tool name
    pub tool: String,

    /// Target version, when known
    pub version: Option<String>,

    /// Underlying condition
    #[source]
    pub source: Error,
}

impl UpdateError {
    /// Create a new update error
    pub fn new(op: Operation, tool: impl Into<String>, version: Option<&str>, source: Error) -> Self {
        Self {
            op,
            tool: tool.into(),
            version: version.filter(|v| !v.is_empty()).map(String::from),
            source,
        }
    }

    /// Classification of the underlying condition
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_error_display_with_version() {
        let err = UpdateError::new(
            Operation::Download,
            "ha-ws-client",
            Some("1.6.0"),
            Error::download_failed("https://example.com/bin", 500),
        );
        assert_eq!(
            err.to_string(),
            "download ha-ws-client v1.6.0: download failed for https://example.com/bin: HTTP 500"
        );
        assert_eq!(err.kind(), ErrorKind::DownloadFailed);
    }

    #[test]
    fn test_update_error_display_without_version() {
        let err = UpdateError::new(Operation::Check, "validate-blueprint", None, Error::NoRelease);
        assert_eq!(err.to_string(), "check validate-blueprint: no release found");

        let empty = UpdateError::new(Operation::List, "validate-blueprint", Some(""), Error::NoRelease);
        assert!(empty.version.is_none());
    }

    #[test]
    fn test_checksum_mismatch_message_names_file() {
        let err = Error::ChecksumMismatch {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
            file: PathBuf::from("/tmp/tool"),
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch for /tmp/tool: expected aa, got bb"
        );
        assert_eq!(err.kind(), ErrorKind::ChecksumMismatch);
    }

    #[test]
    fn test_rate_limit_message() {
        let reset = DateTime::from_timestamp(1_704_412_800, 0);
        let err = Error::RateLimited {
            reset,
            remaining: 0,
        };
        assert!(err.to_string().contains("resets at"));

        let no_reset = Error::RateLimited {
            reset: None,
            remaining: 0,
        };
        assert_eq!(no_reset.to_string(), "GitHub API rate limit exceeded");
    }

    #[test]
    fn test_download_failure_classification() {
        assert!(ErrorKind::DownloadFailed.is_download_failure());
        assert!(ErrorKind::NotFound.is_download_failure());
        assert!(ErrorKind::NetworkTimeout.is_download_failure());
        assert!(!ErrorKind::ChecksumMismatch.is_download_failure());
        assert!(!ErrorKind::RateLimited.is_download_failure());
    }

    #[test]
    fn test_permission_mapping() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let err = Error::from_fs("/usr/local/bin/hab", "replace", denied);
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);

        let other = std::io::Error::from(std::io::ErrorKind::NotFound);
        let err = Error::from_fs("/usr/local/bin/hab", "replace", other);
        assert_eq!(err.kind(), ErrorKind::Install);
    }
}
